/// Determine whether a path already points at an absolute or protocol-relative location.
///
/// Such paths are handed to the service worker verbatim instead of being prefixed with the
/// router base.
pub fn is_url(value: &str) -> bool {
    value.starts_with("http") || value.starts_with("//")
}

#[cfg(test)]
mod tests {
    use super::is_url;

    #[test]
    fn detects_absolute_urls() {
        assert!(is_url("http://x"));
        assert!(is_url("https://cdn.example.com/_nuxt/"));
    }

    #[test]
    fn detects_protocol_relative_urls() {
        assert!(is_url("//x"));
    }

    #[test]
    fn rejects_root_relative_paths() {
        assert!(!is_url("/x"));
        assert!(!is_url("_nuxt/"));
        assert!(!is_url(""));
    }
}
