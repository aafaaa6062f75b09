use std::sync::OnceLock;

use regex::Regex;

fn slash_runs() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/{2,}").expect("invalid slash run regex"))
}

/// Collapse duplicate slashes and repair the `scheme://` separator.
///
/// The collapse step turns `http://host` into `http:/host`, so the separator is restored
/// afterwards. Swapping the two steps changes the output for scheme URLs.
pub fn fix_url(url: &str) -> String {
    let collapsed = slash_runs().replace_all(url, "/");
    collapsed.replace(":/", "://")
}

/// Join a base and a sub-path with a separator and normalise the result.
///
/// A base starting with `//` is protocol-relative and keeps its leading `//` after the slash
/// runs are collapsed.
pub fn join_url(base: &str, path: &str) -> String {
    let joined = fix_url(&format!("{base}/{path}"));
    if base.starts_with("//") {
        format!("/{joined}")
    } else {
        joined
    }
}
