//! Glob matching for manifest entries, with `{a,b}` alternation on top of the `glob` crate.

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
  case_sensitive: true,
  require_literal_separator: true,
  require_literal_leading_dot: false,
};

/// Expand brace alternations into the equivalent list of plain patterns.
///
/// `**/*.{js,css}` becomes `**/*.js` and `**/*.css`. Nested groups are expanded recursively;
/// unbalanced braces are kept literally.
pub fn expand_braces(pattern: &str) -> Vec<String> {
  let Some(open) = pattern.find('{') else {
    return vec![pattern.to_string()];
  };

  let mut depth = 0usize;
  let mut close = None;
  let mut splits = Vec::new();
  for (offset, ch) in pattern[open..].char_indices() {
    let index = open + offset;
    match ch {
      '{' => depth += 1,
      '}' => {
        depth -= 1;
        if depth == 0 {
          close = Some(index);
          break;
        }
      }
      ',' if depth == 1 => splits.push(index),
      _ => {}
    }
  }

  let Some(close) = close else {
    return vec![pattern.to_string()];
  };

  let prefix = &pattern[..open];
  let suffix = &pattern[close + 1..];
  let mut bounds = vec![open];
  bounds.extend(splits);
  bounds.push(close);

  bounds
    .windows(2)
    .flat_map(|pair| {
      let alternative = &pattern[pair[0] + 1..pair[1]];
      expand_braces(&format!("{prefix}{alternative}{suffix}"))
    })
    .collect()
}

/// Compiled include/exclude pattern set.
#[derive(Debug, Clone)]
pub struct GlobSet {
  includes: Vec<Pattern>,
  ignores: Vec<Pattern>,
}

impl GlobSet {
  /// Compile include and ignore patterns.
  pub fn new(includes: &[String], ignores: &[String]) -> Result<Self> {
    Ok(Self {
      includes: compile(includes)?,
      ignores: compile(ignores)?,
    })
  }

  /// Whether a `/`-separated path relative to the glob root is selected.
  pub fn is_match(&self, relative: &str) -> bool {
    self
      .includes
      .iter()
      .any(|pattern| pattern.matches_with(relative, MATCH_OPTIONS))
      && !self
        .ignores
        .iter()
        .any(|pattern| pattern.matches_with(relative, MATCH_OPTIONS))
  }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
  patterns
    .iter()
    .flat_map(|pattern| expand_braces(pattern))
    .map(|pattern| {
      Pattern::new(&pattern).with_context(|| format!("invalid glob pattern `{pattern}`"))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn expands_simple_alternation() {
    assert_eq!(expand_braces("**/*.{js,css}"), vec!["**/*.js", "**/*.css"]);
  }

  #[test]
  fn expands_multiple_and_nested_groups() {
    assert_eq!(expand_braces("{a,b}/{c,d{e,f}}"), vec![
      "a/c", "a/de", "a/df", "b/c", "b/de", "b/df"
    ]);
  }

  #[test]
  fn keeps_patterns_without_groups() {
    assert_eq!(expand_braces("**/*.html"), vec!["**/*.html"]);
    assert_eq!(expand_braces("broken{a,b"), vec!["broken{a,b"]);
  }

  #[test]
  fn matches_includes_minus_ignores() {
    let set = GlobSet::new(
      &["**/*.{js,css}".to_string()],
      &["node_modules/**/*".to_string(), "**/*.map".to_string()],
    )
    .unwrap();

    assert!(set.is_match("app.js"));
    assert!(set.is_match("pages/index.css"));
    assert!(!set.is_match("index.html"));
    assert!(!set.is_match("node_modules/lib/index.js"));
  }

  #[test]
  fn rejects_invalid_patterns() {
    assert!(GlobSet::new(&["[".to_string()], &[]).is_err());
  }
}
