//! Member selection by pattern.

use regex::{Regex, RegexBuilder};

/// Pattern that selects every file.
pub const MATCH_ALL: &str = ".*";

/// Selects archive members by their staging-relative path.
///
/// The pattern is a regular expression that must match the whole relative
/// path (`/`-separated), so `com/.*` selects everything below `com/` and
/// `.*\.class` selects class files at any depth.
#[derive(Debug, Clone)]
pub struct Selector {
  pattern: String,
  regex: Regex,
}

impl Selector {
  pub fn new(pattern: &str) -> Result<Self, regex::Error> {
    let regex = RegexBuilder::new(&format!("^(?:{})$", pattern))
      .dot_matches_new_line(true)
      .build()?;
    Ok(Self {
      pattern: pattern.to_string(),
      regex,
    })
  }

  pub fn pattern(&self) -> &str {
    &self.pattern
  }

  pub fn is_match(&self, relative: &str) -> bool {
    self.regex.is_match(relative)
  }
}
