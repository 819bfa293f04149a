//! Regex-based instance naming convention.
//!
//! Patterns are tried in order against a normalized directory name. A match
//! yields the `name` capture group when the pattern has one, otherwise the
//! whole match.

use std::sync::LazyLock;

use benchtree_shared::{BenchTreeError, DEFAULT_INSTANCE_PATTERN, Result, compile_patterns};
use regex::Regex;

/// Compiled once for [`PatternClassifier::default`].
static DEFAULT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_INSTANCE_PATTERN).expect("default instance regex"));

/// Recognises instance directories by name.
#[derive(Debug, Clone)]
pub struct PatternClassifier {
    patterns: Vec<Regex>,
}

impl PatternClassifier {
    /// Compile `patterns`; at least one is required.
    pub fn new(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Err(BenchTreeError::config("no instance patterns configured"));
        }
        Ok(Self {
            patterns: compile_patterns(patterns)?,
        })
    }

    /// Canonical instance name for `segment`, or `None` if no pattern matches.
    pub fn classify(&self, segment: &str) -> Option<String> {
        self.patterns.iter().find_map(|re| {
            let caps = re.captures(segment)?;
            let m = caps.name("name").or_else(|| caps.get(0))?;
            let name = m.as_str().trim();
            (!name.is_empty()).then(|| name.to_string())
        })
    }
}

impl Default for PatternClassifier {
    fn default() -> Self {
        Self {
            patterns: vec![DEFAULT_RE.clone()],
        }
    }
}
