// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Auto-handle rule engine.
//!
//! Trivial validation queries (connection probes, `SELECT 1 FROM DUAL` and
//! friends) are answered locally with a synthesized success instead of being
//! forwarded to the test script. The engine is a pure strategy: a list of
//! patterns compiled once, consulted per `Execute` with full-string matching.
//!
//! Patterns come from configuration, and may be overridden process-wide via
//! the `MIMIC_AUTO_HANDLE_QUERIES` environment variable (a semicolon-separated
//! pattern list; blank segments are dropped).

use regex::Regex;
use tracing::debug;

use crate::error::RuleError;

/// Environment variable that overrides the configured pattern list.
pub const ENV_AUTO_HANDLE_QUERIES: &str = "MIMIC_AUTO_HANDLE_QUERIES";

/// Built-in pattern set covering the validation queries common drivers emit.
///
/// The defaults opt into case-insensitivity inline; user-supplied patterns
/// are compiled verbatim.
pub fn default_patterns() -> Vec<String> {
    vec![
        r"(?i)SELECT \w*".to_string(),
        r"(?i)SELECT .* FROM DUAL".to_string(),
        r"(?i)SELECT .* FROM SYSIBM\.SYSDUMMY1".to_string(),
    ]
}

struct CompiledPattern {
    source: String,
    regex: Regex,
}

/// The compiled rule set.
///
/// # Examples
///
/// ```
/// use mimic_core::rules::AutoHandleRules;
///
/// let rules = AutoHandleRules::default_rules();
/// assert!(rules.matches("Select 1"));
/// assert!(rules.matches("SELECT USER from DUAL"));
/// assert!(!rules.matches("SELECT name FROM users WHERE id = 1"));
/// ```
pub struct AutoHandleRules {
    patterns: Vec<CompiledPattern>,
}

impl AutoHandleRules {
    /// Compiles a rule set from the given patterns.
    ///
    /// Each pattern is anchored to the whole SQL text: a query is
    /// auto-handled only when some pattern matches it entirely. An empty
    /// pattern list matches nothing.
    pub fn new(patterns: &[String]) -> Result<Self, RuleError> {
        let mut compiled = Vec::with_capacity(patterns.len());
        for source in patterns {
            let anchored = format!(r"\A(?:{source})\z");
            let regex = Regex::new(&anchored)
                .map_err(|e| RuleError::invalid_pattern(source.clone(), e.to_string()))?;
            compiled.push(CompiledPattern {
                source: source.clone(),
                regex,
            });
        }
        Ok(Self { patterns: compiled })
    }

    /// Compiles the built-in defaults.
    pub fn default_rules() -> Self {
        // The defaults are fixed literals, verified by test.
        Self::new(&default_patterns()).expect("built-in auto-handle patterns compile")
    }

    /// Compiles the effective rule set: the `MIMIC_AUTO_HANDLE_QUERIES`
    /// environment variable when set, otherwise `fallback`.
    pub fn from_env(fallback: &[String]) -> Result<Self, RuleError> {
        match std::env::var(ENV_AUTO_HANDLE_QUERIES) {
            Ok(raw) => {
                let patterns: Vec<String> = raw
                    .split(';')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                debug!(
                    count = patterns.len(),
                    "auto-handle patterns overridden from environment"
                );
                Self::new(&patterns)
            }
            Err(_) => Self::new(fallback),
        }
    }

    /// Returns `true` if `sql` is matched entirely by any pattern.
    pub fn matches(&self, sql: &str) -> bool {
        self.patterns.iter().any(|p| p.regex.is_match(sql))
    }

    /// Returns the configured pattern sources in match order.
    pub fn pattern_sources(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.source.as_str())
    }

    /// Returns `true` if no patterns are configured.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl std::fmt::Debug for AutoHandleRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoHandleRules")
            .field(
                "patterns",
                &self.patterns.iter().map(|p| &p.source).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_patterns_compile() {
        let rules = AutoHandleRules::default_rules();
        assert_eq!(rules.pattern_sources().count(), 3);
    }

    #[test]
    fn defaults_match_common_validation_queries() {
        let rules = AutoHandleRules::default_rules();
        assert!(rules.matches("Select 1"));
        assert!(rules.matches("SELECT 1"));
        assert!(rules.matches("SELECT USER"));
        assert!(rules.matches("SELECT USER from DUAL"));
        assert!(rules.matches("SELECT 1 from DUAL"));
        assert!(rules.matches("SELECT 1 FROM SYSIBM.SYSDUMMY1"));
    }

    #[test]
    fn defaults_reject_real_queries() {
        let rules = AutoHandleRules::default_rules();
        assert!(!rules.matches("Select 1 from"));
        assert!(!rules.matches("SELECT name FROM users"));
        assert!(!rules.matches("SELECT 1 FROM SYSIBM.SYSDUMMY1 where x = 1"));
    }

    #[test]
    fn matching_is_full_string_not_substring() {
        let rules = AutoHandleRules::new(&["SELECT 1".to_string()]).unwrap();
        assert!(rules.matches("SELECT 1"));
        assert!(!rules.matches("SELECT 10"));
        assert!(!rules.matches("xSELECT 1"));
        assert!(!rules.matches("SELECT 1 "));
    }

    #[test]
    fn user_patterns_are_case_sensitive() {
        let rules = AutoHandleRules::new(&["SELECT VERSION".to_string()]).unwrap();
        assert!(rules.matches("SELECT VERSION"));
        assert!(!rules.matches("select version"));
    }

    #[test]
    fn empty_pattern_list_matches_nothing() {
        let rules = AutoHandleRules::new(&[]).unwrap();
        assert!(rules.is_empty());
        assert!(!rules.matches("SELECT 1"));
    }

    #[test]
    fn invalid_pattern_is_rejected_with_detail() {
        let err = AutoHandleRules::new(&["SELECT (".to_string()]).unwrap_err();
        assert!(err.to_string().contains("SELECT ("));
    }
}
