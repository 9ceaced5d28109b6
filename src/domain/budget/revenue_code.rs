// ============================================================
// REVENUE CODE
// ============================================================
// Revenue classification code (CODRE / Código) and its prefix hierarchy

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of digits in a top-level category key ("1112", "1711", ...)
pub const CATEGORY_KEY_LEN: usize = 4;

/// Deepest hierarchy level a classification code can carry
pub const MAX_LEVEL: usize = 10;

/// A revenue classification code such as `1112.50.01.00`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevenueCode(String);

impl RevenueCode {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Code with every non-digit separator removed
    pub fn digits(&self) -> String {
        digits_of(&self.0)
    }

    /// First four digits, the key every category catalog is indexed by
    pub fn category_key(&self) -> String {
        self.digits().chars().take(CATEGORY_KEY_LEN).collect()
    }

    /// Whether the code falls under `prefix`. Separators are ignored on
    /// both sides so `1112.5` matches `1112.50.01` and `111250`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        let prefix_digits = digits_of(prefix);
        !prefix_digits.is_empty() && self.digits().starts_with(&prefix_digits)
    }

    pub fn has_any_prefix(&self, prefixes: &[&str]) -> bool {
        prefixes.iter().any(|p| self.has_prefix(p))
    }

    /// Raw prefix for hierarchy `level` (1-based): 4, 7, 10, ... characters
    pub fn level_prefix(&self, level: usize) -> String {
        let len = level
            .saturating_sub(1)
            .saturating_mul(3)
            .saturating_add(CATEGORY_KEY_LEN);
        self.0.chars().take(len).collect()
    }
}

impl fmt::Display for RevenueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn digits_of(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_key_ignores_separators() {
        assert_eq!(RevenueCode::new("1112.50.01.00").category_key(), "1112");
        assert_eq!(RevenueCode::new("1.1.1.2.50").category_key(), "1112");
        assert_eq!(RevenueCode::new("17").category_key(), "17");
    }

    #[test]
    fn test_has_prefix() {
        let code = RevenueCode::new("1112.53.01");
        assert!(code.has_prefix("1112"));
        assert!(code.has_prefix("1112.5"));
        assert!(code.has_prefix("1112.53"));
        assert!(!code.has_prefix("1113"));
        assert!(!code.has_prefix(""));
        assert!(code.has_any_prefix(&["1711", "1112"]));
    }

    #[test]
    fn test_level_prefix() {
        let code = RevenueCode::new("1112.50.01.00");
        assert_eq!(code.level_prefix(1), "1112");
        assert_eq!(code.level_prefix(2), "1112.50");
        assert_eq!(code.level_prefix(3), "1112.50.01");
    }

    #[test]
    fn test_level_prefix_saturates_for_huge_levels() {
        let code = RevenueCode::new("1112.50.01");
        assert_eq!(code.level_prefix(usize::MAX), "1112.50.01");
        assert_eq!(code.level_prefix(MAX_LEVEL), "1112.50.01");
    }
}
