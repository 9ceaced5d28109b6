use serde::{Deserialize, Serialize};

/// Traffic-light rating attached to a metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    Good,
    Moderate,
    Poor,
}

impl Tone {
    pub fn emoji(&self) -> &'static str {
        match self {
            Tone::Good => "🟢",
            Tone::Moderate => "🟡",
            Tone::Poor => "🔴",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Tone::Good => "tone-good",
            Tone::Moderate => "tone-moderate",
            Tone::Poor => "tone-poor",
        }
    }

    /// Good when `value >= threshold`, Poor otherwise
    pub fn at_least(value: f64, threshold: f64) -> Self {
        if value >= threshold {
            Tone::Good
        } else {
            Tone::Poor
        }
    }
}

/// A labelled metric with its rating and a short verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub label: String,
    pub value: f64,
    pub tone: Tone,
    pub status: String,
}

impl Indicator {
    pub fn new(label: &str, value: f64, tone: Tone, status: &str) -> Self {
        Self {
            label: label.to_string(),
            value,
            tone,
            status: status.to_string(),
        }
    }
}

/// A (label, amount) pair for breakdown charts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledAmount {
    pub label: String,
    pub value: f64,
}

impl LabeledAmount {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Truncate to `max` characters, appending "..." when cut
pub fn truncate_label(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let cut: String = value.chars().take(max).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_least() {
        assert_eq!(Tone::at_least(15.0, 15.0), Tone::Good);
        assert_eq!(Tone::at_least(14.9, 15.0), Tone::Poor);
    }

    #[test]
    fn test_truncate_label_is_char_aware() {
        assert_eq!(truncate_label("Educação", 20), "Educação");
        assert_eq!(truncate_label("Educação Básica", 8), "Educação...");
    }
}
