// ============================================================
// BUDGET RECORDS
// ============================================================
// Typed rows for the four source datasets

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{RevenueCode, RevenueGroup};

/// One planned revenue line of the budget law (LOA)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedRevenue {
    pub code: RevenueCode,
    pub name: String,
    /// TOTOR
    pub planned: f64,
}

impl PlannedRevenue {
    pub fn group(&self) -> RevenueGroup {
        RevenueGroup::classify(&self.code)
    }
}

/// One node of the revenue classification tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureEntry {
    pub code: RevenueCode,
    pub name: String,
    pub level: String,
}

/// One executed revenue line from the transparency portal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedRevenue {
    pub code: RevenueCode,
    pub description: String,
    pub initial_forecast: f64,
    pub updated_forecast: f64,
    pub period_collected: f64,
    pub total_collected: f64,
}

impl ExecutedRevenue {
    pub fn group(&self) -> RevenueGroup {
        RevenueGroup::classify(&self.code)
    }
}

/// One commitment (empenho) from the transparency portal
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutedExpense {
    pub commitment: String,
    pub date: Option<NaiveDate>,
    pub function_code: String,
    pub function_name: String,
    pub subfunction_code: String,
    pub subfunction_name: String,
    pub nature_code: String,
    pub nature_name: String,
    pub supplier: String,
    pub appropriation: f64,
    pub appropriation_change: f64,
    pub current_appropriation: f64,
    pub annulled: f64,
    pub reinforcement: f64,
    pub committed: f64,
    pub liquidated: f64,
    pub paid: f64,
    pub committed_to_date: f64,
    pub liquidated_to_date: f64,
    pub paid_to_date: f64,
}

impl ExecutedExpense {
    /// Function codes are compared numerically when both sides are
    /// numeric, so `8` and `08` are the same function.
    pub fn is_function(&self, code: &str) -> bool {
        let own = self.function_code.trim();
        match (own.parse::<u32>(), code.trim().parse::<u32>()) {
            (Ok(a), Ok(b)) => a == b,
            _ => own == code.trim(),
        }
    }

    /// Whether the expense nature code starts with `prefix` (e.g. `4.4`)
    pub fn has_nature_prefix(&self, prefix: &str) -> bool {
        self.nature_code.trim().starts_with(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_code_numeric_match() {
        let expense = ExecutedExpense {
            function_code: "8".to_string(),
            ..Default::default()
        };
        assert!(expense.is_function("08"));
        assert!(!expense.is_function("10"));
    }

    #[test]
    fn test_nature_prefix() {
        let expense = ExecutedExpense {
            nature_code: "4.4.90.51".to_string(),
            ..Default::default()
        };
        assert!(expense.has_nature_prefix("4.4"));
        assert!(!expense.has_nature_prefix("3.3"));
    }
}
