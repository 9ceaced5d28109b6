// ============================================================
// DETAIL SEARCH USE CASE
// ============================================================
// Filterable row listings for executed revenue and expense

use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::budget::{ExecutedExpense, ExecutedRevenue};
use crate::domain::money::{percentage, ratio};

/// Compiled size ceiling for a user-supplied search pattern
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Case-insensitive description matcher. The query is tried as a regular
/// expression first and falls back to a literal match when it does not
/// compile. An empty query matches everything; a query that compiles
/// neither way matches nothing.
pub enum TextMatcher {
    Any,
    Pattern(Regex),
    Nothing,
}

impl TextMatcher {
    pub fn new(query: Option<&str>) -> Self {
        Self::with_size_limit(query, PATTERN_SIZE_LIMIT)
    }

    fn with_size_limit(query: Option<&str>, size_limit: usize) -> Self {
        let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
            return TextMatcher::Any;
        };
        let build = |pattern: &str| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .size_limit(size_limit)
                .build()
        };

        match build(query).or_else(|_| build(&regex::escape(query))) {
            Ok(pattern) => TextMatcher::Pattern(pattern),
            Err(e) => {
                warn!(error = %e, "Search text could not be compiled");
                TextMatcher::Nothing
            }
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextMatcher::Any => true,
            TextMatcher::Pattern(pattern) => pattern.is_match(text),
            TextMatcher::Nothing => false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueSearch {
    /// Minimum collected amount; applied when > 0
    pub min_collected: Option<f64>,
    pub query: Option<String>,
    /// Keep only rows with collection > 0 (default on)
    pub only_collected: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueSearchRow {
    pub code: String,
    pub description: String,
    pub forecast: f64,
    pub collected: f64,
    pub execution_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueSearchResult {
    pub rows: Vec<RevenueSearchRow>,
    pub count: usize,
    pub total_collected: f64,
    pub max_collected: f64,
    pub average_execution_pct: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseSearch {
    /// Minimum committed-to-date amount; applied when > 0
    pub min_committed: Option<f64>,
    /// Exact function name; None or "Todas" keeps every function
    pub function: Option<String>,
    pub supplier: Option<String>,
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseSearchRow {
    pub commitment: String,
    pub date: Option<NaiveDate>,
    pub supplier: String,
    pub function_name: String,
    pub committed: f64,
    pub liquidated: f64,
    pub paid: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseSearchResult {
    pub rows: Vec<ExpenseSearchRow>,
    pub count: usize,
    pub total_committed: f64,
    pub total_paid: f64,
    pub paid_pct: f64,
}

pub const ALL_FUNCTIONS: &str = "Todas";

pub fn search_revenues(revenues: &[ExecutedRevenue], search: &RevenueSearch) -> RevenueSearchResult {
    let matcher = TextMatcher::new(search.query.as_deref());
    let min = search.min_collected.unwrap_or(0.0);
    let only_collected = search.only_collected.unwrap_or(true);

    let selected: Vec<&ExecutedRevenue> = revenues
        .iter()
        .filter(|r| min <= 0.0 || r.total_collected >= min)
        .filter(|r| matcher.matches(&r.description))
        .filter(|r| !only_collected || r.total_collected > 0.0)
        .collect();

    let total_collected: f64 = selected.iter().map(|r| r.total_collected).sum();
    let total_forecast: f64 = selected.iter().map(|r| r.updated_forecast).sum();
    let max_collected = selected
        .iter()
        .map(|r| r.total_collected)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
        .unwrap_or(0.0);

    let rows: Vec<RevenueSearchRow> = selected
        .iter()
        .map(|r| RevenueSearchRow {
            code: r.code.to_string(),
            description: r.description.clone(),
            forecast: r.updated_forecast,
            collected: r.total_collected,
            execution_pct: percentage(r.total_collected, r.updated_forecast),
        })
        .collect();

    RevenueSearchResult {
        count: rows.len(),
        rows,
        total_collected,
        max_collected,
        average_execution_pct: percentage(total_collected, total_forecast),
    }
}

pub fn search_expenses(expenses: &[ExecutedExpense], search: &ExpenseSearch) -> ExpenseSearchResult {
    let matcher = TextMatcher::new(search.supplier.as_deref());
    let min = search.min_committed.unwrap_or(0.0);
    let function = search
        .function
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty() && *f != ALL_FUNCTIONS);

    let rows: Vec<ExpenseSearchRow> = expenses
        .iter()
        .filter(|e| min <= 0.0 || e.committed_to_date >= min)
        .filter(|e| function.map_or(true, |f| e.function_name == f))
        .filter(|e| matcher.matches(&e.supplier))
        .filter(|e| match search.start_date {
            Some(start) => e.date.map_or(false, |d| d >= start),
            None => true,
        })
        .map(|e| ExpenseSearchRow {
            commitment: e.commitment.clone(),
            date: e.date,
            supplier: e.supplier.clone(),
            function_name: e.function_name.clone(),
            committed: e.committed_to_date,
            liquidated: e.liquidated_to_date,
            paid: e.paid_to_date,
        })
        .collect();

    let total_committed: f64 = rows.iter().map(|r| r.committed).sum();
    let total_paid: f64 = rows.iter().map(|r| r.paid).sum();

    ExpenseSearchResult {
        count: rows.len(),
        rows,
        total_committed,
        total_paid,
        paid_pct: ratio(total_paid, total_committed) * 100.0,
    }
}

/// Sorted unique function names, for the function filter
pub fn function_options(expenses: &[ExecutedExpense]) -> Vec<String> {
    let mut names: Vec<String> = expenses
        .iter()
        .map(|e| e.function_name.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::budget::RevenueCode;

    fn revenue(code: &str, description: &str, forecast: f64, collected: f64) -> ExecutedRevenue {
        ExecutedRevenue {
            code: RevenueCode::new(code),
            description: description.to_string(),
            initial_forecast: forecast,
            updated_forecast: forecast,
            period_collected: 0.0,
            total_collected: collected,
        }
    }

    fn expense(function: &str, supplier: &str, committed: f64, paid: f64, date: &str) -> ExecutedExpense {
        ExecutedExpense {
            function_name: function.to_string(),
            supplier: supplier.to_string(),
            committed_to_date: committed,
            paid_to_date: paid,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            ..Default::default()
        }
    }

    #[test]
    fn test_text_matcher_regex_and_literal_fallback() {
        assert!(TextMatcher::new(Some("iptu")).matches("IPTU Principal"));
        assert!(TextMatcher::new(Some("ip.u")).matches("IPTU"));
        // unbalanced bracket is not a valid regex, so it is matched literally
        assert!(TextMatcher::new(Some("[iptu")).matches("taxa [IPTU"));
        assert!(!TextMatcher::new(Some("[iptu")).matches("IPTU"));
        assert!(TextMatcher::new(Some("  ")).matches("anything"));
        assert!(TextMatcher::new(None).matches("anything"));
    }

    #[test]
    fn test_uncompilable_query_matches_nothing() {
        let matcher = TextMatcher::with_size_limit(Some("receita tributária"), 16);
        assert!(!matcher.matches("receita tributária"));
        assert!(!matcher.matches(""));
        assert!(TextMatcher::with_size_limit(None, 16).matches("receita"));
    }

    #[test]
    fn test_search_revenues_filters() {
        let revenues = vec![
            revenue("1112", "IPTU", 1000.0, 800.0),
            revenue("1114", "ISSQN", 500.0, 0.0),
            revenue("1711", "FPM", 2000.0, 2100.0),
        ];

        let all = search_revenues(&revenues, &RevenueSearch::default());
        assert_eq!(all.count, 2);
        assert_eq!(all.total_collected, 2900.0);
        assert_eq!(all.max_collected, 2100.0);
        assert!((all.average_execution_pct - 2900.0 / 3000.0 * 100.0).abs() < 1e-9);

        let with_zero = search_revenues(
            &revenues,
            &RevenueSearch {
                only_collected: Some(false),
                ..Default::default()
            },
        );
        assert_eq!(with_zero.count, 3);

        let filtered = search_revenues(
            &revenues,
            &RevenueSearch {
                min_collected: Some(1000.0),
                query: Some("fpm".to_string()),
                only_collected: None,
            },
        );
        assert_eq!(filtered.count, 1);
        assert_eq!(filtered.rows[0].execution_pct, 105.0);
    }

    #[test]
    fn test_search_expenses_filters() {
        let expenses = vec![
            expense("Saúde", "FARMA LTDA", 1000.0, 500.0, "2025-01-10"),
            expense("Educação", "ESCOLA SA", 2000.0, 2000.0, "2025-03-01"),
            expense("Saúde", "CLINICA ME", 300.0, 0.0, ""),
        ];

        let health = search_expenses(
            &expenses,
            &ExpenseSearch {
                function: Some("Saúde".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(health.count, 2);
        assert_eq!(health.total_committed, 1300.0);
        assert!((health.paid_pct - 500.0 / 1300.0 * 100.0).abs() < 1e-9);

        let since_feb = search_expenses(
            &expenses,
            &ExpenseSearch {
                function: Some(ALL_FUNCTIONS.to_string()),
                start_date: NaiveDate::from_ymd_opt(2025, 2, 1),
                ..Default::default()
            },
        );
        assert_eq!(since_feb.count, 1);
        assert_eq!(since_feb.rows[0].supplier, "ESCOLA SA");

        let none = search_expenses(
            &expenses,
            &ExpenseSearch {
                supplier: Some("inexistente".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(none.count, 0);
        assert_eq!(none.paid_pct, 0.0);
    }

    #[test]
    fn test_function_options_sorted_unique() {
        let expenses = vec![
            expense("Saúde", "A", 1.0, 0.0, ""),
            expense("Educação", "B", 1.0, 0.0, ""),
            expense("Saúde", "C", 1.0, 0.0, ""),
            expense("", "D", 1.0, 0.0, ""),
        ];
        assert_eq!(function_options(&expenses), vec!["Educação", "Saúde"]);
    }
}
