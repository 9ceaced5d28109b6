// ============================================================
// REVENUE EXECUTION USE CASE
// ============================================================
// Executed revenue per category and forecast vs collection

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::budget::{execution_category_name, ExecutedRevenue};
use crate::domain::money::{cmp_desc, percentage};

pub const TOP_CATEGORIES: usize = 10;
pub const TOP_INDIVIDUAL: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryExecution {
    pub key: String,
    pub name: String,
    pub forecast: f64,
    pub collected: f64,
    /// collected - forecast
    pub difference: f64,
    pub execution_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndividualRevenue {
    pub code: String,
    pub description: String,
    pub forecast: f64,
    pub collected: f64,
    pub execution_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueBreakdown {
    pub top_collected: Vec<CategoryExecution>,
    pub top_execution: Vec<CategoryExecution>,
    pub top_individual: Vec<IndividualRevenue>,
}

/// Categories of rows that collected anything, with their ten largest
/// collections, ten best execution rates and the twenty largest rows
pub fn executed_breakdown(revenues: &[ExecutedRevenue]) -> RevenueBreakdown {
    let collected: Vec<&ExecutedRevenue> = revenues
        .iter()
        .filter(|r| r.total_collected > 0.0)
        .collect();

    let categories: Vec<CategoryExecution> = group_by_category(collected.iter().copied())
        .into_iter()
        .map(|(key, (forecast, total))| {
            let name = execution_category_name(&key)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Outras - {}", key));
            category_row(key, name, forecast, total)
        })
        .collect();

    let mut top_collected = categories.clone();
    top_collected.sort_by(|a, b| cmp_desc(a.collected, b.collected));
    top_collected.truncate(TOP_CATEGORIES);

    let mut top_execution: Vec<CategoryExecution> = categories
        .into_iter()
        .filter(|c| c.execution_pct > 0.0)
        .collect();
    top_execution.sort_by(|a, b| cmp_desc(a.execution_pct, b.execution_pct));
    top_execution.truncate(TOP_CATEGORIES);

    let mut individual = collected;
    individual.sort_by(|a, b| cmp_desc(a.total_collected, b.total_collected));
    let top_individual = individual
        .into_iter()
        .take(TOP_INDIVIDUAL)
        .map(|r| IndividualRevenue {
            code: r.code.to_string(),
            description: r.description.clone(),
            forecast: r.updated_forecast,
            collected: r.total_collected,
            execution_pct: percentage(r.total_collected, r.updated_forecast),
        })
        .collect();

    RevenueBreakdown {
        top_collected,
        top_execution,
        top_individual,
    }
}

/// Every row grouped by category; only categories the execution catalog
/// names are kept, best execution first
pub fn forecast_vs_collected(revenues: &[ExecutedRevenue]) -> Vec<CategoryExecution> {
    let mut rows: Vec<CategoryExecution> = group_by_category(revenues.iter())
        .into_iter()
        .filter_map(|(key, (forecast, collected))| {
            let name = execution_category_name(&key)?.to_string();
            Some(category_row(key, name, forecast, collected))
        })
        .collect();

    rows.sort_by(|a, b| cmp_desc(a.execution_pct, b.execution_pct));
    rows
}

/// (updated forecast, total collected) per category key
fn group_by_category<'r>(
    rows: impl Iterator<Item = &'r ExecutedRevenue>,
) -> BTreeMap<String, (f64, f64)> {
    let mut grouped: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for row in rows {
        let entry = grouped.entry(row.code.category_key()).or_default();
        entry.0 += row.updated_forecast;
        entry.1 += row.total_collected;
    }
    grouped
}

fn category_row(key: String, name: String, forecast: f64, collected: f64) -> CategoryExecution {
    CategoryExecution {
        key,
        name,
        forecast,
        collected,
        difference: collected - forecast,
        execution_pct: percentage(collected, forecast),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::dataset_loader::fixtures::execution_data;
    use crate::domain::budget::RevenueCode;

    fn revenue(code: &str, forecast: f64, collected: f64) -> ExecutedRevenue {
        ExecutedRevenue {
            code: RevenueCode::new(code),
            description: format!("Receita {}", code),
            initial_forecast: forecast,
            updated_forecast: forecast,
            period_collected: 0.0,
            total_collected: collected,
        }
    }

    #[test]
    fn test_breakdown_skips_uncollected_rows() {
        let breakdown = executed_breakdown(&execution_data().revenues);

        assert_eq!(breakdown.top_collected.len(), 5);
        assert_eq!(breakdown.top_collected[0].name, "Transferências União");
        assert_eq!(breakdown.top_collected[0].collected, 2400.0);
        assert!(breakdown.top_collected.iter().all(|c| c.key != "1999"));
        assert_eq!(breakdown.top_individual.len(), 5);
        assert_eq!(breakdown.top_execution[0].execution_pct, 150.0);
    }

    #[test]
    fn test_breakdown_names_unknown_categories() {
        let breakdown = executed_breakdown(&[revenue("1800.01", 100.0, 50.0)]);
        assert_eq!(breakdown.top_collected[0].name, "Outras - 1800");
    }

    #[test]
    fn test_forecast_vs_collected_named_only_sorted() {
        let rows = forecast_vs_collected(&[
            revenue("1112.50", 1000.0, 900.0),
            revenue("1114.00", 300.0, 450.0),
            revenue("1800.00", 100.0, 100.0),
            revenue("1999.00", 0.0, 0.0),
        ]);

        let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["1114", "1112", "1999"]);
        assert_eq!(rows[0].difference, 150.0);
        assert_eq!(rows[2].execution_pct, 0.0);
    }
}
