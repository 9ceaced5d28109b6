// ============================================================
// EXPENSE ANALYSIS USE CASE
// ============================================================
// Executed expense by function, nature, month and supplier

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use serde::Serialize;

use super::indicator::LabeledAmount;
use crate::domain::budget::ExecutedExpense;
use crate::domain::money::{cmp_desc, percentage};

pub const TOP_NATURES: usize = 8;
pub const TOP_SUPPLIERS: usize = 15;
pub const TOP_FUNCTION_SUPPLIERS: usize = 8;
pub const TOP_FUNCTIONS: usize = 10;
/// Functions committing more than this are considered principal
pub const PRINCIPAL_FUNCTION_MIN: f64 = 10_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionExecution {
    pub code: String,
    pub name: String,
    pub appropriation: f64,
    pub committed: f64,
    pub liquidated: f64,
    pub paid: f64,
    /// committed / appropriation
    pub budgetary_pct: f64,
    /// paid / committed
    pub financial_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTotals {
    pub name: String,
    pub committed: f64,
    pub liquidated: f64,
    pub paid: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyAmount {
    /// `YYYY-MM`
    pub month: String,
    pub committed: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrincipalFunctions {
    /// Largest committed first
    pub by_committed: Vec<FunctionExecution>,
    /// Best budgetary execution first, at most ten
    pub by_budgetary: Vec<FunctionExecution>,
    /// Best financial execution first, at most ten
    pub by_financial: Vec<FunctionExecution>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDrilldown {
    pub function: String,
    pub subfunctions: Vec<StageTotals>,
    pub top_suppliers: Vec<LabeledAmount>,
}

/// Totals per (function code, function name), largest committed first
pub fn by_function(expenses: &[ExecutedExpense]) -> Vec<FunctionExecution> {
    let mut grouped: BTreeMap<(String, String), [f64; 4]> = BTreeMap::new();
    for expense in expenses {
        let key = (
            expense.function_code.trim().to_string(),
            expense.function_name.trim().to_string(),
        );
        let totals = grouped.entry(key).or_insert([0.0; 4]);
        totals[0] += expense.current_appropriation;
        totals[1] += expense.committed_to_date;
        totals[2] += expense.liquidated_to_date;
        totals[3] += expense.paid_to_date;
    }

    let mut rows: Vec<FunctionExecution> = grouped
        .into_iter()
        .map(|((code, name), [appropriation, committed, liquidated, paid])| FunctionExecution {
            code,
            name,
            appropriation,
            committed,
            liquidated,
            paid,
            budgetary_pct: percentage(committed, appropriation),
            financial_pct: percentage(paid, committed),
        })
        .collect();
    rows.sort_by(|a, b| cmp_desc(a.committed, b.committed));
    rows
}

pub fn top_functions(expenses: &[ExecutedExpense]) -> Vec<FunctionExecution> {
    let mut rows = by_function(expenses);
    rows.truncate(TOP_FUNCTIONS);
    rows
}

pub fn top_natures(expenses: &[ExecutedExpense]) -> Vec<LabeledAmount> {
    top_amounts(
        expenses.iter().map(|e| (e.nature_name.trim(), e.committed_to_date)),
        TOP_NATURES,
    )
}

/// Valor Empenhado per month of the commitment date; undated rows are
/// left out
pub fn monthly_evolution(expenses: &[ExecutedExpense]) -> Vec<MonthlyAmount> {
    let mut grouped: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for expense in expenses {
        if let Some(date) = expense.date {
            *grouped.entry((date.year(), date.month())).or_default() += expense.committed;
        }
    }

    grouped
        .into_iter()
        .map(|((year, month), committed)| MonthlyAmount {
            month: format!("{:04}-{:02}", year, month),
            committed,
        })
        .collect()
}

pub fn top_suppliers(expenses: &[ExecutedExpense]) -> Vec<StageTotals> {
    let mut rows = stage_totals(expenses.iter(), |e| e.supplier.trim().to_string());
    rows.truncate(TOP_SUPPLIERS);
    rows
}

pub fn principal_functions(expenses: &[ExecutedExpense]) -> PrincipalFunctions {
    let by_committed: Vec<FunctionExecution> = by_function(expenses)
        .into_iter()
        .filter(|f| f.committed > PRINCIPAL_FUNCTION_MIN)
        .collect();

    let ranked = |key: fn(&FunctionExecution) -> f64| {
        let mut rows = by_committed.clone();
        rows.sort_by(|a, b| cmp_desc(key(a), key(b)));
        rows.truncate(TOP_FUNCTIONS);
        rows
    };

    PrincipalFunctions {
        by_budgetary: ranked(|f| f.budgetary_pct),
        by_financial: ranked(|f| f.financial_pct),
        by_committed,
    }
}

/// Subfunctions and largest suppliers of the function named `function`.
/// None when no expense belongs to it.
pub fn drilldown(expenses: &[ExecutedExpense], function: &str) -> Option<FunctionDrilldown> {
    let selected: Vec<&ExecutedExpense> = expenses
        .iter()
        .filter(|e| e.function_name.trim() == function.trim())
        .collect();
    if selected.is_empty() {
        return None;
    }

    let subfunctions = stage_totals(selected.iter().copied(), |e| {
        e.subfunction_name.trim().to_string()
    });
    let top_suppliers = top_amounts(
        selected
            .iter()
            .map(|e| (e.supplier.trim(), e.committed_to_date)),
        TOP_FUNCTION_SUPPLIERS,
    );

    Some(FunctionDrilldown {
        function: function.trim().to_string(),
        subfunctions,
        top_suppliers,
    })
}

fn stage_totals<'e, F>(rows: impl Iterator<Item = &'e ExecutedExpense>, key: F) -> Vec<StageTotals>
where
    F: Fn(&ExecutedExpense) -> String,
{
    let mut grouped: HashMap<String, [f64; 3]> = HashMap::new();
    for expense in rows {
        let totals = grouped.entry(key(expense)).or_insert([0.0; 3]);
        totals[0] += expense.committed_to_date;
        totals[1] += expense.liquidated_to_date;
        totals[2] += expense.paid_to_date;
    }

    let mut rows: Vec<StageTotals> = grouped
        .into_iter()
        .map(|(name, [committed, liquidated, paid])| StageTotals {
            name,
            committed,
            liquidated,
            paid,
        })
        .collect();
    rows.sort_by(|a, b| cmp_desc(a.committed, b.committed).then_with(|| a.name.cmp(&b.name)));
    rows
}

fn top_amounts<'s>(pairs: impl Iterator<Item = (&'s str, f64)>, n: usize) -> Vec<LabeledAmount> {
    let mut grouped: HashMap<&str, f64> = HashMap::new();
    for (label, value) in pairs {
        *grouped.entry(label).or_default() += value;
    }

    let mut rows: Vec<LabeledAmount> = grouped
        .into_iter()
        .map(|(label, value)| LabeledAmount::new(label, value))
        .collect();
    rows.sort_by(|a, b| cmp_desc(a.value, b.value).then_with(|| a.label.cmp(&b.label)));
    rows.truncate(n);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::dataset_loader::fixtures::execution_data;
    use chrono::NaiveDate;

    fn expense(function: &str, subfunction: &str, supplier: &str, committed: f64, paid: f64) -> ExecutedExpense {
        ExecutedExpense {
            function_code: "10".to_string(),
            function_name: function.to_string(),
            subfunction_name: subfunction.to_string(),
            supplier: supplier.to_string(),
            current_appropriation: committed * 2.0,
            committed_to_date: committed,
            liquidated_to_date: committed,
            paid_to_date: paid,
            ..Default::default()
        }
    }

    #[test]
    fn test_by_function_from_fixtures() {
        let functions = by_function(&execution_data().expenses);

        assert_eq!(functions.len(), 4);
        assert_eq!(functions[0].name, "Educação");
        assert_eq!(functions[0].committed, 1500.0);
        assert_eq!(functions[0].budgetary_pct, 50.0);
        assert!((functions[0].financial_pct - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_natures_and_suppliers() {
        let data = execution_data();

        let natures = top_natures(&data.expenses);
        assert_eq!(natures[0].label, "Serviços de Terceiros");
        assert_eq!(natures[0].value, 1500.0);
        assert_eq!(natures[1].label, "Material de Consumo");
        assert_eq!(natures[1].value, 1300.0);

        let suppliers = top_suppliers(&data.expenses);
        assert_eq!(suppliers.len(), 3);
        assert_eq!(suppliers[0].name, "ESCOLA SA");
        assert_eq!(suppliers[1].name, "FARMA LTDA");
        assert_eq!(suppliers[1].committed, 1300.0);
        assert_eq!(suppliers[1].paid, 1100.0);
    }

    #[test]
    fn test_monthly_evolution_groups_by_month() {
        let mut expenses = execution_data().expenses;
        expenses.push(ExecutedExpense {
            committed: 999.0,
            ..Default::default()
        });

        let months = monthly_evolution(&expenses);
        let labels: Vec<&str> = months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(labels, vec!["2025-01", "2025-02", "2025-03"]);
        assert_eq!(months[1].committed, 1800.0);
    }

    #[test]
    fn test_principal_functions_threshold() {
        let expenses = vec![
            expense("Saúde", "Atenção Básica", "A", 20_000.0, 5_000.0),
            expense("Educação", "Ensino", "B", 15_000.0, 15_000.0),
            expense("Cultura", "Difusão", "C", 10_000.0, 0.0),
        ];
        let principal = principal_functions(&expenses);

        assert_eq!(principal.by_committed.len(), 2);
        assert_eq!(principal.by_committed[0].name, "Saúde");
        assert_eq!(principal.by_financial[0].name, "Educação");
    }

    #[test]
    fn test_drilldown_subfunctions_and_suppliers() {
        let expenses = vec![
            expense("Saúde", "Atenção Básica", "FARMA", 300.0, 0.0),
            expense("Saúde", "Hospitalar", "CLINICA", 500.0, 0.0),
            expense("Saúde", "Atenção Básica", "FARMA", 400.0, 0.0),
            expense("Educação", "Ensino", "ESCOLA", 900.0, 0.0),
        ];

        let detail = drilldown(&expenses, "Saúde").unwrap();
        assert_eq!(detail.subfunctions[0].name, "Atenção Básica");
        assert_eq!(detail.subfunctions[0].committed, 700.0);
        assert_eq!(detail.top_suppliers.len(), 2);
        assert_eq!(detail.top_suppliers[0].label, "FARMA");

        assert!(drilldown(&expenses, "Cultura").is_none());
    }

    #[test]
    fn test_undated_expenses_are_ignored_by_month() {
        let expenses = vec![ExecutedExpense {
            date: NaiveDate::from_ymd_opt(2025, 12, 31),
            committed: 10.0,
            ..Default::default()
        }];
        assert_eq!(monthly_evolution(&expenses)[0].month, "2025-12");
    }
}
