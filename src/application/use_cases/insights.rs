// ============================================================
// EXECUTION INSIGHTS USE CASE
// ============================================================
// Status lines and headline findings shown under every
// execution view

use std::collections::HashMap;

use serde::Serialize;

use super::dataset_loader::ExecutionData;
use super::execution_summary::ExecutionTotals;
use super::indicator::{truncate_label, Indicator, LabeledAmount, Tone};
use crate::domain::budget::ExecutedExpense;
use crate::domain::money::{cmp_desc, percentage};

pub const REVENUE_LABEL_MAX: usize = 40;
pub const SUPPLIER_LABEL_MAX: usize = 25;
/// Collection further than this share from the LOA is reported as
/// above or below it
pub const LOA_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoaComparison {
    Above,
    Below,
    Near,
}

#[derive(Debug, Clone, Serialize)]
pub struct Findings {
    pub loa_comparison: LoaComparison,
    /// collected - LOA total
    pub loa_difference: f64,
    pub largest_revenue: Option<LabeledAmount>,
    pub top_function: Option<LabeledAmount>,
    pub top_supplier: Option<LabeledAmount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionInsights {
    pub loa_execution: Indicator,
    pub portal_execution: Indicator,
    pub budget_result: Indicator,
    /// paid / committed
    pub liquidity: Indicator,
    pub findings: Findings,
}

impl ExecutionInsights {
    pub fn compute(data: &ExecutionData) -> Self {
        let totals = ExecutionTotals::from_data(data);
        let liquidity = percentage(totals.paid, totals.committed);

        let loa_tone = execution_tone(totals.execution_vs_loa_pct);
        let loa_status = match loa_tone {
            Tone::Good => "Excelente execução da LOA",
            Tone::Moderate => "Boa execução da LOA",
            Tone::Poor => "Execução baixa da LOA",
        };
        let portal_tone = execution_tone(totals.revenue_execution_pct);
        let portal_status = match portal_tone {
            Tone::Good => "Excelente execução",
            Tone::Moderate => "Boa execução",
            Tone::Poor => "Execução baixa",
        };

        let (result_tone, result_status) = if totals.budget_result > 0.0 {
            (Tone::Good, "Superávit orçamentário")
        } else {
            (Tone::Poor, "Déficit orçamentário")
        };

        let (liq_tone, liq_status) = if liquidity > 80.0 {
            (Tone::Good, "Alta liquidez")
        } else if liquidity > 60.0 {
            (Tone::Moderate, "Liquidez moderada")
        } else {
            (Tone::Poor, "Baixa liquidez")
        };

        Self {
            loa_execution: Indicator::new(
                "LOA vs Execução",
                totals.execution_vs_loa_pct,
                loa_tone,
                loa_status,
            ),
            portal_execution: Indicator::new(
                "Receitas (Portal)",
                totals.revenue_execution_pct,
                portal_tone,
                portal_status,
            ),
            budget_result: Indicator::new("Resultado", totals.budget_result, result_tone, result_status),
            liquidity: Indicator::new("Liquidez", liquidity, liq_tone, liq_status),
            findings: findings(data, &totals),
        }
    }
}

fn execution_tone(pct: f64) -> Tone {
    if pct > 90.0 {
        Tone::Good
    } else if pct > 70.0 {
        Tone::Moderate
    } else {
        Tone::Poor
    }
}

pub fn compare_to_loa(collected: f64, loa_total: f64) -> LoaComparison {
    let difference = collected - loa_total;
    if difference.abs() > loa_total * LOA_TOLERANCE {
        if difference > 0.0 {
            LoaComparison::Above
        } else {
            LoaComparison::Below
        }
    } else {
        LoaComparison::Near
    }
}

fn findings(data: &ExecutionData, totals: &ExecutionTotals) -> Findings {
    let largest_revenue = data
        .revenues
        .iter()
        .max_by(|a, b| a.total_collected.total_cmp(&b.total_collected))
        .map(|r| {
            LabeledAmount::new(
                truncate_label(&r.description, REVENUE_LABEL_MAX),
                r.total_collected,
            )
        });

    let top_function = largest_group(&data.expenses, |e| e.function_name.trim());
    let top_supplier = largest_group(&data.expenses, |e| e.supplier.trim())
        .map(|s| LabeledAmount::new(truncate_label(&s.label, SUPPLIER_LABEL_MAX), s.value));

    Findings {
        loa_comparison: compare_to_loa(totals.collected, totals.loa_total),
        loa_difference: totals.collected - totals.loa_total,
        largest_revenue,
        top_function,
        top_supplier,
    }
}

/// Group with the largest committed-to-date total
fn largest_group<F>(expenses: &[ExecutedExpense], key: F) -> Option<LabeledAmount>
where
    F: for<'e> Fn(&'e ExecutedExpense) -> &'e str,
{
    let mut grouped: HashMap<&str, f64> = HashMap::new();
    for expense in expenses {
        *grouped.entry(key(expense)).or_default() += expense.committed_to_date;
    }

    let mut groups: Vec<(&str, f64)> = grouped.into_iter().collect();
    groups.sort_by(|a, b| cmp_desc(a.1, b.1).then_with(|| a.0.cmp(b.0)));
    groups
        .into_iter()
        .next()
        .map(|(label, value)| LabeledAmount::new(label, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::dataset_loader::fixtures::execution_data;

    #[test]
    fn test_insights_from_fixtures() {
        let insights = ExecutionInsights::compute(&execution_data());

        assert_eq!(insights.loa_execution.tone, Tone::Poor);
        assert_eq!(insights.loa_execution.status, "Execução baixa da LOA");
        assert_eq!(insights.portal_execution.tone, Tone::Moderate);
        assert_eq!(insights.budget_result.status, "Superávit orçamentário");
        assert_eq!(insights.liquidity.value, 75.0);
        assert_eq!(insights.liquidity.status, "Liquidez moderada");
    }

    #[test]
    fn test_findings_from_fixtures() {
        let findings = ExecutionInsights::compute(&execution_data()).findings;

        assert_eq!(findings.loa_comparison, LoaComparison::Below);
        assert_eq!(findings.loa_difference, -2500.0);
        assert_eq!(findings.largest_revenue.unwrap().label, "Cota-Parte FPM");
        let function = findings.top_function.unwrap();
        assert_eq!(function.label, "Educação");
        assert_eq!(function.value, 1500.0);
        assert_eq!(findings.top_supplier.unwrap().label, "ESCOLA SA");
    }

    #[test]
    fn test_compare_to_loa_tolerance() {
        assert_eq!(compare_to_loa(1050.0, 1000.0), LoaComparison::Near);
        assert_eq!(compare_to_loa(1200.0, 1000.0), LoaComparison::Above);
        assert_eq!(compare_to_loa(800.0, 1000.0), LoaComparison::Below);
    }

    #[test]
    fn test_empty_data_has_no_findings() {
        let data = ExecutionData {
            revenues: Vec::new(),
            expenses: Vec::new(),
            planned: Vec::new(),
            source_modified: String::new(),
        };
        let insights = ExecutionInsights::compute(&data);

        assert!(insights.findings.largest_revenue.is_none());
        assert!(insights.findings.top_supplier.is_none());
        assert_eq!(insights.budget_result.status, "Déficit orçamentário");
    }
}
