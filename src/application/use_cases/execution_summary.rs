// ============================================================
// EXECUTION SUMMARY USE CASE
// ============================================================
// Headline totals shared by every execution view

use serde::Serialize;

use super::dataset_loader::ExecutionData;
use super::indicator::LabeledAmount;
use crate::domain::budget::{ExecutedExpense, ExecutedRevenue, PlannedRevenue};
use crate::domain::money::percentage;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionTotals {
    /// Sum of Prev. Atualizada
    pub forecast: f64,
    /// Sum of Arrec. Total
    pub collected: f64,
    /// collected / forecast
    pub revenue_execution_pct: f64,
    /// Sum of TOTOR
    pub loa_total: f64,
    /// collected / LOA total
    pub execution_vs_loa_pct: f64,
    pub appropriation: f64,
    pub committed: f64,
    pub liquidated: f64,
    pub paid: f64,
    /// collected - committed
    pub budget_result: f64,
}

impl ExecutionTotals {
    pub fn compute(
        revenues: &[ExecutedRevenue],
        expenses: &[ExecutedExpense],
        planned: &[PlannedRevenue],
    ) -> Self {
        let forecast: f64 = revenues.iter().map(|r| r.updated_forecast).sum();
        let collected: f64 = revenues.iter().map(|r| r.total_collected).sum();
        let loa_total: f64 = planned.iter().map(|r| r.planned).sum();
        let committed: f64 = expenses.iter().map(|e| e.committed_to_date).sum();

        Self {
            forecast,
            collected,
            revenue_execution_pct: percentage(collected, forecast),
            loa_total,
            execution_vs_loa_pct: percentage(collected, loa_total),
            appropriation: expenses.iter().map(|e| e.current_appropriation).sum(),
            committed,
            liquidated: expenses.iter().map(|e| e.liquidated_to_date).sum(),
            paid: expenses.iter().map(|e| e.paid_to_date).sum(),
            budget_result: collected - committed,
        }
    }

    pub fn from_data(data: &ExecutionData) -> Self {
        Self::compute(&data.revenues, &data.expenses, &data.planned)
    }

    pub fn is_surplus(&self) -> bool {
        self.budget_result >= 0.0
    }

    /// committed / appropriation
    pub fn committed_pct(&self) -> f64 {
        percentage(self.committed, self.appropriation)
    }

    /// liquidated / committed
    pub fn liquidated_pct(&self) -> f64 {
        percentage(self.liquidated, self.committed)
    }

    /// paid / liquidated
    pub fn paid_pct(&self) -> f64 {
        percentage(self.paid, self.liquidated)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FunnelStage {
    pub stage: String,
    pub value: f64,
    /// Share of the previous stage; the first stage is 100
    pub pct_of_previous: f64,
}

/// Dotado → Empenhado → Liquidado → Pago
pub fn expense_funnel(totals: &ExecutionTotals) -> Vec<FunnelStage> {
    let stages = [
        ("Dotado", totals.appropriation),
        ("Empenhado", totals.committed),
        ("Liquidado", totals.liquidated),
        ("Pago", totals.paid),
    ];

    let mut previous: Option<f64> = None;
    stages
        .iter()
        .map(|(stage, value)| {
            let pct = previous.map_or(100.0, |prev| percentage(*value, prev));
            previous = Some(*value);
            FunnelStage {
                stage: stage.to_string(),
                value: *value,
                pct_of_previous: pct,
            }
        })
        .collect()
}

/// Forecast vs collected and appropriation vs committed, for the
/// overview comparison chart
pub fn revenue_vs_expense(totals: &ExecutionTotals) -> Vec<LabeledAmount> {
    vec![
        LabeledAmount::new("Receita prevista", totals.forecast),
        LabeledAmount::new("Receita realizada", totals.collected),
        LabeledAmount::new("Despesa dotada", totals.appropriation),
        LabeledAmount::new("Despesa empenhada", totals.committed),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::dataset_loader::fixtures::execution_data as fixture_data;

    #[test]
    fn test_totals_from_fixtures() {
        let totals = ExecutionTotals::from_data(&fixture_data());

        assert_eq!(totals.forecast, 5500.0);
        assert_eq!(totals.collected, 4500.0);
        assert_eq!(totals.loa_total, 7000.0);
        assert_eq!(totals.appropriation, 8000.0);
        assert_eq!(totals.committed, 4000.0);
        assert_eq!(totals.liquidated, 3700.0);
        assert_eq!(totals.paid, 3000.0);
        assert_eq!(totals.budget_result, 500.0);
        assert!(totals.is_surplus());
        assert!((totals.revenue_execution_pct - 4500.0 / 5500.0 * 100.0).abs() < 1e-9);
        assert!((totals.execution_vs_loa_pct - 4500.0 / 7000.0 * 100.0).abs() < 1e-9);
        assert_eq!(totals.committed_pct(), 50.0);
    }

    #[test]
    fn test_empty_inputs_do_not_divide_by_zero() {
        let totals = ExecutionTotals::compute(&[], &[], &[]);
        assert_eq!(totals.revenue_execution_pct, 0.0);
        assert_eq!(totals.execution_vs_loa_pct, 0.0);
        assert_eq!(totals.liquidated_pct(), 0.0);
        assert_eq!(totals.paid_pct(), 0.0);
    }

    #[test]
    fn test_funnel_percent_of_previous() {
        let totals = ExecutionTotals::from_data(&fixture_data());
        let funnel = expense_funnel(&totals);

        assert_eq!(funnel.len(), 4);
        assert_eq!(funnel[0].pct_of_previous, 100.0);
        assert_eq!(funnel[1].pct_of_previous, 50.0);
        assert!((funnel[2].pct_of_previous - 92.5).abs() < 1e-9);
        assert_eq!(funnel[3].stage, "Pago");
    }
}
