// ============================================================
// LOA RECONCILIATION USE CASE
// ============================================================
// Planned (LOA) vs executed revenue per category key

use std::collections::BTreeMap;

use serde::Serialize;

use super::dataset_loader::ExecutionData;
use super::indicator::Tone;
use crate::domain::budget::{execution_category_name, ExecutedRevenue, PlannedRevenue};
use crate::domain::money::{cmp_desc, percentage};

pub const TOP_EXECUTION: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationRow {
    pub key: String,
    pub name: String,
    pub planned: f64,
    pub executed: f64,
    pub execution_pct: f64,
    /// executed - planned
    pub difference: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryHighlight {
    pub name: String,
    pub execution_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverallRating {
    pub execution_pct: f64,
    pub tone: Tone,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub loa_total: f64,
    pub collected: f64,
    /// collected - LOA total
    pub difference: f64,
    pub execution_pct: f64,
    /// Named categories with planned > 0, largest planned first
    pub rows: Vec<ReconciliationRow>,
    /// Highest execution among categories above 100%
    pub best: Option<CategoryHighlight>,
    /// Lowest execution among categories below 50%
    pub attention: Option<CategoryHighlight>,
    pub overall: OverallRating,
}

impl Reconciliation {
    pub fn from_data(data: &ExecutionData) -> Self {
        Self::compute(&data.planned, &data.revenues)
    }

    pub fn compute(planned: &[PlannedRevenue], revenues: &[ExecutedRevenue]) -> Self {
        let loa_total: f64 = planned.iter().map(|r| r.planned).sum();
        let collected: f64 = revenues.iter().map(|r| r.total_collected).sum();
        let execution_pct = percentage(collected, loa_total);

        // key-ordered, so ties in best/attention resolve to the lowest key
        let joined = join_by_category(planned, revenues);

        let best = joined
            .iter()
            .filter(|r| r.execution_pct > 100.0)
            .fold(None::<&ReconciliationRow>, |acc, row| match acc {
                Some(current) if current.execution_pct >= row.execution_pct => Some(current),
                _ => Some(row),
            })
            .map(highlight);

        let attention = joined
            .iter()
            .filter(|r| r.execution_pct < 50.0)
            .fold(None::<&ReconciliationRow>, |acc, row| match acc {
                Some(current) if current.execution_pct <= row.execution_pct => Some(current),
                _ => Some(row),
            })
            .map(highlight);

        let mut rows = joined;
        rows.sort_by(|a, b| cmp_desc(a.planned, b.planned));

        Self {
            loa_total,
            collected,
            difference: collected - loa_total,
            execution_pct,
            rows,
            best,
            attention,
            overall: overall_rating(execution_pct),
        }
    }

    /// Rows with the highest execution percentage, for the ranking chart
    pub fn top_execution(&self) -> Vec<ReconciliationRow> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| cmp_desc(a.execution_pct, b.execution_pct));
        rows.truncate(TOP_EXECUTION);
        rows
    }
}

/// Outer join of planned (TOTOR) and executed (Arrec. Total) totals by
/// category key, zero-filled on the missing side. Keeps categories the
/// execution catalog names and whose planned value is positive.
pub fn join_by_category(
    planned: &[PlannedRevenue],
    revenues: &[ExecutedRevenue],
) -> Vec<ReconciliationRow> {
    let mut totals: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for row in planned {
        totals.entry(row.code.category_key()).or_default().0 += row.planned;
    }
    for row in revenues {
        totals.entry(row.code.category_key()).or_default().1 += row.total_collected;
    }

    totals
        .into_iter()
        .filter(|(_, (planned, _))| *planned > 0.0)
        .filter_map(|(key, (planned, executed))| {
            let name = execution_category_name(&key)?;
            Some(ReconciliationRow {
                name: name.to_string(),
                planned,
                executed,
                execution_pct: percentage(executed, planned),
                difference: executed - planned,
                key,
            })
        })
        .collect()
}

pub fn overall_rating(execution_pct: f64) -> OverallRating {
    let (tone, label) = if execution_pct > 90.0 {
        (Tone::Good, "Excelente")
    } else if execution_pct > 70.0 {
        (Tone::Moderate, "Boa")
    } else {
        (Tone::Poor, "Baixa")
    };

    OverallRating {
        execution_pct,
        tone,
        label: label.to_string(),
    }
}

fn highlight(row: &ReconciliationRow) -> CategoryHighlight {
    CategoryHighlight {
        name: row.name.clone(),
        execution_pct: row.execution_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::dataset_loader::fixtures::execution_data;
    use crate::domain::budget::RevenueCode;

    fn planned(code: &str, value: f64) -> PlannedRevenue {
        PlannedRevenue {
            code: RevenueCode::new(code),
            name: code.to_string(),
            planned: value,
        }
    }

    fn executed(code: &str, collected: f64) -> ExecutedRevenue {
        ExecutedRevenue {
            code: RevenueCode::new(code),
            description: code.to_string(),
            initial_forecast: 0.0,
            updated_forecast: 0.0,
            period_collected: 0.0,
            total_collected: collected,
        }
    }

    #[test]
    fn test_reconciliation_from_fixtures() {
        let reconciliation = Reconciliation::from_data(&execution_data());

        assert_eq!(reconciliation.loa_total, 7000.0);
        assert_eq!(reconciliation.collected, 4500.0);
        assert_eq!(reconciliation.difference, -2500.0);
        assert_eq!(reconciliation.rows.len(), 8);
        assert_eq!(reconciliation.rows[0].name, "Transferências União");
        assert!(reconciliation
            .rows
            .windows(2)
            .all(|w| w[0].planned >= w[1].planned));

        let iss = reconciliation.rows.iter().find(|r| r.key == "1114").unwrap();
        assert_eq!(iss.execution_pct, 150.0);
        assert_eq!(iss.difference, 150.0);

        let best = reconciliation.best.unwrap();
        assert_eq!(best.name, "Impostos s/ Serviços");
        let attention = reconciliation.attention.unwrap();
        assert_eq!(attention.name, "SUS - União");
        assert_eq!(attention.execution_pct, 0.0);
        assert_eq!(reconciliation.overall.label, "Baixa");
    }

    #[test]
    fn test_outer_join_keeps_planned_only_and_drops_unnamed() {
        let rows = join_by_category(
            &[planned("1713.00", 100.0), planned("1800.00", 500.0), planned("1112.00", 0.0)],
            &[executed("1112.50", 80.0), executed("1711.00", 900.0)],
        );

        // 1713 planned only, kept with zero execution; 1800 unnamed; 1112
        // zero-planned; 1711 executed only
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "1713");
        assert_eq!(rows[0].executed, 0.0);
        assert_eq!(rows[0].difference, -100.0);
    }

    #[test]
    fn test_no_highlights_when_all_moderate() {
        let reconciliation = Reconciliation::compute(
            &[planned("1112", 100.0), planned("1711", 100.0)],
            &[executed("1112", 80.0), executed("1711", 95.0)],
        );
        assert!(reconciliation.best.is_none());
        assert!(reconciliation.attention.is_none());
        assert_eq!(reconciliation.overall.label, "Boa");
    }

    #[test]
    fn test_overall_rating_thresholds() {
        assert_eq!(overall_rating(90.1).label, "Excelente");
        assert_eq!(overall_rating(90.0).label, "Boa");
        assert_eq!(overall_rating(70.0).label, "Baixa");
    }

    #[test]
    fn test_top_execution_order() {
        let reconciliation = Reconciliation::from_data(&execution_data());
        let top = reconciliation.top_execution();
        assert!(top.windows(2).all(|w| w[0].execution_pct >= w[1].execution_pct));
        assert!(top[0].execution_pct >= 150.0 - 1e-9);
    }
}
