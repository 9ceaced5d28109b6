// ============================================================
// FISCAL METRICS USE CASE
// ============================================================
// Complete management indicators: basic, execution, autonomy,
// government areas, liquidity, efficiency, benchmarks, alerts

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use super::dataset_loader::ExecutionData;
use super::execution_summary::ExecutionTotals;
use super::indicator::Tone;
use super::loa_analysis::per_capita;
use crate::domain::budget::{
    ExecutedExpense, ExecutedRevenue, RevenueGroup, FUNCTION_EDUCATION, FUNCTION_HEALTH,
    FUNCTION_SOCIAL_ASSISTANCE,
};
use crate::domain::money::{cmp_desc, format_currency, percentage, ratio};

pub const HEALTH_MINIMUM: f64 = 15.0;
pub const EDUCATION_MINIMUM: f64 = 25.0;
pub const AUTONOMY_MINIMUM: f64 = 20.0;
pub const LOA_EXECUTION_ALERT: f64 = 70.0;
pub const LOA_EXECUTION_SUSTAINABLE: f64 = 80.0;
pub const COLLECTION_EFFICIENCY_GOOD: f64 = 90.0;
pub const SOCIAL_EFFECTIVENESS_GOOD: f64 = 50.0;
/// Remaining payables above this share of revenue raise an alert
pub const REMAINING_PAYABLES_LIMIT: f64 = 0.1;
pub const INVESTMENT_NATURE: &str = "4.4";
pub const OPERATING_NATURE: &str = "3.3";
pub const TOP_SUPPLIER_COUNT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct BasicMetrics {
    pub revenue: f64,
    pub expense: f64,
    pub result: f64,
    pub result_pct_of_revenue: f64,
    pub revenue_per_capita: f64,
    pub expense_per_capita: f64,
    pub population: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionMetrics {
    /// Collected vs LOA
    pub loa: f64,
    /// Collected vs updated forecast
    pub portal: f64,
    /// Committed vs appropriation
    pub budgetary: f64,
    /// Paid vs committed
    pub financial: f64,
    /// Liquidated vs committed
    pub liquidation: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutonomyMetrics {
    pub tax_revenue: f64,
    pub transfers: f64,
    pub autonomy: f64,
    pub autonomy_tone: Tone,
    pub dependence: f64,
    pub dependence_tone: Tone,
    pub other_revenue: f64,
    pub other_pct: f64,
    /// 0–100, best when autonomy is near 50 and dependence near 60
    pub balance_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaMetric {
    pub label: String,
    pub amount: f64,
    pub pct: f64,
    /// Present for areas with a constitutional minimum
    pub tone: Option<Tone>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaMetrics {
    pub health: AreaMetric,
    pub education: AreaMetric,
    pub social_assistance: AreaMetric,
    pub investments: AreaMetric,
    pub operating_costs: AreaMetric,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiquidityMetrics {
    pub general_liquidity: f64,
    pub liquidity_tone: Tone,
    pub remaining_payables: f64,
    pub remaining_pct_of_liquidated: f64,
    pub cash_availability: f64,
    pub cash_pct_of_revenue: f64,
    pub payment_turnover: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EfficiencyMetrics {
    pub collection_efficiency: f64,
    pub collection_tone: Tone,
    pub supplier_concentration: f64,
    pub supplier_count: usize,
    pub diversification: f64,
    /// Days from the earliest commitment date to today; None without dates
    pub cycle_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkMetrics {
    pub fiscal_quality_index: f64,
    pub fiscal_quality_tone: Tone,
    pub sustainability_score: f64,
    pub commitment_count: usize,
    pub commitments_per_inhabitant: f64,
    pub social_effectiveness: f64,
    pub social_tone: Tone,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub title: String,
    pub message: String,
    pub critical: bool,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FiscalMetrics {
    pub basic: BasicMetrics,
    pub execution: ExecutionMetrics,
    pub autonomy: AutonomyMetrics,
    pub areas: AreaMetrics,
    pub liquidity: LiquidityMetrics,
    pub efficiency: EfficiencyMetrics,
    pub benchmarks: BenchmarkMetrics,
    pub alerts: Vec<Alert>,
}

impl FiscalMetrics {
    pub fn compute(data: &ExecutionData, population: u32, today: NaiveDate) -> Self {
        let totals = ExecutionTotals::from_data(data);
        let revenue = totals.collected;
        let expense = totals.committed;

        let basic = BasicMetrics {
            revenue,
            expense,
            result: totals.budget_result,
            result_pct_of_revenue: percentage(totals.budget_result, revenue),
            revenue_per_capita: per_capita(revenue, population),
            expense_per_capita: per_capita(expense, population),
            population,
        };

        let execution = ExecutionMetrics {
            loa: totals.execution_vs_loa_pct,
            portal: totals.revenue_execution_pct,
            budgetary: percentage(expense, totals.appropriation),
            financial: percentage(totals.paid, expense),
            liquidation: percentage(totals.liquidated, expense),
        };

        let autonomy = autonomy_metrics(&data.revenues, revenue);
        let areas = area_metrics(&data.expenses, expense);

        let general_liquidity = ratio(revenue, expense);
        let remaining_payables = totals.liquidated - totals.paid;
        let cash_availability = revenue - totals.paid;
        let liquidity = LiquidityMetrics {
            general_liquidity,
            liquidity_tone: Tone::at_least(general_liquidity, 1.0),
            remaining_payables,
            remaining_pct_of_liquidated: percentage(remaining_payables, totals.liquidated),
            cash_availability,
            cash_pct_of_revenue: percentage(cash_availability, revenue),
            payment_turnover: percentage(totals.paid, expense),
        };

        let (supplier_concentration, supplier_count) = supplier_concentration(&data.expenses, expense);
        let efficiency = EfficiencyMetrics {
            collection_efficiency: totals.execution_vs_loa_pct,
            collection_tone: Tone::at_least(totals.execution_vs_loa_pct, COLLECTION_EFFICIENCY_GOOD),
            supplier_concentration,
            supplier_count,
            diversification: revenue_diversification(&data.revenues),
            cycle_days: cycle_days(&data.expenses, today),
        };

        let iqf = fiscal_quality_index(
            autonomy.autonomy,
            totals.execution_vs_loa_pct,
            autonomy.dependence,
            general_liquidity,
        );
        let rules_met = [
            areas.health.pct >= HEALTH_MINIMUM,
            areas.education.pct >= EDUCATION_MINIMUM,
            autonomy.autonomy >= AUTONOMY_MINIMUM,
            totals.execution_vs_loa_pct >= LOA_EXECUTION_SUSTAINABLE,
        ]
        .iter()
        .filter(|ok| **ok)
        .count();
        let sustainability = rules_met as f64 * 25.0;
        let social_spend =
            areas.health.amount + areas.education.amount + areas.social_assistance.amount;
        let social_effectiveness = percentage(social_spend, expense);

        let benchmarks = BenchmarkMetrics {
            fiscal_quality_index: iqf,
            fiscal_quality_tone: quality_tone(iqf),
            sustainability_score: sustainability,
            commitment_count: data.expenses.len(),
            commitments_per_inhabitant: per_capita(data.expenses.len() as f64, population),
            social_effectiveness,
            social_tone: Tone::at_least(social_effectiveness, SOCIAL_EFFECTIVENESS_GOOD),
        };

        let alerts = build_alerts(
            &areas,
            &autonomy,
            totals.execution_vs_loa_pct,
            general_liquidity,
            remaining_payables,
            revenue,
        );

        Self {
            basic,
            execution,
            autonomy,
            areas,
            liquidity,
            efficiency,
            benchmarks,
            alerts,
        }
    }

    pub fn is_regular(&self) -> bool {
        self.alerts.is_empty()
    }
}

fn autonomy_metrics(revenues: &[ExecutedRevenue], collected: f64) -> AutonomyMetrics {
    let sum_group = |group: RevenueGroup| -> f64 {
        revenues
            .iter()
            .filter(|r| r.group() == group)
            .map(|r| r.total_collected)
            .sum()
    };
    let tax_revenue = sum_group(RevenueGroup::Tax);
    let transfers = sum_group(RevenueGroup::Transfer);
    let autonomy = percentage(tax_revenue, collected);
    let dependence = percentage(transfers, collected);
    let other_revenue = collected - tax_revenue - transfers;

    AutonomyMetrics {
        tax_revenue,
        transfers,
        autonomy,
        autonomy_tone: if autonomy > AUTONOMY_MINIMUM { Tone::Good } else { Tone::Poor },
        dependence,
        dependence_tone: if dependence > 70.0 { Tone::Poor } else { Tone::Good },
        other_revenue,
        other_pct: percentage(other_revenue, collected),
        balance_score: balance_score(autonomy, dependence),
    }
}

fn area_metrics(expenses: &[ExecutedExpense], committed: f64) -> AreaMetrics {
    let by_function = |code: &str| -> f64 {
        expenses
            .iter()
            .filter(|e| e.is_function(code))
            .map(|e| e.committed_to_date)
            .sum()
    };
    let by_nature = |prefix: &str| -> f64 {
        expenses
            .iter()
            .filter(|e| e.has_nature_prefix(prefix))
            .map(|e| e.committed_to_date)
            .sum()
    };
    let area = |label: &str, amount: f64, minimum: Option<f64>| {
        let pct = percentage(amount, committed);
        AreaMetric {
            label: label.to_string(),
            amount,
            pct,
            tone: minimum.map(|m| Tone::at_least(pct, m)),
        }
    };

    AreaMetrics {
        health: area("Saúde", by_function(FUNCTION_HEALTH), Some(HEALTH_MINIMUM)),
        education: area("Educação", by_function(FUNCTION_EDUCATION), Some(EDUCATION_MINIMUM)),
        social_assistance: area(
            "Assistência Social",
            by_function(FUNCTION_SOCIAL_ASSISTANCE),
            None,
        ),
        investments: area("Investimentos", by_nature(INVESTMENT_NATURE), None),
        operating_costs: area("Custeio", by_nature(OPERATING_NATURE), None),
    }
}

/// `max(0, 100 - |50 - autonomy| - |dependence - 60|)`
pub fn balance_score(autonomy: f64, dependence: f64) -> f64 {
    (100.0 - (50.0 - autonomy).abs() - (dependence - 60.0).abs()).max(0.0)
}

/// Composite 0–100 index weighting autonomy, LOA execution, independence
/// from transfers and liquidity
pub fn fiscal_quality_index(autonomy: f64, loa_execution: f64, dependence: f64, liquidity: f64) -> f64 {
    let raw = autonomy * 0.3 + loa_execution * 0.3 + (100.0 - dependence) * 0.2 + liquidity * 20.0 * 0.2;
    raw.clamp(0.0, 100.0)
}

pub fn quality_tone(iqf: f64) -> Tone {
    if iqf >= 70.0 {
        Tone::Good
    } else if iqf < 50.0 {
        Tone::Poor
    } else {
        Tone::Moderate
    }
}

/// Share of committed spending held by the top five suppliers, and the
/// number of distinct suppliers
pub fn supplier_concentration(expenses: &[ExecutedExpense], committed: f64) -> (f64, usize) {
    let mut by_supplier: HashMap<&str, f64> = HashMap::new();
    for expense in expenses {
        *by_supplier.entry(expense.supplier.trim()).or_default() += expense.committed_to_date;
    }

    let mut totals: Vec<f64> = by_supplier.values().copied().collect();
    totals.sort_by(|a, b| cmp_desc(*a, *b));
    let top: f64 = totals.iter().take(TOP_SUPPLIER_COUNT).sum();

    (percentage(top, committed), by_supplier.len())
}

/// Normalized Shannon entropy of collected revenue across category keys,
/// scaled to 0–100. Categories with no positive collection are ignored;
/// fewer than two categories yield 0.
pub fn revenue_diversification(revenues: &[ExecutedRevenue]) -> f64 {
    let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
    for revenue in revenues {
        *by_category.entry(revenue.code.category_key()).or_default() += revenue.total_collected;
    }

    let values: Vec<f64> = by_category.into_values().filter(|v| *v > 0.0).collect();
    if values.len() <= 1 {
        return 0.0;
    }

    let total: f64 = values.iter().sum();
    let entropy: f64 = values
        .iter()
        .map(|v| v / total)
        .map(|p| -p * p.ln())
        .sum();

    entropy / (values.len() as f64).ln() * 100.0
}

pub fn cycle_days(expenses: &[ExecutedExpense], today: NaiveDate) -> Option<i64> {
    expenses
        .iter()
        .filter_map(|e| e.date)
        .min()
        .map(|earliest| (today - earliest).num_days())
}

fn build_alerts(
    areas: &AreaMetrics,
    autonomy: &AutonomyMetrics,
    loa_execution: f64,
    liquidity: f64,
    remaining_payables: f64,
    revenue: f64,
) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let mut push = |title: &str, message: String, critical: bool, recommendation: &str| {
        alerts.push(Alert {
            title: title.to_string(),
            message,
            critical,
            recommendation: recommendation.to_string(),
        })
    };

    if areas.health.pct < HEALTH_MINIMUM {
        push(
            "SAÚDE",
            format!("{:.1}% - Abaixo do mínimo constitucional (15%)", areas.health.pct),
            true,
            "Aumentar investimentos em saúde para cumprir limite constitucional",
        );
    }
    if areas.education.pct < EDUCATION_MINIMUM {
        push(
            "EDUCAÇÃO",
            format!("{:.1}% - Abaixo do mínimo constitucional (25%)", areas.education.pct),
            true,
            "Ampliar gastos com educação conforme determinação constitucional",
        );
    }
    if autonomy.autonomy < AUTONOMY_MINIMUM {
        push(
            "AUTONOMIA FISCAL",
            format!("{:.1}% - Muito dependente de transferências", autonomy.autonomy),
            false,
            "Fortalecer arrecadação própria (IPTU, ISS, taxas)",
        );
    }
    if loa_execution < LOA_EXECUTION_ALERT {
        push(
            "EXECUÇÃO LOA",
            format!("{:.1}% - Baixa execução do orçamento", loa_execution),
            false,
            "Revisar projeções orçamentárias e melhorar arrecadação",
        );
    }
    if liquidity < 1.0 {
        push(
            "LIQUIDEZ",
            format!("{:.2} - Insuficiente para cobrir gastos", liquidity),
            true,
            "Urgente: equilibrar receitas e despesas",
        );
    }
    if remaining_payables > revenue * REMAINING_PAYABLES_LIMIT {
        push(
            "RESTO A PAGAR",
            format!("{} - Alto valor não pago", format_currency(remaining_payables)),
            false,
            "Priorizar quitação de compromissos liquidados",
        );
    }

    alerts
}
