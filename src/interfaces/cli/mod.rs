// ============================================================
// TERMINAL REPORTS
// ============================================================
// Plain-text summaries for the `report` and `diagnose` commands

use chrono::NaiveDate;

use crate::application::use_cases::data_diagnostics::DataDiagnostics;
use crate::application::use_cases::dataset_loader::{DatasetLoader, ExecutionData, LoaData};
use crate::application::use_cases::execution_summary::{expense_funnel, ExecutionTotals};
use crate::application::use_cases::fiscal_metrics::FiscalMetrics;
use crate::application::use_cases::loa_analysis::LoaAnalysis;
use crate::application::use_cases::loa_reconciliation::Reconciliation;
use crate::domain::budget::DashboardConfig;
use crate::domain::error::{AppError, Result};
use crate::domain::money::{format_currency, format_percent};

const RULE: &str = "============================================================";

/// Output format shared by every command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

struct Report {
    out: String,
}

impl Report {
    fn new(title: &str) -> Self {
        let mut report = Self { out: String::new() };
        report.line(RULE);
        report.line(title);
        report.line(RULE);
        report
    }

    fn line(&mut self, text: &str) {
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn section(&mut self, title: &str) {
        self.line("");
        self.line(&format!("## {}", title));
    }

    fn amount(&mut self, label: &str, value: f64) {
        self.line(&format!("  {:<32} {:>22}", label, format_currency(value)));
    }

    fn percent(&mut self, label: &str, value: f64) {
        self.line(&format!("  {:<32} {:>22}", label, format_percent(value, 1)));
    }

    fn finish(self) -> String {
        self.out
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(format!("Failed to serialize report: {}", e)))
}

/// LOA summary, categories and insights
pub fn loa_report(data: &LoaData, population: u32, format: OutputFormat) -> Result<String> {
    let analysis = LoaAnalysis::new(data, population);
    let summary = analysis.summary();
    if format == OutputFormat::Json {
        return to_json(&serde_json::json!({
            "summary": summary,
            "categories": analysis.category_breakdown(),
            "insights": analysis.insights(),
        }));
    }

    let mut report = Report::new("LOA - RECEITAS PREVISTAS");
    report.amount("Receita total prevista", summary.total);
    report.amount("Receitas tributárias", summary.tax);
    report.amount("Transferências", summary.transfers);
    report.amount("Outras receitas", summary.other);

    report.section("Categorias");
    for category in analysis.category_breakdown() {
        report.line(&format!(
            "  {} {:<40} {:>18} {:>7}",
            category.key,
            category.name,
            format_currency(category.value),
            format_percent(category.share, 1)
        ));
    }

    let insights = analysis.insights();
    report.section("Insights");
    for indicator in [&insights.dependence, &insights.autonomy] {
        report.line(&format!(
            "  {} {}: {} ({})",
            indicator.tone.emoji(),
            indicator.label,
            format_percent(indicator.value, 1),
            indicator.status
        ));
    }
    report.amount("Receita per capita", insights.per_capita);
    report.line(&format!("\nAtualizado em: {}", data.source_modified));
    Ok(report.finish())
}

/// Execution totals, reconciliation and fiscal alerts
pub fn execution_report(
    data: &ExecutionData,
    population: u32,
    today: NaiveDate,
    format: OutputFormat,
) -> Result<String> {
    let totals = ExecutionTotals::from_data(data);
    let reconciliation = Reconciliation::from_data(data);
    let metrics = FiscalMetrics::compute(data, population, today);
    if format == OutputFormat::Json {
        return to_json(&serde_json::json!({
            "totals": totals,
            "reconciliation": reconciliation,
            "metrics": metrics,
        }));
    }

    let mut report = Report::new("EXECUÇÃO ORÇAMENTÁRIA");
    report.section("Receitas");
    report.amount("Previsão atualizada", totals.forecast);
    report.amount("Arrecadado", totals.collected);
    report.percent("Execução da receita", totals.revenue_execution_pct);
    report.amount("Total LOA", totals.loa_total);
    report.percent("Execução vs LOA", totals.execution_vs_loa_pct);

    report.section("Despesas");
    for stage in expense_funnel(&totals) {
        report.line(&format!(
            "  {:<32} {:>22} {:>8}",
            stage.stage,
            format_currency(stage.value),
            format_percent(stage.pct_of_previous, 1)
        ));
    }
    report.amount("Resultado orçamentário", totals.budget_result);

    report.section("LOA x Execução");
    for row in &reconciliation.rows {
        report.line(&format!(
            "  {:<32} {:>18} {:>18} {:>8}",
            row.name,
            format_currency(row.planned),
            format_currency(row.executed),
            format_percent(row.execution_pct, 1)
        ));
    }
    report.line(&format!(
        "  Execução geral: {} ({})",
        format_percent(reconciliation.overall.execution_pct, 1),
        reconciliation.overall.label
    ));

    report.section("Alertas");
    if metrics.is_regular() {
        report.line("  Situação fiscal regular");
    }
    for alert in &metrics.alerts {
        let marker = if alert.critical { "!!" } else { "--" };
        report.line(&format!("  {} {}: {}", marker, alert.title, alert.message));
        report.line(&format!("     {}", alert.recommendation));
    }
    report.line(&format!("\nAtualizado em: {}", data.source_modified));
    Ok(report.finish())
}

/// Load the datasets and build the `report` output
pub fn run_report(
    config: &DashboardConfig,
    execution: bool,
    today: NaiveDate,
    format: OutputFormat,
) -> Result<String> {
    let loader = DatasetLoader::new(config);
    if execution {
        execution_report(&loader.load_execution()?, config.population, today, format)
    } else {
        loa_report(&loader.load_loa()?, config.population, format)
    }
}

pub fn diagnostics_report(report: &DataDiagnostics, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut out = Report::new("DIAGNÓSTICO DOS DADOS");
    out.section("Arquivos");
    out.line(&format!(
        "  Receitas executadas: {} linhas ({})",
        report.revenue_rows, report.revenue_encoding
    ));
    out.line(&format!("    Colunas: {}", report.revenue_columns.join(", ")));
    out.line(&format!("  LOA: {} linhas ({})", report.loa_rows, report.loa_encoding));
    out.line(&format!("    Colunas: {}", report.loa_columns.join(", ")));

    out.section("Totais");
    out.amount("Arrec. Total (bruto)", report.raw_collected);
    out.amount("Previsão atualizada", report.forecast);
    out.amount("Arrecadado", report.collected);
    out.amount("Total LOA", report.loa_total);

    let checks = &report.checks;
    out.section("Arrec. Total");
    out.line(&format!("  Ausentes: {}", checks.missing));
    out.line(&format!("  Vazios: {}", checks.blank));
    out.line(&format!("  Zeros: {}", checks.zero));
    out.line(&format!("  Negativos: {}", checks.negative));
    out.line(&format!("  Acima de R$ 1 milhão: {}", checks.above_one_million));
    out.line("  Primeiros valores (bruto -> processado):");
    for (raw, value) in &report.samples {
        out.line(&format!("    {:>20} -> {}", raw, format_currency(*value)));
    }

    out.section("Duplicidades");
    out.line(&format!("  Linhas duplicadas: {}", report.duplicate_rows));
    out.line(&format!("  Códigos duplicados: {}", report.duplicate_codes));

    out.section("Maiores categorias");
    for category in &report.top_categories {
        out.line(&format!(
            "  {} {:>22} {:>8}",
            category.key,
            format_currency(category.collected),
            format_percent(category.execution_pct, 1)
        ));
    }

    out.section("LOA x Execução");
    out.percent("Execução vs LOA", report.execution_vs_loa_pct);
    out.amount("Diferença", report.loa_difference);
    if report.significant_difference {
        out.line("  ATENÇÃO: diferença superior a 10% entre arrecadação e LOA");
    }

    if report.suspicious_values > 0 {
        out.section("Valores não numéricos");
        out.line(&format!("  {} valores", report.suspicious_values));
        for sample in &report.suspicious_samples {
            out.line(&format!("    {}", sample));
        }
    }
    Ok(out.finish())
}

pub fn run_diagnose(config: &DashboardConfig, format: OutputFormat) -> Result<String> {
    let report = DataDiagnostics::run(&DatasetLoader::new(config))?;
    diagnostics_report(&report, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::dataset_loader::fixtures;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 10).unwrap()
    }

    #[test]
    fn test_loa_report_text() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixtures::write_all(dir.path());
        let out = run_report(&config, false, today(), OutputFormat::Text).unwrap();

        assert!(out.contains("LOA - RECEITAS PREVISTAS"));
        assert!(out.contains("R$ 7.000,00"));
        assert!(out.contains("Receita per capita"));
    }

    #[test]
    fn test_execution_report_lists_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixtures::write_all(dir.path());
        let out = run_report(&config, true, today(), OutputFormat::Text).unwrap();

        assert!(out.contains("EXECUÇÃO ORÇAMENTÁRIA"));
        assert!(out.contains("## LOA x Execução"));
        assert!(out.contains("Execução geral: 64.3% (Baixa)"));
    }

    #[test]
    fn test_execution_report_json() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixtures::write_all(dir.path());
        let out = run_report(&config, true, today(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["totals"]["committed"], 4000.0);
        assert_eq!(value["reconciliation"]["loa_total"], 7000.0);
    }

    #[test]
    fn test_diagnose_text_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixtures::write_all(dir.path());
        let out = run_diagnose(&config, OutputFormat::Text).unwrap();
        assert!(out.contains("Receitas executadas: 6 linhas (UTF-8)"));
        assert!(out.contains("ATENÇÃO"));

        let empty = tempfile::tempdir().unwrap();
        let mut config = DashboardConfig::default();
        config.data_dir = empty.path().to_path_buf();
        assert!(run_diagnose(&config, OutputFormat::Text).is_err());
    }
}
