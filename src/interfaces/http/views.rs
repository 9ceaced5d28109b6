// ============================================================
// DASHBOARD PAGES
// ============================================================
// HTML views over the LOA and execution datasets. A dataset
// that failed to load renders only its warning.

use actix_web::{get, web, HttpResponse, Responder};
use chrono::{Local, NaiveDate};
use maud::{html, Markup};
use serde::Deserialize;

use super::pages::{unavailable, Card, Cell, Page};
use super::DashboardState;
use crate::application::use_cases::dataset_loader::{ExecutionData, LoaData};
use crate::application::use_cases::detail_search::{
    function_options, search_expenses, search_revenues, ExpenseSearch, RevenueSearch,
    ALL_FUNCTIONS,
};
use crate::application::use_cases::execution_summary::{
    expense_funnel, revenue_vs_expense, ExecutionTotals,
};
use crate::application::use_cases::expense_analysis;
use crate::application::use_cases::fiscal_metrics::{AreaMetric, FiscalMetrics};
use crate::application::use_cases::indicator::{Indicator, LabeledAmount, Tone};
use crate::application::use_cases::insights::{ExecutionInsights, LoaComparison};
use crate::application::use_cases::loa_analysis::{
    CategoryShare, LoaAnalysis, LoaFilter, RevenueLine, NO_TAX_WARNING, NO_TRANSFER_WARNING,
};
use crate::application::use_cases::loa_reconciliation::Reconciliation;
use crate::application::use_cases::revenue_execution::{executed_breakdown, forecast_vs_collected};
use crate::domain::money::{format_currency, format_percent, parse_currency};

const LOA_TITLE: &str = "Dashboard LOA - Receitas Previstas";
const EXECUTION_TITLE: &str = "Dashboard de Execução Orçamentária";

fn html_response(page: Markup) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page.into_string())
}

fn loa_page<F>(state: &DashboardState, title: &str, build: F) -> HttpResponse
where
    F: FnOnce(&mut Page, &LoaAnalysis<'_>, &LoaData),
{
    match state.loa() {
        Ok(data) => {
            let analysis = LoaAnalysis::new(&data, state.config.population);
            let mut page = Page::new(title, &state.subtitle());
            build(&mut page, &analysis, &data);
            page.footer(&format!("Última atualização dos dados: {}", data.source_modified));
            html_response(page.render())
        }
        Err(message) => html_response(unavailable(title, &state.subtitle(), &message)),
    }
}

fn execution_page<F>(state: &DashboardState, title: &str, build: F) -> HttpResponse
where
    F: FnOnce(&mut Page, &ExecutionData),
{
    match state.execution() {
        Ok(data) => {
            let mut page = Page::new(title, &state.subtitle());
            build(&mut page, &data);
            page.footer(&format!("Última atualização dos dados: {}", data.source_modified));
            html_response(page.render())
        }
        Err(message) => html_response(unavailable(title, &state.subtitle(), &message)),
    }
}

fn indicator_card(indicator: &Indicator, value: String) -> Card {
    Card::new(&indicator.label, value)
        .detail(&indicator.status)
        .tone(indicator.tone)
}

fn revenue_rows(lines: &[RevenueLine]) -> Vec<Vec<Cell>> {
    lines
        .iter()
        .map(|l| vec![Cell::text(&l.code), Cell::text(&l.name), Cell::currency(l.value)])
        .collect()
}

fn share_rows(rows: &[CategoryShare]) -> Vec<Vec<Cell>> {
    rows.iter()
        .map(|c| {
            vec![
                Cell::text(&c.key),
                Cell::text(&c.name),
                Cell::currency(c.value),
                Cell::percent(c.share),
            ]
        })
        .collect()
}

/// Optional form input; blank means unset
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn amount_input(value: &Option<String>) -> Option<f64> {
    non_blank(value).map(parse_currency)
}

// ============================================================
// HOME
// ============================================================

#[get("/")]
async fn index(data: web::Data<DashboardState>) -> impl Responder {
    let mut page = Page::new("Painel Orçamentário Municipal", &data.subtitle());

    let status = |loaded: bool| if loaded { Tone::Good } else { Tone::Poor };
    let loa = data.loa();
    let execution = data.execution();
    page.heading("Fontes de dados").cards(&[
        Card::new("LOA", if loa.is_ok() { "Carregada" } else { "Indisponível" })
            .tone(status(loa.is_ok())),
        Card::new(
            "Execução",
            if execution.is_ok() { "Carregada" } else { "Indisponível" },
        )
        .tone(status(execution.is_ok())),
        Card::new("População estimada", data.config.population.to_string()),
    ]);

    if let Err(message) = &loa {
        page.warning(message);
    } else if let Err(message) = &execution {
        page.warning(message);
    }

    page.heading("Painéis")
        .paragraph("LOA: receitas previstas por categoria, tributos, transferências e estrutura.")
        .paragraph("Execução: receitas arrecadadas, despesas empenhadas, métricas fiscais e comparação com a LOA.")
        .info("POST /api/reload recarrega os arquivos CSV sem reiniciar o servidor.");
    html_response(page.render())
}

// ============================================================
// LOA PAGES
// ============================================================

#[get("/loa")]
async fn loa_overview(data: web::Data<DashboardState>) -> impl Responder {
    loa_page(&data, LOA_TITLE, |page, analysis, _| {
        let summary = analysis.summary();
        page.heading("Resumo").cards(&[
            Card::currency("Receita Total Prevista", summary.total)
                .detail(format!("{} registros", summary.planned_count)),
            Card::currency("Receitas Tributárias", summary.tax)
                .detail(format_percent(summary.tax_share, 1)),
            Card::currency("Transferências", summary.transfers)
                .detail(format_percent(summary.transfer_share, 1)),
            Card::currency("Outras Receitas", summary.other)
                .detail(format_percent(summary.other_share, 1)),
        ]);

        let top: Vec<LabeledAmount> = analysis
            .top_revenues()
            .into_iter()
            .map(|r| LabeledAmount::new(r.name, r.value))
            .collect();
        page.heading("Top 10 Receitas Previstas").bars(&top);

        page.heading("Receitas por Categoria").table(
            &["Categoria", "Nome", "Valor", "Participação"],
            share_rows(&analysis.category_breakdown()),
        );

        page.heading("Receitas por Nível de Classificação")
            .bars(&analysis.level_breakdown(1))
            .bars(&analysis.level_breakdown(2));

        let insights = analysis.insights();
        page.heading("Insights").cards(&[
            indicator_card(&insights.dependence, format_percent(insights.dependence.value, 1)),
            indicator_card(&insights.autonomy, format_percent(insights.autonomy.value, 1)),
            Card::currency("Receita per capita", insights.per_capita),
        ]);
        page.table(
            &["Composição", "Ideal", "Real"],
            insights
                .composition
                .iter()
                .map(|c| vec![Cell::text(&c.label), Cell::percent(c.ideal), Cell::percent(c.real)])
                .collect(),
        );
        if !insights.complementary.is_empty() {
            page.heading("Áreas Complementares").bars(&insights.complementary);
        }
    })
}

#[get("/loa/tax")]
async fn loa_tax(data: web::Data<DashboardState>) -> impl Responder {
    loa_page(&data, "Receitas Tributárias", |page, analysis, _| {
        match analysis.tax_analysis() {
            Some(tax) => {
                page.heading("Por Tipo de Tributo").bars(&tax.by_kind);
                if !tax.iptu_detail.is_empty() {
                    page.heading("Detalhamento IPTU")
                        .table(&["Código", "Nome", "Valor"], revenue_rows(&tax.iptu_detail));
                }
                page.heading("Receitas Tributárias")
                    .table(&["Código", "Nome", "Valor"], revenue_rows(&tax.rows));
            }
            None => {
                page.warning(NO_TAX_WARNING);
            }
        }
    })
}

#[get("/loa/transfers")]
async fn loa_transfers(data: web::Data<DashboardState>) -> impl Responder {
    loa_page(&data, "Transferências", |page, analysis, _| {
        match analysis.transfer_analysis() {
            Some(transfers) => {
                page.heading("Por Origem").bars(&transfers.by_origin);
                page.heading("Principais Transferências")
                    .table(&["Código", "Nome", "Valor"], revenue_rows(&transfers.top));
            }
            None => {
                page.warning(NO_TRANSFER_WARNING);
            }
        }
    })
}

#[derive(Debug, Default, Deserialize)]
struct LoaFilterForm {
    min_value: Option<String>,
    query: Option<String>,
}

#[get("/loa/detail")]
async fn loa_detail(
    data: web::Data<DashboardState>,
    form: web::Query<LoaFilterForm>,
) -> impl Responder {
    let filter = LoaFilter {
        min_value: amount_input(&form.min_value),
        query: non_blank(&form.query).map(str::to_string),
    };

    loa_page(&data, "Detalhamento da LOA", |page, analysis, _| {
        page.markup(html! {
            form method="get" {
                label { "Valor mínimo " input name="min_value" value=(non_blank(&form.min_value).unwrap_or("")); }
                label { "Buscar descrição " input name="query" value=(non_blank(&form.query).unwrap_or("")); }
                button type="submit" { "Filtrar" }
            }
        });

        let result = analysis.filter(&filter);
        page.cards(&[
            Card::new("Registros", result.count.to_string()),
            Card::currency("Total", result.total),
            Card::currency("Maior valor", result.max),
            Card::currency("Menor valor", result.min),
        ])
        .table(&["Código", "Nome", "Valor"], revenue_rows(&result.rows));
    })
}

#[get("/loa/codes")]
async fn loa_codes(data: web::Data<DashboardState>) -> impl Responder {
    loa_page(&data, "Códigos Detectados", |page, analysis, _| {
        let codes = analysis.detected_codes();
        page.cards(&[
            Card::new("Categorias detectadas", codes.total().to_string()),
            Card::new("Tributárias", codes.tax.len().to_string()),
            Card::new("Transferências", codes.transfer.len().to_string()),
            Card::new("Outras", codes.other.len().to_string()),
        ]);
        let headers = ["Categoria", "Nome", "Valor", "Participação"];
        page.heading("Tributárias").table(&headers, share_rows(&codes.tax));
        page.heading("Transferências").table(&headers, share_rows(&codes.transfer));
        page.heading("Outras").table(&headers, share_rows(&codes.other));
    })
}

#[get("/loa/structure")]
async fn loa_structure(data: web::Data<DashboardState>) -> impl Responder {
    loa_page(&data, "Estrutura das Receitas", |page, analysis, loa| {
        let overview = analysis.structure_overview();
        page.cards(&[
            Card::new("Registros", loa.structure.len().to_string()),
            Card::new("Códigos únicos", overview.unique_keys.to_string()),
        ]);
        page.heading("Registros por Nível").table(
            &["Nível", "Registros"],
            overview
                .level_counts
                .iter()
                .map(|(level, count)| vec![Cell::text(level), Cell::count(*count)])
                .collect(),
        );
        page.heading("Primeiros Registros").table(
            &["Código", "Nome", "Nível"],
            overview
                .preview
                .iter()
                .map(|e| vec![Cell::text(e.code.to_string()), Cell::text(&e.name), Cell::text(&e.level)])
                .collect(),
        );
    })
}

// ============================================================
// EXECUTION PAGES
// ============================================================

#[get("/execution")]
async fn execution_overview(data: web::Data<DashboardState>) -> impl Responder {
    execution_page(&data, EXECUTION_TITLE, |page, execution| {
        let totals = ExecutionTotals::from_data(execution);
        page.heading("Receitas").cards(&[
            Card::currency("Previsão Atualizada", totals.forecast),
            Card::currency("Arrecadado", totals.collected),
            Card::percent("Execução da Receita", totals.revenue_execution_pct),
            Card::currency("Total LOA", totals.loa_total),
            Card::percent("Execução vs LOA", totals.execution_vs_loa_pct),
        ]);
        let result_tone = if totals.is_surplus() { Tone::Good } else { Tone::Poor };
        page.heading("Despesas").cards(&[
            Card::currency("Dotação Atual", totals.appropriation),
            Card::currency("Empenhado", totals.committed)
                .detail(format_percent(totals.committed_pct(), 1)),
            Card::currency("Liquidado", totals.liquidated)
                .detail(format_percent(totals.liquidated_pct(), 1)),
            Card::currency("Pago", totals.paid).detail(format_percent(totals.paid_pct(), 1)),
            Card::currency("Resultado Orçamentário", totals.budget_result).tone(result_tone),
        ]);

        page.heading("Funil da Despesa").table(
            &["Etapa", "Valor", "% da etapa anterior"],
            expense_funnel(&totals)
                .iter()
                .map(|s| vec![Cell::text(&s.stage), Cell::currency(s.value), Cell::percent(s.pct_of_previous)])
                .collect(),
        );
        page.heading("Receita x Despesa").bars(&revenue_vs_expense(&totals));

        let insights = ExecutionInsights::compute(execution);
        page.heading("Insights").cards(&[
            indicator_card(&insights.loa_execution, format_percent(insights.loa_execution.value, 1)),
            indicator_card(
                &insights.portal_execution,
                format_percent(insights.portal_execution.value, 1),
            ),
            indicator_card(&insights.budget_result, format_currency(insights.budget_result.value)),
            indicator_card(&insights.liquidity, format_percent(insights.liquidity.value, 1)),
        ]);

        let findings = &insights.findings;
        let comparison = match findings.loa_comparison {
            LoaComparison::Above => format!(
                "Arrecadação acima da LOA em {}",
                format_currency(findings.loa_difference)
            ),
            LoaComparison::Below => format!(
                "Arrecadação abaixo da LOA em {}",
                format_currency(findings.loa_difference.abs())
            ),
            LoaComparison::Near => "Arrecadação próxima ao previsto na LOA".to_string(),
        };
        page.info(&comparison);
        for (prefix, finding) in [
            ("Maior receita", &findings.largest_revenue),
            ("Função com maior gasto", &findings.top_function),
            ("Maior fornecedor", &findings.top_supplier),
        ] {
            if let Some(item) = finding {
                page.paragraph(&format!("{}: {} ({})", prefix, item.label, format_currency(item.value)));
            }
        }
    })
}

fn area_row(area: &AreaMetric) -> Vec<Cell> {
    let status = area
        .tone
        .map(|t| t.emoji().to_string())
        .unwrap_or_default();
    vec![
        Cell::text(&area.label),
        Cell::currency(area.amount),
        Cell::percent(area.pct),
        Cell::text(status),
    ]
}

#[get("/execution/metrics")]
async fn execution_metrics(data: web::Data<DashboardState>) -> impl Responder {
    let population = data.config.population;
    let today = Local::now().date_naive();
    execution_page(&data, "Métricas Completas", |page, execution| {
        let metrics = FiscalMetrics::compute(execution, population, today);

        let basic = &metrics.basic;
        page.heading("Indicadores Básicos").cards(&[
            Card::currency("Receita Realizada", basic.revenue),
            Card::currency("Despesa Empenhada", basic.expense),
            Card::currency("Resultado", basic.result)
                .detail(format_percent(basic.result_pct_of_revenue, 1)),
            Card::currency("Receita per capita", basic.revenue_per_capita),
            Card::currency("Despesa per capita", basic.expense_per_capita)
                .detail(format!("População: {}", basic.population)),
        ]);

        let exec = &metrics.execution;
        page.heading("Execução").cards(&[
            Card::percent("Execução LOA", exec.loa),
            Card::percent("Execução Portal", exec.portal),
            Card::percent("Execução Orçamentária", exec.budgetary),
            Card::percent("Execução Financeira", exec.financial),
            Card::percent("Liquidação", exec.liquidation),
        ]);

        let autonomy = &metrics.autonomy;
        page.heading("Autonomia Fiscal").cards(&[
            Card::currency("Receita Tributária", autonomy.tax_revenue),
            Card::currency("Transferências", autonomy.transfers),
            Card::percent("Autonomia", autonomy.autonomy).tone(autonomy.autonomy_tone),
            Card::percent("Dependência", autonomy.dependence).tone(autonomy.dependence_tone),
            Card::currency("Outras Receitas", autonomy.other_revenue)
                .detail(format_percent(autonomy.other_pct, 1)),
            Card::new("Índice de Equilíbrio", format!("{:.1}", autonomy.balance_score)),
        ]);

        let areas = &metrics.areas;
        page.heading("Áreas Prioritárias").table(
            &["Área", "Empenhado", "% da Despesa", "Status"],
            vec![
                area_row(&areas.health),
                area_row(&areas.education),
                area_row(&areas.social_assistance),
                area_row(&areas.investments),
                area_row(&areas.operating_costs),
            ],
        );

        let liquidity = &metrics.liquidity;
        page.heading("Liquidez").cards(&[
            Card::percent("Liquidez Geral", liquidity.general_liquidity).tone(liquidity.liquidity_tone),
            Card::currency("Restos a Pagar", liquidity.remaining_payables)
                .detail(format_percent(liquidity.remaining_pct_of_liquidated, 1)),
            Card::currency("Disponibilidade de Caixa", liquidity.cash_availability)
                .detail(format_percent(liquidity.cash_pct_of_revenue, 1)),
            Card::percent("Giro de Pagamentos", liquidity.payment_turnover),
        ]);

        let efficiency = &metrics.efficiency;
        page.heading("Eficiência").cards(&[
            Card::percent("Eficiência Arrecadatória", efficiency.collection_efficiency)
                .tone(efficiency.collection_tone),
            Card::percent("Concentração de Fornecedores", efficiency.supplier_concentration)
                .detail(format!("{} fornecedores", efficiency.supplier_count)),
            Card::new("Diversificação da Receita", format!("{:.3}", efficiency.diversification)),
            Card::new(
                "Ciclo Médio",
                efficiency
                    .cycle_days
                    .map(|d| format!("{} dias", d))
                    .unwrap_or_else(|| "N/D".to_string()),
            ),
        ]);

        let benchmarks = &metrics.benchmarks;
        page.heading("Benchmarks").cards(&[
            Card::new("Índice de Qualidade Fiscal", format!("{:.1}", benchmarks.fiscal_quality_index))
                .tone(benchmarks.fiscal_quality_tone),
            Card::new("Sustentabilidade", format!("{:.0}/100", benchmarks.sustainability_score)),
            Card::new("Empenhos", benchmarks.commitment_count.to_string())
                .detail(format!("{:.3} por habitante", benchmarks.commitments_per_inhabitant)),
            Card::percent("Efetividade Social", benchmarks.social_effectiveness)
                .tone(benchmarks.social_tone),
        ]);

        page.heading("Alertas");
        if metrics.is_regular() {
            page.info("Situação fiscal regular: nenhum alerta.");
        }
        for alert in &metrics.alerts {
            let text = format!("{}: {} Recomendação: {}", alert.title, alert.message, alert.recommendation);
            if alert.critical {
                page.warning(&text);
            } else {
                page.info(&text);
            }
        }
    })
}

#[get("/execution/reconciliation")]
async fn execution_reconciliation(data: web::Data<DashboardState>) -> impl Responder {
    execution_page(&data, "LOA x Execução", |page, execution| {
        let reconciliation = Reconciliation::from_data(execution);
        page.cards(&[
            Card::currency("Total LOA", reconciliation.loa_total),
            Card::currency("Arrecadado", reconciliation.collected),
            Card::currency("Diferença", reconciliation.difference),
            Card::percent("Execução Geral", reconciliation.overall.execution_pct)
                .detail(&reconciliation.overall.label)
                .tone(reconciliation.overall.tone),
        ]);

        page.heading("Comparação por Categoria").table(
            &["Categoria", "Previsto (LOA)", "Executado", "Execução", "Diferença"],
            reconciliation
                .rows
                .iter()
                .map(|r| {
                    vec![
                        Cell::text(&r.name),
                        Cell::currency(r.planned),
                        Cell::currency(r.executed),
                        Cell::percent(r.execution_pct),
                        Cell::currency(r.difference),
                    ]
                })
                .collect(),
        );

        let ranking: Vec<LabeledAmount> = reconciliation
            .top_execution()
            .into_iter()
            .map(|r| LabeledAmount::new(r.name, r.execution_pct))
            .collect();
        page.heading("Ranking de Execução").percent_bars(&ranking);

        if let Some(best) = &reconciliation.best {
            page.info(&format!(
                "Melhor execução: {} ({})",
                best.name,
                format_percent(best.execution_pct, 1)
            ));
        }
        if let Some(attention) = &reconciliation.attention {
            page.warning(&format!(
                "Atenção: {} ({})",
                attention.name,
                format_percent(attention.execution_pct, 1)
            ));
        }
    })
}

#[get("/execution/revenues")]
async fn execution_revenues(data: web::Data<DashboardState>) -> impl Responder {
    execution_page(&data, "Receitas Executadas", |page, execution| {
        let breakdown = executed_breakdown(&execution.revenues);
        let collected: Vec<LabeledAmount> = breakdown
            .top_collected
            .iter()
            .map(|c| LabeledAmount::new(&c.name, c.collected))
            .collect();
        page.heading("Maiores Arrecadações por Categoria").bars(&collected);

        page.heading("Melhores Execuções").table(
            &["Categoria", "Previsto", "Arrecadado", "Execução"],
            breakdown
                .top_execution
                .iter()
                .map(|c| {
                    vec![
                        Cell::text(&c.name),
                        Cell::currency(c.forecast),
                        Cell::currency(c.collected),
                        Cell::percent(c.execution_pct),
                    ]
                })
                .collect(),
        );

        page.heading("Maiores Receitas Individuais").table(
            &["Código", "Especificação", "Previsto", "Arrecadado", "Execução"],
            breakdown
                .top_individual
                .iter()
                .map(|r| {
                    vec![
                        Cell::text(&r.code),
                        Cell::text(&r.description),
                        Cell::currency(r.forecast),
                        Cell::currency(r.collected),
                        Cell::percent(r.execution_pct),
                    ]
                })
                .collect(),
        );

        page.heading("Previsto x Arrecadado").table(
            &["Categoria", "Previsto", "Arrecadado", "Diferença", "Execução"],
            forecast_vs_collected(&execution.revenues)
                .iter()
                .map(|c| {
                    vec![
                        Cell::text(&c.name),
                        Cell::currency(c.forecast),
                        Cell::currency(c.collected),
                        Cell::currency(c.difference),
                        Cell::percent(c.execution_pct),
                    ]
                })
                .collect(),
        );
    })
}

#[derive(Debug, Default, Deserialize)]
struct FunctionForm {
    function: Option<String>,
}

fn function_select(options: &[String], selected: Option<&str>, include_all: bool) -> Markup {
    html! {
        select name="function" {
            @if include_all {
                option { (ALL_FUNCTIONS) }
            }
            @for name in options {
                option selected[Some(name.as_str()) == selected] { (name) }
            }
        }
    }
}

#[get("/execution/expenses")]
async fn execution_expenses(
    data: web::Data<DashboardState>,
    form: web::Query<FunctionForm>,
) -> impl Responder {
    execution_page(&data, "Despesas Executadas", |page, execution| {
        let expenses = &execution.expenses;

        page.heading("Execução por Função").table(
            &["Função", "Dotação", "Empenhado", "Liquidado", "Pago", "Exec. Orçamentária", "Exec. Financeira"],
            expense_analysis::top_functions(expenses)
                .iter()
                .map(|f| {
                    vec![
                        Cell::text(format!("{} - {}", f.code, f.name)),
                        Cell::currency(f.appropriation),
                        Cell::currency(f.committed),
                        Cell::currency(f.liquidated),
                        Cell::currency(f.paid),
                        Cell::percent(f.budgetary_pct),
                        Cell::percent(f.financial_pct),
                    ]
                })
                .collect(),
        );

        page.heading("Por Natureza da Despesa")
            .bars(&expense_analysis::top_natures(expenses));

        let monthly: Vec<LabeledAmount> = expense_analysis::monthly_evolution(expenses)
            .into_iter()
            .map(|m| LabeledAmount::new(m.month, m.committed))
            .collect();
        page.heading("Evolução Mensal do Empenho").bars(&monthly);

        page.heading("Principais Fornecedores").table(
            &["Fornecedor", "Empenhado", "Liquidado", "Pago"],
            expense_analysis::top_suppliers(expenses)
                .iter()
                .map(|s| {
                    vec![
                        Cell::text(&s.name),
                        Cell::currency(s.committed),
                        Cell::currency(s.liquidated),
                        Cell::currency(s.paid),
                    ]
                })
                .collect(),
        );

        let principal = expense_analysis::principal_functions(expenses);
        if principal.by_committed.is_empty() {
            page.info("Nenhuma função com empenho acima de R$ 10.000,00.");
        } else {
            let budgetary: Vec<LabeledAmount> = principal
                .by_budgetary
                .iter()
                .map(|f| LabeledAmount::new(&f.name, f.budgetary_pct))
                .collect();
            let financial: Vec<LabeledAmount> = principal
                .by_financial
                .iter()
                .map(|f| LabeledAmount::new(&f.name, f.financial_pct))
                .collect();
            page.heading("Execução Orçamentária das Principais Funções")
                .percent_bars(&budgetary);
            page.heading("Execução Financeira das Principais Funções")
                .percent_bars(&financial);
        }

        let options = function_options(expenses);
        let selected = non_blank(&form.function);
        page.heading("Detalhamento por Função").markup(html! {
            form method="get" {
                (function_select(&options, selected, false))
                button type="submit" { "Detalhar" }
            }
        });
        if let Some(name) = selected {
            match expense_analysis::drilldown(expenses, name) {
                Some(detail) => {
                    page.table(
                        &["Subfunção", "Empenhado", "Liquidado", "Pago"],
                        detail
                            .subfunctions
                            .iter()
                            .map(|s| {
                                vec![
                                    Cell::text(&s.name),
                                    Cell::currency(s.committed),
                                    Cell::currency(s.liquidated),
                                    Cell::currency(s.paid),
                                ]
                            })
                            .collect(),
                    );
                    page.bars(&detail.top_suppliers);
                }
                None => {
                    page.warning(&format!("Função não encontrada: {}", name));
                }
            }
        }
    })
}

#[derive(Debug, Default, Deserialize)]
struct SearchForm {
    submitted: Option<String>,
    min_collected: Option<String>,
    query: Option<String>,
    only_collected: Option<String>,
    min_committed: Option<String>,
    function: Option<String>,
    supplier: Option<String>,
    start_date: Option<String>,
}

impl SearchForm {
    fn revenue_search(&self) -> RevenueSearch {
        RevenueSearch {
            min_collected: amount_input(&self.min_collected),
            query: non_blank(&self.query).map(str::to_string),
            // unchecked boxes are absent from a submitted form
            only_collected: Some(self.submitted.is_none() || self.only_collected.is_some()),
        }
    }

    fn expense_search(&self) -> ExpenseSearch {
        ExpenseSearch {
            min_committed: amount_input(&self.min_committed),
            function: non_blank(&self.function).map(str::to_string),
            supplier: non_blank(&self.supplier).map(str::to_string),
            start_date: non_blank(&self.start_date)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        }
    }
}

#[get("/execution/search")]
async fn execution_search(
    data: web::Data<DashboardState>,
    form: web::Query<SearchForm>,
) -> impl Responder {
    let revenue_search = form.revenue_search();
    let expense_search = form.expense_search();

    execution_page(&data, "Consulta Detalhada", |page, execution| {
        let options = function_options(&execution.expenses);
        let echo = |field: &Option<String>| non_blank(field).unwrap_or("").to_string();
        let only_collected = revenue_search.only_collected.unwrap_or(true);

        page.markup(html! {
            form method="get" {
                input type="hidden" name="submitted" value="1";
                fieldset {
                    legend { "Receitas" }
                    label { "Arrecadação mínima " input name="min_collected" value=(echo(&form.min_collected)); }
                    label { "Descrição " input name="query" value=(echo(&form.query)); }
                    label { input type="checkbox" name="only_collected" checked[only_collected]; " Somente com arrecadação" }
                }
                fieldset {
                    legend { "Despesas" }
                    label { "Empenho mínimo " input name="min_committed" value=(echo(&form.min_committed)); }
                    label { "Função " (function_select(&options, non_blank(&form.function), true)) }
                    label { "Fornecedor " input name="supplier" value=(echo(&form.supplier)); }
                    label { "A partir de " input type="date" name="start_date" value=(echo(&form.start_date)); }
                }
                button type="submit" { "Consultar" }
            }
        });

        let revenues = search_revenues(&execution.revenues, &revenue_search);
        page.heading("Receitas").cards(&[
            Card::new("Registros", revenues.count.to_string()),
            Card::currency("Total Arrecadado", revenues.total_collected),
            Card::currency("Maior Arrecadação", revenues.max_collected),
            Card::percent("Execução Média", revenues.average_execution_pct),
        ]);
        page.table(
            &["Código", "Especificação", "Previsto", "Arrecadado", "Execução"],
            revenues
                .rows
                .iter()
                .map(|r| {
                    vec![
                        Cell::text(&r.code),
                        Cell::text(&r.description),
                        Cell::currency(r.forecast),
                        Cell::currency(r.collected),
                        Cell::percent(r.execution_pct),
                    ]
                })
                .collect(),
        );

        let expenses = search_expenses(&execution.expenses, &expense_search);
        page.heading("Despesas").cards(&[
            Card::new("Registros", expenses.count.to_string()),
            Card::currency("Total Empenhado", expenses.total_committed),
            Card::currency("Total Pago", expenses.total_paid),
            Card::percent("% Pago", expenses.paid_pct),
        ]);
        page.table(
            &["Empenho", "Data", "Fornecedor", "Função", "Empenhado", "Liquidado", "Pago"],
            expenses
                .rows
                .iter()
                .map(|e| {
                    vec![
                        Cell::text(&e.commitment),
                        Cell::text(
                            e.date
                                .map(|d| d.format("%d/%m/%Y").to_string())
                                .unwrap_or_default(),
                        ),
                        Cell::text(&e.supplier),
                        Cell::text(&e.function_name),
                        Cell::currency(e.committed),
                        Cell::currency(e.liquidated),
                        Cell::currency(e.paid),
                    ]
                })
                .collect(),
        );
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(loa_overview)
        .service(loa_tax)
        .service(loa_transfers)
        .service(loa_detail)
        .service(loa_codes)
        .service(loa_structure)
        .service(execution_overview)
        .service(execution_metrics)
        .service(execution_reconciliation)
        .service(execution_revenues)
        .service(execution_expenses)
        .service(execution_search);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::dataset_loader::fixtures;
    use actix_web::test as actix_test;
    use actix_web::App;
    use std::sync::{Arc, Mutex};

    async fn get_html(uri: &str) -> String {
        let dir = tempfile::tempdir().unwrap();
        let state = web::Data::new(DashboardState::load(
            fixtures::write_all(dir.path()),
            Arc::new(Mutex::new(Vec::new())),
        ));
        let app = actix_test::init_service(App::new().app_data(state).configure(configure)).await;
        let req = actix_test::TestRequest::get().uri(uri).to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[actix_web::test]
    async fn test_loa_overview_page() {
        let html = get_html("/loa").await;
        assert!(html.contains(LOA_TITLE));
        assert!(html.contains("R$ 7.000,00"));
        assert!(html.contains("Cota-Parte FPM"));
    }

    #[actix_web::test]
    async fn test_reconciliation_page_highlights() {
        let html = get_html("/execution/reconciliation").await;
        assert!(html.contains("Melhor execução: Impostos s/ Serviços"));
        assert!(html.contains("Atenção: SUS - União"));
    }

    #[actix_web::test]
    async fn test_search_page_applies_filters() {
        let html = get_html("/execution/search?submitted=1&supplier=farma&min_committed=").await;
        assert!(html.contains("R$ 1.300,00"));
        assert!(!html.contains("CONSTRUTORA XYZ</td>"));
    }

    #[actix_web::test]
    async fn test_expense_drilldown_page() {
        let html = get_html("/execution/expenses?function=Sa%C3%BAde").await;
        assert!(html.contains("Atenção Básica"));
        assert!(!html.contains("Função não encontrada"));
    }

    #[actix_web::test]
    async fn test_search_form_echoes_input_as_text() {
        let html = get_html("/execution/search?submitted=1&query=%3Cb%3EIPTU&function=Sa%C3%BAde").await;
        assert!(html.contains("value=\"&lt;b&gt;IPTU\""));
        assert!(!html.contains("<b>IPTU"));
        assert!(html.contains("<option selected>Saúde</option>"));
        assert!(!html.contains("name=\"only_collected\" checked"));
    }

    #[test]
    fn test_search_form_checkbox_semantics() {
        let fresh = SearchForm::default();
        assert_eq!(fresh.revenue_search().only_collected, Some(true));

        let unchecked = SearchForm {
            submitted: Some("1".to_string()),
            ..Default::default()
        };
        assert_eq!(unchecked.revenue_search().only_collected, Some(false));

        let dated = SearchForm {
            start_date: Some("2025-02-01".to_string()),
            min_committed: Some("1.000,00".to_string()),
            ..Default::default()
        };
        let search = dated.expense_search();
        assert_eq!(search.start_date, NaiveDate::from_ymd_opt(2025, 2, 1));
        assert_eq!(search.min_committed, Some(1000.0));
    }
}
