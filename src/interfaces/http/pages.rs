// ============================================================
// HTML PAGE BUILDER
// ============================================================
// Server-rendered dashboard pages built with maud: metric
// cards, tables and horizontal bar charts drawn with CSS

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::application::use_cases::indicator::{LabeledAmount, Tone};
use crate::domain::money::{format_currency, format_percent};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f5f6f8; color: #222; }
header { background: #1f4e79; color: #fff; padding: 16px 24px; }
header h1 { margin: 0; font-size: 1.5em; }
header p { margin: 4px 0 0; opacity: .85; }
nav { background: #fff; padding: 8px 24px; border-bottom: 1px solid #ddd; }
nav a { margin-right: 14px; color: #1f4e79; text-decoration: none; }
main { padding: 16px 24px; }
h2 { border-bottom: 2px solid #1f4e79; padding-bottom: 4px; }
.cards { display: flex; flex-wrap: wrap; gap: 12px; }
.card { background: #fff; border-radius: 6px; padding: 12px 16px; min-width: 180px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
.card .label { font-size: .85em; color: #666; }
.card .value { font-size: 1.4em; font-weight: 600; }
.card .detail { font-size: .8em; color: #555; }
.tone-good { border-left: 5px solid #2e7d32; }
.tone-moderate { border-left: 5px solid #f9a825; }
.tone-poor { border-left: 5px solid #c62828; }
table { border-collapse: collapse; background: #fff; width: 100%; margin: 8px 0 16px; }
th, td { padding: 6px 10px; border-bottom: 1px solid #eee; text-align: left; }
th { background: #eef2f7; }
td.num { text-align: right; font-variant-numeric: tabular-nums; }
.bar-row { display: flex; align-items: center; margin: 4px 0; }
.bar-label { width: 280px; font-size: .9em; }
.bar { background: #4a90d9; height: 18px; border-radius: 3px; }
.bar-value { margin-left: 8px; font-size: .85em; }
.warning { background: #fff3cd; border: 1px solid #f0c36d; padding: 10px 14px; border-radius: 4px; }
.info { background: #e3f2fd; border: 1px solid #90caf9; padding: 10px 14px; border-radius: 4px; }
form { background: #fff; padding: 10px 14px; border-radius: 6px; margin-bottom: 12px; }
form label { margin-right: 12px; }
footer { padding: 12px 24px; color: #777; font-size: .85em; }
"#;

const NAV: &[(&str, &str)] = &[
    ("/", "Início"),
    ("/loa", "LOA"),
    ("/loa/tax", "Tributos"),
    ("/loa/transfers", "Transferências"),
    ("/loa/detail", "Detalhamento"),
    ("/loa/codes", "Códigos"),
    ("/loa/structure", "Estrutura"),
    ("/execution", "Execução"),
    ("/execution/metrics", "Métricas Completas"),
    ("/execution/reconciliation", "LOA x Execução"),
    ("/execution/revenues", "Receitas"),
    ("/execution/expenses", "Despesas"),
    ("/execution/search", "Consulta"),
];

/// One metric card
pub struct Card {
    pub label: String,
    pub value: String,
    pub detail: Option<String>,
    pub tone: Option<Tone>,
}

impl Card {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            detail: None,
            tone: None,
        }
    }

    pub fn currency(label: impl Into<String>, value: f64) -> Self {
        Self::new(label, format_currency(value))
    }

    pub fn percent(label: impl Into<String>, value: f64) -> Self {
        Self::new(label, format_percent(value, 1))
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.tone = Some(tone);
        self
    }
}

/// Column alignment of a table cell
pub enum Cell {
    Text(String),
    Number(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn currency(value: f64) -> Self {
        Cell::Number(format_currency(value))
    }

    pub fn percent(value: f64) -> Self {
        Cell::Number(format_percent(value, 1))
    }

    pub fn count(value: usize) -> Self {
        Cell::Number(value.to_string())
    }
}

pub struct Page {
    title: String,
    subtitle: String,
    sections: Vec<Markup>,
    footer: Option<String>,
}

impl Page {
    pub fn new(title: &str, subtitle: &str) -> Self {
        Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            sections: Vec::new(),
            footer: None,
        }
    }

    pub fn heading(&mut self, text: &str) -> &mut Self {
        self.sections.push(html! { h2 { (text) } });
        self
    }

    pub fn paragraph(&mut self, text: &str) -> &mut Self {
        self.sections.push(html! { p { (text) } });
        self
    }

    pub fn cards(&mut self, cards: &[Card]) -> &mut Self {
        self.sections.push(html! {
            div.cards {
                @for card in cards {
                    div class={ "card " (card.tone.map(|t| t.css_class()).unwrap_or("")) } {
                        div.label { (card.label) }
                        div.value {
                            @if let Some(tone) = card.tone {
                                (tone.emoji()) " "
                            }
                            (card.value)
                        }
                        @if let Some(detail) = &card.detail {
                            div.detail { (detail) }
                        }
                    }
                }
            }
        });
        self
    }

    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<Cell>>) -> &mut Self {
        self.sections.push(html! {
            table {
                tr {
                    @for header in headers {
                        th { (header) }
                    }
                }
                @for row in &rows {
                    tr {
                        @for cell in row {
                            @match cell {
                                Cell::Text(v) => { td { (v) } }
                                Cell::Number(v) => { td.num { (v) } }
                            }
                        }
                    }
                }
            }
        });
        self
    }

    /// Horizontal bars scaled to the largest value
    pub fn bars(&mut self, items: &[LabeledAmount]) -> &mut Self {
        self.scaled_bars(items, format_currency)
    }

    /// Bars whose values are percentages
    pub fn percent_bars(&mut self, items: &[LabeledAmount]) -> &mut Self {
        self.scaled_bars(items, |v| format_percent(v, 1))
    }

    fn scaled_bars(&mut self, items: &[LabeledAmount], format: impl Fn(f64) -> String) -> &mut Self {
        let max = items.iter().map(|i| i.value).fold(0.0_f64, f64::max);
        let width = |value: f64| {
            if max > 0.0 {
                (value.max(0.0) / max * 100.0).round()
            } else {
                0.0
            }
        };
        self.sections.push(html! {
            @for item in items {
                div.bar-row {
                    span.bar-label { (item.label) }
                    span.bar style={ "width:" (width(item.value)) "%;max-width:50%" } {}
                    span.bar-value { (format(item.value)) }
                }
            }
        });
        self
    }

    pub fn warning(&mut self, message: &str) -> &mut Self {
        self.sections.push(html! { div.warning { "⚠️ " (message) } });
        self
    }

    pub fn info(&mut self, message: &str) -> &mut Self {
        self.sections.push(html! { div.info { "ℹ️ " (message) } });
        self
    }

    /// Extra markup such as a filter form
    pub fn markup(&mut self, markup: Markup) -> &mut Self {
        self.sections.push(markup);
        self
    }

    pub fn footer(&mut self, text: &str) -> &mut Self {
        self.footer = Some(text.to_string());
        self
    }

    pub fn render(&self) -> Markup {
        html! {
            (DOCTYPE)
            html lang="pt-BR" {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    style { (PreEscaped(STYLE)) }
                }
                body {
                    header {
                        h1 { (self.title) }
                        p { (self.subtitle) }
                    }
                    nav {
                        @for (href, label) in NAV {
                            a href=(href) { (label) }
                        }
                    }
                    main {
                        @for section in &self.sections {
                            (section)
                        }
                    }
                    @if let Some(text) = &self.footer {
                        footer { (text) }
                    }
                }
            }
        }
    }
}

/// Page that only carries the load failure of its dataset
pub fn unavailable(title: &str, subtitle: &str, message: &str) -> Markup {
    let mut page = Page::new(title, subtitle);
    page.warning(message);
    page.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_escaped() {
        let mut page = Page::new("<script>", "s");
        page.heading("<b>A & B</b>")
            .table(&["Nome"], vec![vec![Cell::text("\"x\" < y")]]);
        let html = page.render().into_string();

        assert!(html.contains("<h2>&lt;b&gt;A &amp; B&lt;/b&gt;</h2>"));
        assert!(html.contains("<td>&quot;x&quot; &lt; y</td>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_page_renders_sections() {
        let mut page = Page::new("LOA", "Rifaina");
        page.heading("Resumo")
            .cards(&[Card::currency("Total", 1234.5).tone(Tone::Good)])
            .table(&["Nome", "Valor"], vec![vec![Cell::text("IPTU"), Cell::currency(10.0)]])
            .footer("Atualizado");
        let html = page.render().into_string();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h2>Resumo</h2>"));
        assert!(html.contains("R$ 1.234,50"));
        assert!(html.contains("tone-good"));
        assert!(html.contains("<td class=\"num\">R$ 10,00</td>"));
        assert!(html.contains("<footer>Atualizado</footer>"));
    }

    #[test]
    fn test_bars_scale_to_largest_value() {
        let mut page = Page::new("t", "s");
        page.bars(&[LabeledAmount::new("A", 200.0), LabeledAmount::new("B", 50.0)]);
        let html = page.render().into_string();

        assert!(html.contains("width:100%"));
        assert!(html.contains("width:25%"));
    }

    #[test]
    fn test_markup_sections_are_kept_verbatim() {
        let mut page = Page::new("t", "s");
        page.markup(html! { form method="get" { button type="submit" { "Filtrar" } } });
        let html = page.render().into_string();

        assert!(html.contains("<form method=\"get\"><button type=\"submit\">Filtrar</button></form>"));
    }

    #[test]
    fn test_unavailable_page_shows_message() {
        let html = unavailable("Execução", "Rifaina", "Erro ao carregar os dados.").into_string();
        assert!(html.contains("class=\"warning\""));
        assert!(html.contains("Erro ao carregar os dados."));
    }
}
