// ============================================================
// RECORD MAPPER
// ============================================================
// Map decoded CSV rows onto typed budget records by header name

use chrono::NaiveDate;

use crate::domain::budget::{
    ExecutedExpense, ExecutedRevenue, PlannedRevenue, RevenueCode, StructureEntry,
};
use crate::domain::csv::{CsvRow, CsvTable};
use crate::domain::money::{parse_currency, parse_plain_number};

/// Column names of the planned revenue (LOA) export
pub mod planned {
    pub const CODE: &str = "CODRE";
    pub const NAME: &str = "NOME";
    pub const VALUE: &str = "TOTOR";
}

/// Column names of the revenue structure export
pub mod structure {
    pub const CODE: &str = "CODRE";
    pub const NAME: &str = "NOMRE";
    pub const LEVEL: &str = "NIVEL";
}

/// Column names of the executed revenue export
pub mod revenue {
    pub const CODE: &str = "Código";
    pub const DESCRIPTION: &str = "Especificação";
    pub const INITIAL_FORECAST: &str = "Prev. Inicial";
    pub const UPDATED_FORECAST: &str = "Prev. Atualizada";
    pub const PERIOD_COLLECTED: &str = "Arrec. Período";
    pub const TOTAL_COLLECTED: &str = "Arrec. Total";
}

/// Column names of the executed expense export
pub mod expense {
    pub const COMMITMENT: &str = "Empenho";
    pub const DATE: &str = "Data";
    pub const FUNCTION: &str = "Função";
    pub const FUNCTION_NAME: &str = "Nome da Função";
    pub const SUBFUNCTION: &str = "Subfunção";
    pub const SUBFUNCTION_NAME: &str = "Nome da Subfunção";
    pub const NATURE: &str = "Natureza";
    pub const NATURE_NAME: &str = "Nome Natureza";
    pub const SUPPLIER: &str = "Nome Fornecedor";
    pub const APPROPRIATION: &str = "Dotação";
    pub const APPROPRIATION_CHANGE: &str = "Alteração Dotação";
    pub const CURRENT_APPROPRIATION: &str = "Dotação Atual";
    pub const ANNULLED: &str = "Valor Anulado";
    pub const REINFORCEMENT: &str = "Reforço";
    pub const COMMITTED: &str = "Valor Empenhado";
    pub const LIQUIDATED: &str = "Valor Liquidado";
    pub const PAID: &str = "Valor Pago";
    pub const COMMITTED_TO_DATE: &str = "Empenhado até Hoje";
    pub const LIQUIDATED_TO_DATE: &str = "Liquidado até Hoje";
    pub const PAID_TO_DATE: &str = "Pago até Hoje";
}

pub const DATE_FORMAT: &str = "%d/%m/%Y";

pub fn planned_revenues(table: &CsvTable) -> Vec<PlannedRevenue> {
    table
        .rows
        .iter()
        .map(|row| PlannedRevenue {
            code: RevenueCode::new(row.get(planned::CODE)),
            name: row.get(planned::NAME).to_string(),
            planned: parse_plain_number(row.get(planned::VALUE)),
        })
        .collect()
}

pub fn structure_entries(table: &CsvTable) -> Vec<StructureEntry> {
    table
        .rows
        .iter()
        .map(|row| StructureEntry {
            code: RevenueCode::new(row.get(structure::CODE)),
            name: row.get(structure::NAME).to_string(),
            level: row.get(structure::LEVEL).trim().to_string(),
        })
        .collect()
}

pub fn executed_revenues(table: &CsvTable) -> Vec<ExecutedRevenue> {
    table
        .rows
        .iter()
        .map(|row| ExecutedRevenue {
            code: RevenueCode::new(row.get(revenue::CODE)),
            description: row.get(revenue::DESCRIPTION).to_string(),
            initial_forecast: money(row, revenue::INITIAL_FORECAST),
            updated_forecast: money(row, revenue::UPDATED_FORECAST),
            period_collected: money(row, revenue::PERIOD_COLLECTED),
            total_collected: money(row, revenue::TOTAL_COLLECTED),
        })
        .collect()
}

pub fn executed_expenses(table: &CsvTable) -> Vec<ExecutedExpense> {
    table
        .rows
        .iter()
        .map(|row| ExecutedExpense {
            commitment: row.get(expense::COMMITMENT).to_string(),
            date: parse_date(row.get(expense::DATE)),
            function_code: row.get(expense::FUNCTION).to_string(),
            function_name: row.get(expense::FUNCTION_NAME).to_string(),
            subfunction_code: row.get(expense::SUBFUNCTION).to_string(),
            subfunction_name: row.get(expense::SUBFUNCTION_NAME).to_string(),
            nature_code: row.get(expense::NATURE).to_string(),
            nature_name: row.get(expense::NATURE_NAME).to_string(),
            supplier: row.get(expense::SUPPLIER).to_string(),
            appropriation: money(row, expense::APPROPRIATION),
            appropriation_change: money(row, expense::APPROPRIATION_CHANGE),
            current_appropriation: money(row, expense::CURRENT_APPROPRIATION),
            annulled: money(row, expense::ANNULLED),
            reinforcement: money(row, expense::REINFORCEMENT),
            committed: money(row, expense::COMMITTED),
            liquidated: money(row, expense::LIQUIDATED),
            paid: money(row, expense::PAID),
            committed_to_date: money(row, expense::COMMITTED_TO_DATE),
            liquidated_to_date: money(row, expense::LIQUIDATED_TO_DATE),
            paid_to_date: money(row, expense::PAID_TO_DATE),
        })
        .collect()
}

fn money(row: &CsvRow, header: &str) -> f64 {
    parse_currency(row.get(header))
}

/// `dd/mm/yyyy`; anything else is treated as missing
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::csv::CsvParser;

    #[test]
    fn test_map_planned_revenues() {
        let table = CsvParser::new()
            .parse_content("CODRE;NOME;TOTOR\n1112.50.01;IPTU;1500.5\n1711.51;FPM;abc")
            .unwrap();
        let rows = planned_revenues(&table);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].code.to_string(), "1112.50.01");
        assert_eq!(rows[0].planned, 1500.5);
        assert_eq!(rows[1].planned, 0.0);
    }

    #[test]
    fn test_map_executed_revenues_parses_currency() {
        let table = CsvParser::new()
            .parse_content(
                "Código;Especificação;Prev. Inicial;Prev. Atualizada;Arrec. Período;Arrec. Total\n\
                 1112.50;IPTU;1.000,00;1.200,50;100,00;950,25",
            )
            .unwrap();
        let rows = executed_revenues(&table);

        assert_eq!(rows[0].updated_forecast, 1200.5);
        assert_eq!(rows[0].total_collected, 950.25);
        assert_eq!(rows[0].description, "IPTU");
    }

    #[test]
    fn test_map_executed_expenses() {
        let table = CsvParser::new()
            .parse_content(
                "Empenho;Data;Função;Nome da Função;Nome Fornecedor;Dotação Atual;Empenhado até Hoje;Pago até Hoje\n\
                 12/2025;15/03/2025;10;Saúde;ACME LTDA;10.000,00;5.000,00;4.000,00\n\
                 13/2025;invalid;12;Educação;BETA SA;0;1,00;",
            )
            .unwrap();
        let rows = executed_expenses(&table);

        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2025, 3, 15));
        assert_eq!(rows[0].current_appropriation, 10000.0);
        assert_eq!(rows[0].paid_to_date, 4000.0);
        assert_eq!(rows[1].date, None);
        assert_eq!(rows[1].paid_to_date, 0.0);
        // absent column
        assert_eq!(rows[0].liquidated_to_date, 0.0);
    }
}
