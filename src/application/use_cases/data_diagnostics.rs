// ============================================================
// DATA DIAGNOSTICS USE CASE
// ============================================================
// Sanity report over the raw executed-revenue and LOA exports

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::dataset_loader::DatasetLoader;
use super::insights::{compare_to_loa, LoaComparison};
use crate::domain::csv::CsvTable;
use crate::domain::error::Result;
use crate::domain::money::{cmp_desc, parse_currency, parse_plain_number, percentage};
use crate::infrastructure::csv::record_mapper::{planned, revenue};

pub const SAMPLE_SIZE: usize = 10;
pub const SUSPICIOUS_SAMPLE_SIZE: usize = 5;
pub const HIGH_VALUE: f64 = 1_000_000.0;
pub const TOP_CATEGORIES: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct ValueChecks {
    /// Rows where the column is absent
    pub missing: usize,
    pub blank: usize,
    pub zero: usize,
    pub negative: usize,
    pub above_one_million: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryDiagnostic {
    pub key: String,
    pub collected: f64,
    pub execution_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataDiagnostics {
    pub revenue_rows: usize,
    pub loa_rows: usize,
    pub revenue_columns: Vec<String>,
    pub loa_columns: Vec<String>,
    pub revenue_encoding: String,
    pub loa_encoding: String,
    /// Arrec. Total read as plain numbers, without Brazilian parsing
    pub raw_collected: f64,
    pub forecast: f64,
    pub collected: f64,
    pub loa_total: f64,
    pub checks: ValueChecks,
    /// First raw Arrec. Total values with their parsed amounts
    pub samples: Vec<(String, f64)>,
    pub duplicate_rows: usize,
    pub duplicate_codes: usize,
    pub top_categories: Vec<CategoryDiagnostic>,
    pub execution_vs_loa_pct: f64,
    pub loa_difference: f64,
    pub significant_difference: bool,
    pub suspicious_values: usize,
    pub suspicious_samples: Vec<String>,
}

impl DataDiagnostics {
    /// Read both exports through `loader` and diagnose them
    pub fn run(loader: &DatasetLoader) -> Result<Self> {
        let config = loader.config();
        let revenues = loader.load_table(&config.executed_revenue_path())?;
        let loa = loader.load_table(&config.planned_revenue_path())?;
        Ok(Self::compute(&revenues, &loa))
    }

    pub fn compute(revenues: &CsvTable, loa: &CsvTable) -> Self {
        let collected_raw: Vec<Option<&str>> = revenues
            .rows
            .iter()
            .map(|r| r.get_opt(revenue::TOTAL_COLLECTED))
            .collect();
        let collected_values: Vec<f64> = collected_raw
            .iter()
            .map(|v| v.map(parse_currency).unwrap_or(0.0))
            .collect();

        let forecast: f64 = revenues
            .column(revenue::UPDATED_FORECAST)
            .into_iter()
            .map(parse_currency)
            .sum();
        let collected: f64 = collected_values.iter().sum();
        let loa_total: f64 = loa
            .column(planned::VALUE)
            .into_iter()
            .map(parse_plain_number)
            .sum();

        let checks = ValueChecks {
            missing: collected_raw.iter().filter(|v| v.is_none()).count(),
            blank: collected_raw
                .iter()
                .filter(|v| matches!(v, Some(s) if s.trim().is_empty()))
                .count(),
            zero: collected_raw
                .iter()
                .zip(&collected_values)
                .filter(|(raw, value)| matches!(raw, Some(s) if !s.trim().is_empty()) && **value == 0.0)
                .count(),
            negative: collected_values.iter().filter(|v| **v < 0.0).count(),
            above_one_million: collected_values.iter().filter(|v| **v > HIGH_VALUE).count(),
        };

        let samples = collected_raw
            .iter()
            .zip(&collected_values)
            .take(SAMPLE_SIZE)
            .map(|(raw, value)| (raw.unwrap_or("").to_string(), *value))
            .collect();

        let suspicious: Vec<&str> = collected_raw
            .iter()
            .flatten()
            .copied()
            .filter(|s| !s.trim().is_empty() && !is_plain_digits(s))
            .collect();

        let difference = collected - loa_total;

        Self {
            revenue_rows: revenues.len(),
            loa_rows: loa.len(),
            revenue_columns: revenues.headers.clone(),
            loa_columns: loa.headers.clone(),
            revenue_encoding: revenues.encoding.clone(),
            loa_encoding: loa.encoding.clone(),
            raw_collected: collected_raw
                .iter()
                .map(|v| v.map(parse_plain_number).unwrap_or(0.0))
                .sum(),
            forecast,
            collected,
            loa_total,
            checks,
            samples,
            duplicate_rows: duplicate_rows(revenues),
            duplicate_codes: duplicates(revenues.column(revenue::CODE).into_iter()),
            top_categories: top_categories(revenues),
            execution_vs_loa_pct: percentage(collected, loa_total),
            loa_difference: difference,
            significant_difference: compare_to_loa(collected, loa_total) != LoaComparison::Near,
            suspicious_values: suspicious.len(),
            suspicious_samples: suspicious
                .iter()
                .take(SUSPICIOUS_SAMPLE_SIZE)
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Digits once thousands and decimal separators are removed
fn is_plain_digits(value: &str) -> bool {
    let stripped: String = value.trim().chars().filter(|c| *c != '.' && *c != ',').collect();
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
}

/// Occurrences beyond the first of each value
fn duplicates<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    let mut seen = HashSet::new();
    values.filter(|v| !seen.insert(*v)).count()
}

fn duplicate_rows(table: &CsvTable) -> usize {
    let joined: Vec<String> = table
        .rows
        .iter()
        .map(|row| {
            row.fields
                .iter()
                .map(|f| f.value.as_str())
                .collect::<Vec<_>>()
                .join("\u{1f}")
        })
        .collect();
    duplicates(joined.iter().map(String::as_str))
}

fn top_categories(revenues: &CsvTable) -> Vec<CategoryDiagnostic> {
    let mut grouped: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for row in &revenues.rows {
        let key: String = row.get(revenue::CODE).trim().chars().take(4).collect();
        let entry = grouped.entry(key).or_default();
        entry.0 += parse_currency(row.get(revenue::UPDATED_FORECAST));
        entry.1 += parse_currency(row.get(revenue::TOTAL_COLLECTED));
    }

    let mut rows: Vec<CategoryDiagnostic> = grouped
        .into_iter()
        .map(|(key, (forecast, collected))| CategoryDiagnostic {
            key,
            collected,
            execution_pct: percentage(collected, forecast),
        })
        .collect();
    rows.sort_by(|a, b| cmp_desc(a.collected, b.collected));
    rows.truncate(TOP_CATEGORIES);
    rows
}
