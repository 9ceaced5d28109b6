// ============================================================
// LOA ANALYSIS USE CASE
// ============================================================
// Planned-revenue dashboard: composition, categories, taxes,
// transfers, detail filter and insights

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::dataset_loader::LoaData;
use super::detail_search::TextMatcher;
use super::indicator::{Indicator, LabeledAmount, Tone};
use crate::domain::budget::{
    planned_category_name, PlannedRevenue, RevenueGroup, StructureEntry, TaxKind,
    TransferOrigin, EDUCATION_PREFIXES, SOCIAL_ASSISTANCE_PREFIXES, SUS_PREFIXES,
};
use crate::domain::money::{cmp_desc, percentage};

pub const TOP_REVENUES: usize = 10;
pub const TOP_TRANSFERS: usize = 15;
pub const STRUCTURE_PREVIEW: usize = 20;

pub const NO_TAX_WARNING: &str = "Nenhuma receita tributária encontrada nos dados.";
pub const NO_TRANSFER_WARNING: &str = "Nenhuma transferência encontrada nos dados.";

/// Composition considered healthy for a small municipality (tax,
/// transfers, other), in percent
pub const IDEAL_COMPOSITION: [f64; 3] = [25.0, 60.0, 15.0];

#[derive(Debug, Clone, Serialize)]
pub struct LoaSummary {
    pub total: f64,
    pub tax: f64,
    pub transfers: f64,
    pub other: f64,
    pub tax_share: f64,
    pub transfer_share: f64,
    pub other_share: f64,
    pub planned_count: usize,
    pub structure_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueLine {
    pub code: String,
    pub name: String,
    pub value: f64,
}

impl From<&PlannedRevenue> for RevenueLine {
    fn from(row: &PlannedRevenue) -> Self {
        Self {
            code: row.code.to_string(),
            name: row.name.clone(),
            value: row.planned,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryShare {
    pub key: String,
    pub name: String,
    pub value: f64,
    pub share: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaxAnalysis {
    pub by_kind: Vec<LabeledAmount>,
    pub iptu_detail: Vec<RevenueLine>,
    pub rows: Vec<RevenueLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferAnalysis {
    pub by_origin: Vec<LabeledAmount>,
    pub top: Vec<RevenueLine>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaFilter {
    pub min_value: Option<f64>,
    pub query: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoaFilterResult {
    pub rows: Vec<RevenueLine>,
    pub count: usize,
    pub total: f64,
    pub max: f64,
    pub min: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompositionRow {
    pub label: String,
    pub ideal: f64,
    pub real: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoaInsights {
    pub dependence: Indicator,
    pub autonomy: Indicator,
    pub per_capita: f64,
    pub composition: Vec<CompositionRow>,
    pub complementary: Vec<LabeledAmount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectedCodes {
    pub tax: Vec<CategoryShare>,
    pub transfer: Vec<CategoryShare>,
    pub other: Vec<CategoryShare>,
}

impl DetectedCodes {
    pub fn total(&self) -> usize {
        self.tax.len() + self.transfer.len() + self.other.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StructureOverview {
    pub preview: Vec<StructureEntry>,
    /// (level, count), levels in ascending order
    pub level_counts: Vec<(String, usize)>,
    pub unique_keys: usize,
}

pub struct LoaAnalysis<'a> {
    planned: &'a [PlannedRevenue],
    structure: &'a [StructureEntry],
    population: u32,
}

impl<'a> LoaAnalysis<'a> {
    pub fn new(data: &'a LoaData, population: u32) -> Self {
        Self::from_rows(&data.planned, &data.structure, population)
    }

    pub fn from_rows(
        planned: &'a [PlannedRevenue],
        structure: &'a [StructureEntry],
        population: u32,
    ) -> Self {
        Self {
            planned,
            structure,
            population,
        }
    }

    fn sum_group(&self, group: RevenueGroup) -> f64 {
        self.planned
            .iter()
            .filter(|r| r.group() == group)
            .map(|r| r.planned)
            .sum()
    }

    pub fn summary(&self) -> LoaSummary {
        let total: f64 = self.planned.iter().map(|r| r.planned).sum();
        let tax = self.sum_group(RevenueGroup::Tax);
        let transfers = self.sum_group(RevenueGroup::Transfer);
        let other = total - tax - transfers;

        LoaSummary {
            total,
            tax,
            transfers,
            other,
            tax_share: percentage(tax, total),
            transfer_share: percentage(transfers, total),
            other_share: percentage(other, total),
            planned_count: self.planned.len(),
            structure_count: self.structure.len(),
        }
    }

    pub fn top_revenues(&self) -> Vec<RevenueLine> {
        top_by_value(self.planned.iter(), TOP_REVENUES)
    }

    /// Totals per category key, largest first
    pub fn category_breakdown(&self) -> Vec<CategoryShare> {
        let total: f64 = self.planned.iter().map(|r| r.planned).sum();
        let mut grouped: BTreeMap<String, f64> = BTreeMap::new();
        for row in self.planned {
            *grouped.entry(row.code.category_key()).or_default() += row.planned;
        }

        let mut rows: Vec<CategoryShare> = grouped
            .into_iter()
            .map(|(key, value)| CategoryShare {
                name: planned_category_name(&key),
                share: percentage(value, total),
                key,
                value,
            })
            .collect();
        rows.sort_by(|a, b| cmp_desc(a.value, b.value));
        rows
    }

    /// Totals per raw code prefix of hierarchy `level`, largest first
    pub fn level_breakdown(&self, level: usize) -> Vec<LabeledAmount> {
        let mut grouped: BTreeMap<String, f64> = BTreeMap::new();
        for row in self.planned {
            *grouped.entry(row.code.level_prefix(level)).or_default() += row.planned;
        }

        let mut rows: Vec<LabeledAmount> = grouped
            .into_iter()
            .map(|(prefix, value)| LabeledAmount::new(prefix, value))
            .collect();
        rows.sort_by(|a, b| cmp_desc(a.value, b.value));
        rows
    }

    /// None when the LOA holds no tax revenue
    pub fn tax_analysis(&self) -> Option<TaxAnalysis> {
        let taxes: Vec<&PlannedRevenue> = self
            .planned
            .iter()
            .filter(|r| r.group() == RevenueGroup::Tax)
            .collect();
        if taxes.is_empty() {
            return None;
        }

        let by_kind = TaxKind::ALL
            .iter()
            .map(|kind| {
                let value = taxes
                    .iter()
                    .filter(|r| r.code.has_any_prefix(kind.prefixes()))
                    .map(|r| r.planned)
                    .sum();
                LabeledAmount::new(kind.label(), value)
            })
            .collect();

        let iptu_detail = taxes
            .iter()
            .filter(|r| r.code.has_any_prefix(TaxKind::Iptu.prefixes()))
            .map(|r| RevenueLine::from(*r))
            .collect();

        Some(TaxAnalysis {
            by_kind,
            iptu_detail,
            rows: taxes.iter().map(|r| RevenueLine::from(*r)).collect(),
        })
    }

    /// None when the LOA holds no transfers
    pub fn transfer_analysis(&self) -> Option<TransferAnalysis> {
        let transfers: Vec<&PlannedRevenue> = self
            .planned
            .iter()
            .filter(|r| r.group() == RevenueGroup::Transfer)
            .collect();
        if transfers.is_empty() {
            return None;
        }

        let by_origin = TransferOrigin::ALL
            .iter()
            .map(|origin| {
                let value = transfers
                    .iter()
                    .filter(|r| r.code.has_any_prefix(origin.prefixes()))
                    .map(|r| r.planned)
                    .sum();
                LabeledAmount::new(origin.label(), value)
            })
            .collect();

        Some(TransferAnalysis {
            by_origin,
            top: top_by_value(transfers.into_iter(), TOP_TRANSFERS),
        })
    }

    pub fn filter(&self, filter: &LoaFilter) -> LoaFilterResult {
        let matcher = TextMatcher::new(filter.query.as_deref());
        let min = filter.min_value.unwrap_or(0.0);

        let rows: Vec<RevenueLine> = self
            .planned
            .iter()
            .filter(|r| min <= 0.0 || r.planned >= min)
            .filter(|r| matcher.matches(&r.name))
            .map(RevenueLine::from)
            .collect();

        let values = rows.iter().map(|r| r.value);
        let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
        let min = values.clone().fold(f64::INFINITY, f64::min);

        LoaFilterResult {
            count: rows.len(),
            total: values.sum(),
            max: if rows.is_empty() { 0.0 } else { max },
            min: if rows.is_empty() { 0.0 } else { min },
            rows,
        }
    }

    pub fn insights(&self) -> LoaInsights {
        let summary = self.summary();

        let dependence = summary.transfer_share;
        let (dep_tone, dep_status) = if dependence > 70.0 {
            (Tone::Poor, "Alta dependência")
        } else if dependence > 50.0 {
            (Tone::Moderate, "Dependência moderada")
        } else {
            (Tone::Good, "Baixa dependência")
        };

        let autonomy = summary.tax_share;
        let (aut_tone, aut_status) = if autonomy > 30.0 {
            (Tone::Good, "Boa autonomia")
        } else if autonomy > 15.0 {
            (Tone::Moderate, "Autonomia moderada")
        } else {
            (Tone::Poor, "Baixa autonomia")
        };

        let real = [summary.tax_share, summary.transfer_share, summary.other_share];
        let composition = ["Tributárias", "Transferências", "Outras"]
            .iter()
            .zip(IDEAL_COMPOSITION.iter().zip(real.iter()))
            .map(|(label, (ideal, real))| CompositionRow {
                label: label.to_string(),
                ideal: *ideal,
                real: *real,
            })
            .collect();

        let sum_prefixes = |prefixes: &[&str]| -> f64 {
            self.planned
                .iter()
                .filter(|r| r.code.has_any_prefix(prefixes))
                .map(|r| r.planned)
                .sum()
        };

        LoaInsights {
            dependence: Indicator::new(
                "Dependência de Transferências",
                dependence,
                dep_tone,
                dep_status,
            ),
            autonomy: Indicator::new("Autonomia Fiscal", autonomy, aut_tone, aut_status),
            per_capita: per_capita(summary.total, self.population),
            composition,
            complementary: vec![
                LabeledAmount::new("Recursos SUS", sum_prefixes(SUS_PREFIXES)),
                LabeledAmount::new("Recursos Educação", sum_prefixes(EDUCATION_PREFIXES)),
                LabeledAmount::new("Assistência Social", sum_prefixes(SOCIAL_ASSISTANCE_PREFIXES)),
            ],
        }
    }

    /// Sorted unique category keys, split by revenue group
    pub fn detected_codes(&self) -> DetectedCodes {
        let mut grouped: BTreeMap<String, (RevenueGroup, f64)> = BTreeMap::new();
        for row in self.planned.iter().filter(|r| !r.code.is_empty()) {
            let entry = grouped
                .entry(row.code.category_key())
                .or_insert((row.group(), 0.0));
            entry.1 += row.planned;
        }

        let total: f64 = self.planned.iter().map(|r| r.planned).sum();
        let mut detected = DetectedCodes {
            tax: Vec::new(),
            transfer: Vec::new(),
            other: Vec::new(),
        };

        for (key, (group, value)) in grouped {
            let share = CategoryShare {
                name: planned_category_name(&key),
                share: percentage(value, total),
                key,
                value,
            };
            match group {
                RevenueGroup::Tax => detected.tax.push(share),
                RevenueGroup::Transfer => detected.transfer.push(share),
                RevenueGroup::Other => detected.other.push(share),
            }
        }
        detected
    }

    pub fn structure_overview(&self) -> StructureOverview {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in self.structure {
            let level = entry.level.trim();
            if !level.is_empty() {
                *counts.entry(level).or_default() += 1;
            }
        }

        let mut level_counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(level, count)| (level.to_string(), count))
            .collect();
        level_counts.sort_by(|a, b| level_order(&a.0, &b.0));

        let mut keys: Vec<String> = self
            .structure
            .iter()
            .filter(|e| !e.code.is_empty())
            .map(|e| e.code.category_key())
            .collect();
        keys.sort();
        keys.dedup();

        StructureOverview {
            preview: self.structure.iter().take(STRUCTURE_PREVIEW).cloned().collect(),
            level_counts,
            unique_keys: keys.len(),
        }
    }
}

pub fn per_capita(value: f64, population: u32) -> f64 {
    if population == 0 {
        0.0
    } else {
        value / population as f64
    }
}

fn top_by_value<'r>(rows: impl Iterator<Item = &'r PlannedRevenue>, n: usize) -> Vec<RevenueLine> {
    let mut sorted: Vec<&PlannedRevenue> = rows.collect();
    sorted.sort_by(|a, b| cmp_desc(a.planned, b.planned));
    sorted.into_iter().take(n).map(RevenueLine::from).collect()
}

/// Numeric levels sort numerically, anything else lexicographically after
fn level_order(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        _ => a.cmp(b),
    }
}
