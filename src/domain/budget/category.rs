// ============================================================
// REVENUE CATEGORIES
// ============================================================
// Prefix tables and name catalogs that turn revenue codes into
// human-readable categories

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::RevenueCode;

/// Own-source tax revenue: property, income, services, fees
pub const TAX_PREFIXES: &[&str] = &["1112", "1113", "1114", "1121", "1122"];

/// Intergovernmental transfers
pub const TRANSFER_PREFIXES: &[&str] = &[
    "1711", "1712", "1713", "1714", "1716", "1721", "1722", "1723", "1724", "1751",
];

pub const UNION_TRANSFER_PREFIXES: &[&str] = &["1711", "1712", "1713", "1714", "1716", "1719"];
pub const STATE_TRANSFER_PREFIXES: &[&str] = &["1721", "1722", "1723", "1724", "1729"];
pub const FUNDEB_PREFIXES: &[&str] = &["1751"];

pub const SUS_PREFIXES: &[&str] = &["1713"];
pub const EDUCATION_PREFIXES: &[&str] = &["1714", "1751"];
pub const SOCIAL_ASSISTANCE_PREFIXES: &[&str] = &["1716"];

/// Top-level grouping used by the overview cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevenueGroup {
    Tax,
    Transfer,
    Other,
}

impl RevenueGroup {
    pub fn classify(code: &RevenueCode) -> Self {
        if code.has_any_prefix(TAX_PREFIXES) {
            RevenueGroup::Tax
        } else if code.has_any_prefix(TRANSFER_PREFIXES) {
            RevenueGroup::Transfer
        } else {
            RevenueGroup::Other
        }
    }
}

/// Origin of a transfer, evaluated over transfer rows only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferOrigin {
    Union,
    State,
    Fundeb,
}

impl TransferOrigin {
    pub const ALL: [TransferOrigin; 3] =
        [TransferOrigin::Union, TransferOrigin::State, TransferOrigin::Fundeb];

    pub fn prefixes(&self) -> &'static [&'static str] {
        match self {
            TransferOrigin::Union => UNION_TRANSFER_PREFIXES,
            TransferOrigin::State => STATE_TRANSFER_PREFIXES,
            TransferOrigin::Fundeb => FUNDEB_PREFIXES,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransferOrigin::Union => "União",
            TransferOrigin::State => "Estado",
            TransferOrigin::Fundeb => "FUNDEB",
        }
    }
}

/// Tax breakdown buckets. IPTU (`1112.5`) also covers ITBI (`1112.53`);
/// the buckets overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxKind {
    Iptu,
    Itbi,
    Irrf,
    Issqn,
    Fees,
}

impl TaxKind {
    pub const ALL: [TaxKind; 5] = [
        TaxKind::Iptu,
        TaxKind::Itbi,
        TaxKind::Irrf,
        TaxKind::Issqn,
        TaxKind::Fees,
    ];

    pub fn prefixes(&self) -> &'static [&'static str] {
        match self {
            TaxKind::Iptu => &["1112.5"],
            TaxKind::Itbi => &["1112.53"],
            TaxKind::Irrf => &["1113"],
            TaxKind::Issqn => &["1114"],
            TaxKind::Fees => &["1121", "1122"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaxKind::Iptu => "IPTU",
            TaxKind::Itbi => "ITBI",
            TaxKind::Irrf => "IRRF",
            TaxKind::Issqn => "ISSQN",
            TaxKind::Fees => "Taxas",
        }
    }
}

static PLANNED_CATALOG: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("1112", "Impostos sobre Patrimônio"),
        ("1113", "Impostos sobre Renda"),
        ("1114", "Impostos sobre Serviços"),
        ("1121", "Taxas pelo Poder de Polícia"),
        ("1122", "Taxas pelos Serviços"),
        ("1311", "Exploração do Patrimônio"),
        ("1321", "Remuneração de Depósitos"),
        ("1611", "Serviços Administrativos"),
        ("1711", "Transferências da União"),
        ("1712", "Transferências da União - Outras"),
        ("1713", "Transferências da União - SUS"),
        ("1714", "Transferências da União - Educação"),
        ("1716", "Transferências da União - Assistência"),
        ("1719", "Outras Transferências da União"),
        ("1721", "Transferências do Estado"),
        ("1722", "Transferências do Estado - Outras"),
        ("1723", "Transferências do Estado - SUS"),
        ("1724", "Transferências do Estado - Educação"),
        ("1729", "Outras Transferências do Estado"),
        ("1751", "FUNDEB"),
        ("1911", "Multas Administrativas"),
        ("1922", "Restituições"),
        ("1999", "Outras Receitas Correntes"),
        ("2213", "Alienação de Bens"),
    ])
});

static EXECUTION_CATALOG: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("1112", "Impostos s/ Patrimônio"),
        ("1113", "Impostos s/ Renda"),
        ("1114", "Impostos s/ Serviços"),
        ("1121", "Taxas Poder Polícia"),
        ("1122", "Taxas por Serviços"),
        ("1321", "Rendimentos Financeiros"),
        ("1335", "Concessões"),
        ("1399", "Outras Patrimoniais"),
        ("1699", "Outros Serviços"),
        ("1711", "Transferências União"),
        ("1712", "Compensações Financeiras"),
        ("1713", "SUS - União"),
        ("1714", "FNDE"),
        ("1715", "FUNDEB - União"),
        ("1716", "FNAS"),
        ("1719", "Outras - União"),
        ("1721", "Transferências Estado"),
        ("1722", "Royalties Estado"),
        ("1723", "SUS - Estado"),
        ("1724", "Convênios Estado"),
        ("1729", "Outras - Estado"),
        ("1751", "FUNDEB"),
        ("1911", "Multas"),
        ("1922", "Restituições"),
        ("1999", "Outras Correntes"),
        ("2422", "Transferências Capital"),
    ])
});

/// Name used on the planned-revenue (LOA) dashboard, with a generic
/// fallback for unknown keys
pub fn planned_category_name(key: &str) -> String {
    PLANNED_CATALOG
        .get(key)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("Código {}", key))
}

/// Name used on execution and reconciliation tables; None for keys the
/// catalog does not cover
pub fn execution_category_name(key: &str) -> Option<&'static str> {
    EXECUTION_CATALOG.get(key).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_groups() {
        assert_eq!(RevenueGroup::classify(&RevenueCode::new("1112.50.01")), RevenueGroup::Tax);
        assert_eq!(RevenueGroup::classify(&RevenueCode::new("1751.00.00")), RevenueGroup::Transfer);
        assert_eq!(RevenueGroup::classify(&RevenueCode::new("1719.99.00")), RevenueGroup::Other);
        assert_eq!(RevenueGroup::classify(&RevenueCode::new("1321.00")), RevenueGroup::Other);
    }

    #[test]
    fn test_iptu_covers_itbi() {
        let itbi = RevenueCode::new("1112.53.01");
        assert!(itbi.has_any_prefix(TaxKind::Iptu.prefixes()));
        assert!(itbi.has_any_prefix(TaxKind::Itbi.prefixes()));
    }

    #[test]
    fn test_catalog_lookups() {
        assert_eq!(planned_category_name("1751"), "FUNDEB");
        assert_eq!(planned_category_name("4321"), "Código 4321");
        assert_eq!(execution_category_name("1714"), Some("FNDE"));
        assert_eq!(execution_category_name("1311"), None);
    }
}
