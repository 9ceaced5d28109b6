// ============================================================
// BUDGET DOMAIN LAYER
// ============================================================
// Revenue codes, categories, typed records and dashboard settings

mod category;
mod dashboard_config;
mod records;
mod revenue_code;

pub use category::{
    execution_category_name, planned_category_name, RevenueGroup, TaxKind, TransferOrigin,
    EDUCATION_PREFIXES, SOCIAL_ASSISTANCE_PREFIXES, SUS_PREFIXES,
};
pub use dashboard_config::DashboardConfig;
pub use records::{ExecutedExpense, ExecutedRevenue, PlannedRevenue, StructureEntry};
pub use revenue_code::{RevenueCode, MAX_LEVEL};

/// Health function code (Saúde)
pub const FUNCTION_HEALTH: &str = "10";
/// Education function code (Educação)
pub const FUNCTION_EDUCATION: &str = "12";
/// Social assistance function code (Assistência Social)
pub const FUNCTION_SOCIAL_ASSISTANCE: &str = "08";
