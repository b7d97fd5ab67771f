use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    pub name: String,
    pub vendor: VendorSource,
    pub inventory: InventorySource,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Sources + column mappings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct VendorSource {
    pub file: String,
    pub columns: VendorColumns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VendorColumns {
    pub sku: String,
    pub upc: String,
    pub cost: String,
    pub retail: String,
    pub description: String,
    pub weight: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventorySource {
    pub file: String,
    pub columns: InventoryColumns,
}

/// Column mapping for the inventory snapshot export.
///
/// `alt_skus` lists the alternate-SKU columns in slot order; its length fixes
/// the slot capacity for every record in the snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryColumns {
    pub item_number: String,
    pub upc: String,
    pub cost: String,
    pub list_price: String,
    pub weight: String,
    pub group: String,
    pub alt_skus: Vec<String>,
}

// ---------------------------------------------------------------------------
// Policy + Retry + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Inclusive ratio threshold for cost/price anomalies.
    #[serde(default = "default_anomaly_ratio")]
    pub anomaly_ratio: Decimal,
    /// Gap-filling value for records with no group.
    #[serde(default = "default_group")]
    pub default_group: String,
}

fn default_anomaly_ratio() -> Decimal {
    Decimal::TWO
}

fn default_group() -> String {
    "Z".into()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            anomaly_ratio: default_anomaly_ratio(),
            default_group: default_group(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Attempts per lookup/write before the record is demoted to review.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Base backoff between attempts, doubled per retry.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    50
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
    /// Directory for per-reason review queue files.
    #[serde(default)]
    pub review_dir: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl EngineConfig {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.policy.anomaly_ratio < Decimal::ONE {
            return Err(EngineError::ConfigValidation(format!(
                "policy.anomaly_ratio must be >= 1, got {}",
                self.policy.anomaly_ratio
            )));
        }

        if self.policy.default_group.trim().is_empty() {
            return Err(EngineError::ConfigValidation(
                "policy.default_group must not be empty".into(),
            ));
        }

        if self.inventory.columns.alt_skus.is_empty() {
            return Err(EngineError::ConfigValidation(
                "inventory.columns.alt_skus must name at least one slot column".into(),
            ));
        }

        if self.retry.attempts == 0 {
            return Err(EngineError::ConfigValidation(
                "retry.attempts must be >= 1".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
