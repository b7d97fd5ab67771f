use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (missing column, bad threshold, etc.).
    ConfigValidation(String),
    /// UPC is empty or contains non-digit characters.
    InvalidUpc { vendor_sku: String, value: String },
    /// Anomaly ratio requested on a non-positive value.
    AnomalyCheck { field: String, value: String },
    /// Missing required column in input data.
    MissingColumn { source: String, column: String },
    /// Numeric field failed to parse or violated a positivity constraint.
    FieldParse { source: String, record_id: String, column: String, value: String },
    /// Inventory snapshot is unusable (batch-fatal).
    Snapshot(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InvalidUpc { vendor_sku, value } => {
                write!(f, "vendor '{vendor_sku}': invalid UPC '{value}'")
            }
            Self::AnomalyCheck { field, value } => {
                write!(f, "anomaly check on non-positive {field} '{value}'")
            }
            Self::MissingColumn { source, column } => {
                write!(f, "{source}: missing column '{column}'")
            }
            Self::FieldParse { source, record_id, column, value } => {
                write!(f, "{source}, record '{record_id}': cannot parse {column} '{value}'")
            }
            Self::Snapshot(msg) => write!(f, "inventory snapshot error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
