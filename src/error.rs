use thiserror::Error;

/// Failures that abort an extraction. Content oddities inside a fragment never
/// end up here; they degrade to defaults in the field parsers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Content failed to load after {attempts} attempts")]
    ReadinessTimeout { attempts: u32 },

    #[error("Missing source data: {0}")]
    MissingSourceData(String),

    #[error("Unrecognized data schema: {0}")]
    UnrecognizedSchema(String),

    #[error("Parse failure: {0}")]
    ParseFailure(String),
}

impl ExtractError {
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ExtractError::ReadinessTimeout { .. } | ExtractError::MissingSourceData(_) => {
                Some("Make sure you're on a creature page and it has fully loaded.")
            }
            ExtractError::UnrecognizedSchema(_) => {
                Some("The page carries embedded data, but not in a known stat-block layout.")
            }
            ExtractError::ParseFailure(_) => None,
        }
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(e: serde_json::Error) -> Self {
        ExtractError::ParseFailure(format!("invalid embedded JSON: {}", e))
    }
}
