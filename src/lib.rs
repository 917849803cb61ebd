pub mod adapter;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod fragment;
pub mod parser;
pub mod readiness;
pub mod record;

pub use adapter::AdapterKind;
pub use config::Settings;
pub use error::ExtractError;
pub use extract::{classify_page, extract_page, extract_when_ready};
pub use record::{ErrorRecord, Extraction, StatRecord};
