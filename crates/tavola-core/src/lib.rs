use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read venue list at {path}: {source}")]
    VenuesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse venue list: {0}")]
    VenuesFileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

mod app_config;
mod config;
mod outcome;
mod records;
mod venues;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use outcome::{RunOutcome, RunStatus, RunSummary};
pub use records::{CandidateRecord, ExtractedItem, GeoPoint, MatchKind, MatchResult, MenuLine, VenuePhoto};
pub use venues::{load_venue_list, VenueList};
