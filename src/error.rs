use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed document in {source_name}: {reason}")]
    Extraction { source_name: String, reason: String },

    #[error("Forecast failed for skill '{skill}': {reason}")]
    ForecastComputation { skill: String, reason: String },

    #[error("Failed to persist {target} chunk {chunk}: {reason}")]
    Persistence {
        target: String,
        chunk: usize,
        reason: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Fatal errors stop a run before anything touches the store.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_errors_are_fatal() {
        assert!(Error::Config("no data".to_string()).is_fatal());
        assert!(!Error::ForecastComputation {
            skill: "python".to_string(),
            reason: "zero variance".to_string(),
        }
        .is_fatal());
        assert!(!Error::Persistence {
            target: "trends".to_string(),
            chunk: 2,
            reason: "disk full".to_string(),
        }
        .is_fatal());
    }
}
