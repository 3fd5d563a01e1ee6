use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// The mission stage a collaborator failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CvAnalysis,
    Reconnaissance,
    Enrichment,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::CvAnalysis => "CV analysis",
            Stage::Reconnaissance => "reconnaissance",
            Stage::Enrichment => "AI enrichment",
        })
    }
}

#[derive(Error, Debug)]
pub enum SpyError {
    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("malformed {stage} response: {message}")]
    MalformedResponse { stage: Stage, message: String },

    #[error("{stage} failed: {message}")]
    Acquisition { stage: Stage, message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("failed to write report to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SpyError {
    pub fn missing(what: impl Into<String>) -> Self {
        SpyError::MissingInput(what.into())
    }

    pub fn malformed(stage: Stage, message: impl Into<String>) -> Self {
        SpyError::MalformedResponse {
            stage,
            message: message.into(),
        }
    }

    pub fn acquisition(stage: Stage, message: impl Into<String>) -> Self {
        SpyError::Acquisition {
            stage,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        SpyError::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SpyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_stage() {
        let err = SpyError::acquisition(Stage::Reconnaissance, "timed out");
        assert_eq!(err.to_string(), "reconnaissance failed: timed out");

        let err = SpyError::malformed(Stage::Enrichment, "missing field `work_pace`");
        assert_eq!(
            err.to_string(),
            "malformed AI enrichment response: missing field `work_pace`"
        );

        let err = SpyError::missing("no candidate profile");
        assert_eq!(err.to_string(), "missing input: no candidate profile");
    }
}
