/// Error types for station selection and series assembly
use chrono::NaiveDate;
use thiserror::Error;

/// Broad category of a pipeline failure, used for user messaging.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ErrorKind {
    /// The query itself is unusable: bad coordinates, radius, window or SRS.
    Configuration,
    /// The query was valid but produced nothing to show.
    NoData,
}

/// The pipeline stage that failed.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Stage {
    Config,
    Selection,
    Assembly,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Config => write!(f, "configuration"),
            Stage::Selection => write!(f, "selection"),
            Stage::Assembly => write!(f, "assembly"),
        }
    }
}

/// Main error type for the select -> assemble pipeline.
///
/// Every variant is terminal for the current run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Center coordinate is not a valid latitude/longitude pair
    #[error("configuration failed: invalid coordinate (latitude {latitude}, longitude {longitude})")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// Radius must be a finite, positive number of kilometres
    #[error("configuration failed: radius must be a positive number of km, got {0}")]
    InvalidRadius(f64),

    /// Date window is inverted
    #[error("configuration failed: date window ends ({end}) before it starts ({start})")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    /// No candidate could be considered for the radius test
    #[error("selection failed: no candidate stations found ({0})")]
    NoCandidatesFound(String),

    /// A spatial reference system could not be used
    #[error("selection failed: unusable spatial reference system {srs}: {reason}")]
    UnknownSrs { srs: String, reason: String },

    /// The radius test selected nothing
    #[error("selection failed: no station lies within {radius_km} km of ({latitude}, {longitude})")]
    NoneWithinRadius {
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    },

    /// Every station was excluded for lack of usable values
    #[error("assembly failed: none of the {excluded} station(s) has a usable observation in the requested window")]
    EmptyResultSet { excluded: usize },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::NoneWithinRadius { .. } | PipelineError::EmptyResultSet { .. } => {
                ErrorKind::NoData
            }
            _ => ErrorKind::Configuration,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::InvalidCoordinate { .. }
            | PipelineError::InvalidRadius(_)
            | PipelineError::InvalidWindow { .. } => Stage::Config,
            PipelineError::NoCandidatesFound(_)
            | PipelineError::UnknownSrs { .. }
            | PipelineError::NoneWithinRadius { .. } => Stage::Selection,
            PipelineError::EmptyResultSet { .. } => Stage::Assembly,
        }
    }
}

/// Type alias for Results using PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_stage() {
        let err = PipelineError::NoCandidatesFound("empty candidate list".to_string());
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.stage(), Stage::Selection);

        let err = PipelineError::EmptyResultSet { excluded: 3 };
        assert_eq!(err.kind(), ErrorKind::NoData);
        assert_eq!(err.stage(), Stage::Assembly);

        let err = PipelineError::NoneWithinRadius {
            latitude: 38.5,
            longitude: -121.5,
            radius_km: 10.0,
        };
        assert_eq!(err.kind(), ErrorKind::NoData);
        assert_eq!(err.stage(), Stage::Selection);
    }

    #[test]
    fn test_messages_name_the_stage() {
        let err = PipelineError::NoCandidatesFound("empty candidate list".to_string());
        assert!(err.to_string().starts_with("selection failed"));
        let err = PipelineError::EmptyResultSet { excluded: 2 };
        assert!(err.to_string().starts_with("assembly failed"));
        let err = PipelineError::InvalidRadius(-1.0);
        assert!(err.to_string().starts_with("configuration failed"));
    }
}
