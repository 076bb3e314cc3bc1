use thiserror::Error;

/// Crate-wide error type.
///
/// Failures fall into three families: invalid survey configuration
/// (rejected at builder/table construction time), filesystem and record
/// serialization errors, and failures surfaced by the imaging backend.
/// Backend failures abort only the run that raised them; the survey driver
/// isolates them per row.
#[derive(Error, Debug)]
pub enum VisweepError {
    #[error("Invalid survey parameter: {0}")]
    InvalidSurveyParameter(String),

    #[error("Invalid averaging window (expected 'scan' or a duration in seconds): {0}")]
    InvalidAvgTime(String),

    #[error("Sweep axis '{0}' has no values")]
    EmptySweepAxis(&'static str),

    #[error("Unknown transform type (expected 'fast', 'nfft' or 'direct'): {0}")]
    InvalidTransformType(String),

    #[error("No measurements found on baseline {station_a}-{station_b}")]
    BaselineNotFound {
        station_a: String,
        station_b: String,
    },

    #[error("Imaging backend error: {0}")]
    Imaging(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV record error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Worker pool construction error: {0}")]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),
}

impl VisweepError {
    /// Wrap an arbitrary backend failure message.
    ///
    /// Convenience for [`ImagingBackend`](crate::imaging::ImagingBackend)
    /// implementations that surface library-specific error strings.
    pub fn imaging(msg: impl Into<String>) -> Self {
        VisweepError::Imaging(msg.into())
    }
}
