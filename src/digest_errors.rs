use thiserror::Error;

/// Reason why a tracklet cannot be scored.
///
/// These are input-level rejections: they are reported for the offending tracklet only and
/// never abort a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Fewer than two observations.
    SingleObservation,
    /// An observation has a non-finite time, right ascension or declination.
    NonFiniteValue,
    /// An observation is earlier than the one preceding it.
    NonMonotonicTime,
    /// First and last observations share the same time.
    NoTimeSpan,
    /// First and last observations share the same position.
    NoMotion,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Rejection::SingleObservation => "single observation",
            Rejection::NonFiniteValue => "non-finite time or position",
            Rejection::NonMonotonicTime => "observations out of time order",
            Rejection::NoTimeSpan => "no time span between first and last observation",
            Rejection::NoMotion => "no motion between first and last observation",
        };
        f.write_str(msg)
    }
}

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("Tracklet {designation} is not scorable: {reason}")]
    NotScorable {
        designation: String,
        reason: Rejection,
    },

    #[error("Invalid observatory code: {0}")]
    InvalidObsCode(String),

    #[error("Site index out of range: {0}")]
    SiteIndexOutOfRange(usize),

    #[error("Unknown orbit class abbreviation: {0}")]
    UnknownOrbitClass(String),

    #[error("Invalid configuration parameter: {0}")]
    InvalidParameter(String),

    #[error("Population model has the wrong shape: {0}")]
    InvalidModelShape(String),

    #[error("Invalid population model header: {0}")]
    InvalidModelHeader(String),

    #[error("Invalid population model record at line {line}: {reason}")]
    InvalidModelRecord { line: u64, reason: String },

    #[error("UTF-8 Path error: {0}")]
    Utf8PathError(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl PartialEq for DigestError {
    fn eq(&self, other: &Self) -> bool {
        use DigestError::*;
        match (self, other) {
            (
                NotScorable {
                    designation: a,
                    reason: ra,
                },
                NotScorable {
                    designation: b,
                    reason: rb,
                },
            ) => a == b && ra == rb,
            (InvalidObsCode(a), InvalidObsCode(b)) => a == b,
            (SiteIndexOutOfRange(a), SiteIndexOutOfRange(b)) => a == b,
            (UnknownOrbitClass(a), UnknownOrbitClass(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (InvalidModelShape(a), InvalidModelShape(b)) => a == b,
            (InvalidModelHeader(a), InvalidModelHeader(b)) => a == b,
            (
                InvalidModelRecord {
                    line: la,
                    reason: ra,
                },
                InvalidModelRecord {
                    line: lb,
                    reason: rb,
                },
            ) => la == lb && ra == rb,
            (Utf8PathError(a), Utf8PathError(b)) => a == b,

            // Sources are not comparable: same variant means equal
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            _ => false,
        }
    }
}
