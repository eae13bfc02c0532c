use std::fmt;

/// Outcome of ingesting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStatus {
    /// No row existed for the article's keys.
    Added,
    /// A row existed with a different content hash and was replaced.
    Updated,
    /// The stored content hash matched; nothing was written.
    Unchanged,
    Failed(String),
}

impl UploadStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Updated => f.write_str("updated"),
            Self::Unchanged => f.write_str("unchanged"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}
