//! Sorting errors.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

/// Sorting error. Every variant is terminal for the run.
#[derive(Debug)]
pub enum SortError {
    /// Memory budget is zero or too small to hold any line data.
    InvalidBudget { budget: u64, reason: &'static str },
    /// Temporary directory creation error.
    TempDir(io::Error),
    /// Input stream error: missing or unreadable file, or a failed read.
    InputRead { path: Option<PathBuf>, source: io::Error },
    /// Partition file creation or writing error.
    PartitionWrite { path: PathBuf, source: io::Error },
    /// Partition file reading error during the merge pass.
    MergeRead { path: PathBuf, source: io::Error },
    /// Output writing error during the merge pass.
    MergeWrite { path: Option<PathBuf>, source: io::Error },
}

impl SortError {
    /// Attaches the input path to an input error that was raised without one.
    pub(crate) fn at_input(self, input: &Path) -> Self {
        match self {
            SortError::InputRead { path: None, source } => SortError::InputRead {
                path: Some(input.to_path_buf()),
                source,
            },
            err => err,
        }
    }

    /// Attaches the output path to an output error that was raised without one.
    pub(crate) fn at_output(self, output: &Path) -> Self {
        match self {
            SortError::MergeWrite { path: None, source } => SortError::MergeWrite {
                path: Some(output.to_path_buf()),
                source,
            },
            err => err,
        }
    }
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            SortError::InvalidBudget { .. } => None,
            SortError::TempDir(err) => Some(err),
            SortError::InputRead { source, .. } => Some(source),
            SortError::PartitionWrite { source, .. } => Some(source),
            SortError::MergeRead { source, .. } => Some(source),
            SortError::MergeWrite { source, .. } => Some(source),
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::InvalidBudget { budget, reason } => {
                write!(f, "invalid memory budget of {} bytes: {}", budget, reason)
            }
            SortError::TempDir(err) => write!(f, "temporary directory not created: {}", err),
            SortError::InputRead { path: Some(path), source } => {
                write!(f, "partition pass: input {} read failed: {}", path.display(), source)
            }
            SortError::InputRead { path: None, source } => {
                write!(f, "partition pass: input stream read failed: {}", source)
            }
            SortError::PartitionWrite { path, source } => {
                write!(f, "partition pass: partition {} write failed: {}", path.display(), source)
            }
            SortError::MergeRead { path, source } => {
                write!(f, "merge pass: partition {} read failed: {}", path.display(), source)
            }
            SortError::MergeWrite { path: Some(path), source } => {
                write!(f, "merge pass: output {} write failed: {}", path.display(), source)
            }
            SortError::MergeWrite { path: None, source } => {
                write!(f, "merge pass: output stream write failed: {}", source)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::io::{self, ErrorKind};
    use std::path::Path;

    use super::SortError;

    #[test]
    fn test_display_names_phase_and_path() {
        let err = SortError::MergeRead {
            path: Path::new("/tmp/x/sort.tmp.part3.txt").to_path_buf(),
            source: io::Error::new(ErrorKind::Other, "boom"),
        };
        assert_eq!(
            err.to_string(),
            "merge pass: partition /tmp/x/sort.tmp.part3.txt read failed: boom"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_path_attachment() {
        let err = SortError::InputRead {
            path: None,
            source: io::Error::new(ErrorKind::Other, "device lost"),
        }
        .at_input(Path::new("input.txt"));
        assert_eq!(err.to_string(), "partition pass: input input.txt read failed: device lost");

        let err = SortError::MergeWrite {
            path: None,
            source: io::Error::new(ErrorKind::Other, "disk full"),
        }
        .at_output(Path::new("output.txt"));
        assert_eq!(err.to_string(), "merge pass: output output.txt write failed: disk full");

        // other phases are left untouched
        let err = SortError::TempDir(io::Error::new(ErrorKind::Other, "nope")).at_output(Path::new("output.txt"));
        assert!(matches!(err, SortError::TempDir(_)));
    }

    #[test]
    fn test_invalid_budget_has_no_source() {
        let err = SortError::InvalidBudget {
            budget: 0,
            reason: "must be positive",
        };
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "invalid memory budget of 0 bytes: must be positive");
    }
}
