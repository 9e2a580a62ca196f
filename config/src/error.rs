use serde::Serialize;
use thiserror::Error;

use std::fmt;
use std::path::PathBuf;

use crate::SourceTool;

/// failure taxonomy of a batch run; everything except `Io` is scoped to a
/// single source tool or model
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("{tool}: malformed row {line}: {reason}")]
    RowParse {
        tool: SourceTool,
        line: usize,
        reason: String,
    },
    #[error("{tool}: schema mismatch in {path:?}: {reason}")]
    SchemaMismatch {
        tool: SourceTool,
        path: PathBuf,
        reason: String,
    },
    #[error("{0}: no usable rows")]
    EmptyInput(SourceTool),
    #[error("model {0}: no strictly positive scores, threshold undefined")]
    UndefinedThreshold(String),
    #[error("{tool}: missing required file {path:?}")]
    MissingRequiredFile { tool: SourceTool, path: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorClass {
    RowParseError,
    SchemaMismatch,
    EmptyInput,
    UndefinedThreshold,
    MissingRequiredFile,
    Io,
}

impl AnnotationError {
    pub fn class(&self) -> ErrorClass {
        match self {
            AnnotationError::RowParse { .. } => ErrorClass::RowParseError,
            AnnotationError::SchemaMismatch { .. } => ErrorClass::SchemaMismatch,
            AnnotationError::EmptyInput(_) => ErrorClass::EmptyInput,
            AnnotationError::UndefinedThreshold(_) => ErrorClass::UndefinedThreshold,
            AnnotationError::MissingRequiredFile { .. } => ErrorClass::MissingRequiredFile,
            AnnotationError::Io(_) => ErrorClass::Io,
        }
    }
}

impl ErrorClass {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorClass::SchemaMismatch | ErrorClass::MissingRequiredFile | ErrorClass::Io
        )
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::RowParseError => "RowParseError",
            ErrorClass::SchemaMismatch => "SchemaMismatch",
            ErrorClass::EmptyInput => "EmptyInput",
            ErrorClass::UndefinedThreshold => "UndefinedThreshold",
            ErrorClass::MissingRequiredFile => "MissingRequiredFile",
            ErrorClass::Io => "Io",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let err = AnnotationError::RowParse {
            tool: SourceTool::InterProScan,
            line: 7,
            reason: "bad score".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::RowParseError);
        assert!(!err.class().is_fatal());

        let err = AnnotationError::MissingRequiredFile {
            tool: SourceTool::KofamScan,
            path: PathBuf::from("missing.tsv"),
        };
        assert_eq!(err.class(), ErrorClass::MissingRequiredFile);
        assert!(err.class().is_fatal());
        assert_eq!(
            AnnotationError::UndefinedThreshold("ESM-2".into()).to_string(),
            "model ESM-2: no strictly positive scores, threshold undefined"
        );
    }
}
