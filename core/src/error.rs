use std::fmt::Display;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Non-object passed where an object is required.
    InvalidArgument(String),
    /// Custom hook returned a value of the wrong shape.
    HookContractViolation {
        type_name: String,
        hook: &'static str,
    },
    /// (path, expected, found)
    StructuralMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Malformed mapping directive.
    Mapping { path: String, reason: String },
    /// (max depth)
    DepthLimitExceeded(usize),
    EncodingFailure(String),
    DecodingFailure(String),
    UnknownField {
        type_name: &'static str,
        field: String,
    },
}

impl Error {
    pub fn mismatch(expected: &'static str, found: &'static str) -> Self {
        Self::StructuralMismatch {
            path: Default::default(),
            expected,
            found,
        }
    }

    /// Attaches document path to errors that were raised without one.
    pub fn at(self, at: &str) -> Self {
        match self {
            Self::StructuralMismatch {
                path,
                expected,
                found,
            } if path.is_empty() => Self::StructuralMismatch {
                path: at.to_owned(),
                expected,
                found,
            },
            Self::Mapping { path, reason } if path.is_empty() => Self::Mapping {
                path: at.to_owned(),
                reason,
            },
            error => error,
        }
    }
}

impl Display for Error {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(formatter, "invalid argument: {}", msg),
            Error::HookContractViolation { type_name, hook } => write!(
                formatter,
                "{} hook of `{}` must return a record or a sequence",
                hook, type_name
            ),
            Error::StructuralMismatch {
                path,
                expected,
                found,
            } => write!(
                formatter,
                "structural mismatch at `{}`: expected {}, found {}",
                path, expected, found
            ),
            Error::Mapping { path, reason } => {
                write!(formatter, "invalid mapping for `{}`: {}", path, reason)
            }
            Error::DepthLimitExceeded(depth) => {
                write!(formatter, "maximum depth of {} exceeded", depth)
            }
            Error::EncodingFailure(msg) => write!(formatter, "encoding failed: {}", msg),
            Error::DecodingFailure(msg) => write!(formatter, "decoding failed: {}", msg),
            Error::UnknownField { type_name, field } => {
                write!(formatter, "type `{}` has no field `{}`", type_name, field)
            }
        }
    }
}

impl std::error::Error for Error {}
