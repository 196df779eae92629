use serde::de;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, validating, rendering or decoding a message tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A numeric value does not fit the declared field width
    #[error("value {value:#x} does not fit in {width} byte(s) for field `{field}`")]
    ValueOutOfRange {
        field: String,
        value: u64,
        width: usize,
    },

    /// Text supplied for a string field is not valid UTF-8
    #[error("field `{field}` is not valid UTF-8 text: {reason}")]
    EncodingError { field: String, reason: String },

    /// A size field names a container that does not exist in the tree
    #[error("size field `{field}` in `{tree}` references unknown container `{target}`")]
    UnknownSizeTarget {
        tree: String,
        field: String,
        target: String,
    },

    /// A size field measures a container that encloses it
    #[error("size field `{field}` in `{tree}` measures its own ancestor `{target}`")]
    SizeCycle {
        tree: String,
        field: String,
        target: String,
    },

    /// Render reached a size field whose target was never measured
    #[error(
        "size field `{field}` in `{tree}` reached before container `{target}` was measured (engine defect)"
    )]
    UnresolvedSizeReference {
        tree: String,
        field: String,
        target: String,
    },

    /// The procedure token is not in the catalog
    #[error("unknown procedure `{0}`")]
    UnknownProcedure(String),

    /// Two nodes in the same tree share a name
    #[error("duplicate node name `{name}` in `{tree}`")]
    DuplicateName { tree: String, name: String },

    /// Data exceeded the declared maximum length
    #[error("`{field}` is {got} bytes, exceeding the {max}-byte limit")]
    LengthOverflow {
        field: String,
        max: usize,
        got: usize,
    },

    /// No leaf with this name exists in the tree
    #[error("no leaf named `{name}` in `{tree}`")]
    UnknownField { tree: String, name: String },

    /// The leaf exists but cannot take the supplied kind of value
    #[error("field `{field}` cannot take this value (expected {expected})")]
    KindMismatch {
        field: String,
        expected: &'static str,
    },

    /// The parameter override document was rejected
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// A custom error message from serde
    #[error("{0}")]
    Message(String),

    /// Attempted to read past the end of the input buffer
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A decoded string contained non-UTF-8 bytes
    #[error("string contains invalid bytes")]
    InvalidString,

    /// The boolean encoding was neither 0 nor 1
    #[error("invalid boolean encoding: {0} (must be 0 or 1)")]
    InvalidBool(u32),

    /// An optional value had an invalid discriminant (must be 0 or 1)
    #[error("invalid optional discriminant: {0} (must be 0 or 1)")]
    InvalidOption(u32),

    /// Padding bytes were non-zero
    #[error("non-zero padding bytes")]
    InvalidPadding,

    /// Input remained after the decoded value
    #[error("{0} trailing byte(s) after decoded value")]
    TrailingBytes(usize),

    /// The XDR decoder does not support this serde data model type
    #[error("XDR does not support type: {0}")]
    Unsupported(&'static str),

    /// An I/O error occurred during writing
    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// True when the error signals a bug in the engine rather than bad input.
    ///
    /// The caller should abort the current test case instead of skipping the
    /// procedure.
    pub fn is_engine_defect(&self) -> bool {
        matches!(self, Error::UnresolvedSizeReference { .. })
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidParameters(e.to_string())
    }
}
