//! Error types for the scenario runner
//!
//! Errors fall into two disjoint families. Parse errors are raised while a
//! document is resolved into a [`Scenario`](crate::scenario::Scenario) and
//! prevent it from ever existing. Runtime errors are raised while a scenario
//! runs and are aggregated into [`RuntimeErrors`]. Assertion failures are
//! neither: they travel in a [`RunResult`](crate::result::RunResult) and go
//! to the reporter.

use std::fmt;
use std::io;
use thiserror::Error;

use crate::node::Position;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Classification used for "is-a" queries against an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // === Parse-time ===
    Parse,
    ExpectedMap,
    ExpectedScalar,
    ExpectedSequence,
    ExpectedInt,
    ExpectedBool,
    UnknownField,
    UnknownSpec,
    InvalidDuration,
    UnknownShell,

    // === Runtime ===
    Runtime,
    RequiredFixture,
    TimeoutExceeded,
    DeadlineExceeded,
    ExecFailed,

    // === Ambient ===
    Io,
    Yaml,
    Config,
    Failed,
}

impl ErrorKind {
    /// Whether this kind belongs to the parse-time family
    pub fn is_parse(self) -> bool {
        matches!(
            self,
            ErrorKind::Parse
                | ErrorKind::ExpectedMap
                | ErrorKind::ExpectedScalar
                | ErrorKind::ExpectedSequence
                | ErrorKind::ExpectedInt
                | ErrorKind::ExpectedBool
                | ErrorKind::UnknownField
                | ErrorKind::UnknownSpec
                | ErrorKind::InvalidDuration
                | ErrorKind::UnknownShell
        )
    }

    /// Whether this kind belongs to the runtime family
    pub fn is_runtime(self) -> bool {
        matches!(
            self,
            ErrorKind::Runtime
                | ErrorKind::RequiredFixture
                | ErrorKind::TimeoutExceeded
                | ErrorKind::DeadlineExceeded
                | ErrorKind::ExecFailed
        )
    }
}

/// Main error type for the scenario runner
#[derive(Error, Debug)]
pub enum Error {
    // === Document Shape Errors ===
    #[error("expected mapping at {0}")]
    ExpectedMap(Position),

    #[error("expected scalar at {0}")]
    ExpectedScalar(Position),

    #[error("expected sequence at {0}")]
    ExpectedSequence(Position),

    #[error("expected int value at {0}")]
    ExpectedInt(Position),

    #[error("expected bool value at {0}")]
    ExpectedBool(Position),

    #[error("unknown field '{field}' at {pos}")]
    UnknownField { field: String, pos: Position },

    #[error("failed to decode {pos}: {message}")]
    Decode { pos: Position, message: String },

    // === Resolution Errors ===
    #[error("no plugin could parse spec definition at {0}")]
    UnknownSpec(Position),

    #[error("invalid duration '{value}' at {pos}: {reason}")]
    InvalidDuration {
        value: String,
        pos: Position,
        reason: String,
    },

    #[error("unknown shell '{shell}' at {pos}")]
    UnknownShell { shell: String, pos: Position },

    #[error("failed to parse scenario '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: Box<Error>,
    },

    // === Runtime Errors ===
    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("runtime error: required fixture missing: {0}")]
    RequiredFixtureMissing(String),

    #[error("runtime error: timeout exceeded ({0})")]
    TimeoutExceeded(String),

    #[error("runtime error: context deadline exceeded")]
    DeadlineExceeded,

    #[error("runtime error: failed to execute '{command}': {message}")]
    ExecFailed { command: String, message: String },

    #[error("{0}")]
    Aggregate(RuntimeErrors),

    // === Run Summary ===
    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed { failed: usize, total: usize },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to open '{path}' for writing: {error}")]
    FileWrite { path: String, error: String },

    // === Serialization Errors ===
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Primary classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ExpectedMap(_) => ErrorKind::ExpectedMap,
            Error::ExpectedScalar(_) => ErrorKind::ExpectedScalar,
            Error::ExpectedSequence(_) => ErrorKind::ExpectedSequence,
            Error::ExpectedInt(_) => ErrorKind::ExpectedInt,
            Error::ExpectedBool(_) => ErrorKind::ExpectedBool,
            Error::UnknownField { .. } => ErrorKind::UnknownField,
            Error::Decode { .. } | Error::Parse { .. } => ErrorKind::Parse,
            Error::UnknownSpec(_) => ErrorKind::UnknownSpec,
            Error::InvalidDuration { .. } => ErrorKind::InvalidDuration,
            Error::UnknownShell { .. } => ErrorKind::UnknownShell,
            Error::Runtime(_) | Error::Aggregate(_) => ErrorKind::Runtime,
            Error::RequiredFixtureMissing(_) => ErrorKind::RequiredFixture,
            Error::TimeoutExceeded(_) => ErrorKind::TimeoutExceeded,
            Error::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            Error::ExecFailed { .. } => ErrorKind::ExecFailed,
            Error::Config(_) | Error::ConfigParse(_) => ErrorKind::Config,
            Error::Io(_) | Error::FileRead { .. } | Error::FileWrite { .. } => ErrorKind::Io,
            Error::Yaml(_) => ErrorKind::Yaml,
            Error::ScenariosFailed { .. } => ErrorKind::Failed,
        }
    }

    /// Reports whether this error, or any error it wraps or aggregates,
    /// is classified as `kind`.
    ///
    /// Family kinds match every member: any parse-time error `is(Parse)`
    /// and any runtime error `is(Runtime)`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        match self {
            Error::Parse { source, .. } => kind == ErrorKind::Parse || source.is(kind),
            Error::Aggregate(errs) => kind == ErrorKind::Runtime || errs.has(kind),
            other => {
                let own = other.kind();
                own == kind
                    || (kind == ErrorKind::Parse && own.is_parse())
                    || (kind == ErrorKind::Runtime && own.is_runtime())
            }
        }
    }

    /// Wrap a resolution error with the scenario it came from
    pub fn parse_in(path: &str, source: Error) -> Self {
        Self::Parse {
            path: path.to_string(),
            source: Box::new(source),
        }
    }

    /// Create an unknown field error
    pub fn unknown_field(field: &str, pos: &Position) -> Self {
        Self::UnknownField {
            field: field.to_string(),
            pos: pos.clone(),
        }
    }

    /// Create an invalid duration error
    pub fn invalid_duration(value: &str, pos: &Position, reason: &str) -> Self {
        Self::InvalidDuration {
            value: value.to_string(),
            pos: pos.clone(),
            reason: reason.to_string(),
        }
    }

    /// Create an exec failure error
    pub fn exec_failed(command: &str, message: &str) -> Self {
        Self::ExecFailed {
            command: command.to_string(),
            message: message.to_string(),
        }
    }
}

/// Runtime errors collected over one scenario run
///
/// An empty collection means no runtime error occurred.
#[derive(Debug, Default)]
pub struct RuntimeErrors {
    errors: Vec<Error>,
}

impl RuntimeErrors {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `err` when there is one
    pub fn append_if(&mut self, err: Option<Error>) {
        if let Some(err) = err {
            self.push(err);
        }
    }

    /// Append an error unconditionally
    pub fn push(&mut self, err: Error) {
        self.errors.push(err);
    }

    /// Whether any collected error is classified as `kind`
    pub fn has(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.is(kind))
    }

    /// Whether no errors were collected
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.errors.iter()
    }

    /// Convert into `Ok(())` when empty, else the aggregate error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Aggregate(self))
        }
    }
}

impl fmt::Display for RuntimeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "no runtime errors"),
            [only] => write!(f, "{only}"),
            many => {
                write!(f, "{} runtime errors: ", many.len())?;
                for (i, err) in many.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for RuntimeErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_errors_has() {
        let mut re = RuntimeErrors::new();
        re.append_if(Some(Error::RequiredFixtureMissing("fixture".into())));

        assert!(re.has(ErrorKind::RequiredFixture));
        assert!(re.has(ErrorKind::Runtime));
        assert!(!re.has(ErrorKind::TimeoutExceeded));
    }

    #[test]
    fn test_append_if_none_is_noop() {
        let mut re = RuntimeErrors::new();
        re.append_if(None);
        assert!(re.is_empty());
        assert!(re.into_result().is_ok());
    }

    #[test]
    fn test_parse_wrapper_is_both_parse_and_inner() {
        let pos = Position::root().key("tests").index(0);
        let err = Error::parse_in("foo.yaml", Error::UnknownSpec(pos));
        assert!(err.is(ErrorKind::Parse));
        assert!(err.is(ErrorKind::UnknownSpec));
        assert!(!err.is(ErrorKind::Runtime));
        assert!(err.to_string().contains("$.tests[0]"));
    }

    #[test]
    fn test_aggregate_display_and_query() {
        let mut re = RuntimeErrors::new();
        re.push(Error::Runtime("boom".into()));
        re.push(Error::TimeoutExceeded("20ms".into()));
        let err = re.into_result().unwrap_err();
        assert!(err.is(ErrorKind::Runtime));
        assert!(err.is(ErrorKind::TimeoutExceeded));
        assert!(!err.is(ErrorKind::RequiredFixture));
        assert!(err.to_string().starts_with("2 runtime errors"));
    }

    #[test]
    fn test_families_are_disjoint() {
        let kinds = [
            ErrorKind::Parse,
            ErrorKind::UnknownSpec,
            ErrorKind::Runtime,
            ErrorKind::ExecFailed,
            ErrorKind::Io,
        ];
        for kind in kinds {
            assert!(!(kind.is_parse() && kind.is_runtime()), "{kind:?}");
        }
    }
}
