//! Structured error types shared across evshape crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload shared by every [`EvsError`] family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Dotted code such as `pipeline.sequence` or `extraction.missing`.
    pub code: String,
    /// One-line description of what went wrong.
    pub message: String,
    /// Where it went wrong: run, event, phase, level, field.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Suggested next step, e.g. which config key to set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with an empty context.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Records `key=value`, replacing an earlier value for `key`.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches a hint shown after the context.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the event pipeline.
///
/// Every variant is fatal for the run: the pipeline never retries and never
/// emits a partially populated record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum EvsError {
    /// Invalid run configuration or missing collaborator binding.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// The calculation service could not supply a requested value.
    #[error("extraction error: {0}")]
    Extraction(ErrorInfo),
    /// The output sink rejected a record or failed to flush.
    #[error("sink error: {0}")]
    Sink(ErrorInfo),
    /// A pipeline phase was invoked out of order.
    #[error("sequence error: {0}")]
    Sequence(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

/// Renders `message [code] (key=value, ...); hint: ...`.
impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.code)?;
        let mut pairs = self.context.iter();
        if let Some((key, value)) = pairs.next() {
            write!(f, " ({key}={value}")?;
            for (key, value) in pairs {
                write!(f, ", {key}={value}")?;
            }
            f.write_str(")")?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; hint: {hint}"),
            None => Ok(()),
        }
    }
}

impl EvsError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            EvsError::Config(info)
            | EvsError::Extraction(info)
            | EvsError::Sink(info)
            | EvsError::Sequence(info)
            | EvsError::Serde(info) => info,
        }
    }

    fn info_mut(&mut self) -> &mut ErrorInfo {
        match self {
            EvsError::Config(info)
            | EvsError::Extraction(info)
            | EvsError::Sink(info)
            | EvsError::Sequence(info)
            | EvsError::Serde(info) => info,
        }
    }

    /// Adds a context entry without changing the error family.
    ///
    /// Existing keys are kept so the innermost layer wins.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info_mut()
            .context
            .entry(key.into())
            .or_insert_with(|| value.into());
        self
    }

    /// Shorthand for an [`EvsError::Extraction`] naming the missing field.
    pub fn missing(field: &str, message: impl Into<String>) -> Self {
        EvsError::Extraction(
            ErrorInfo::new("extraction.missing", message).with_context("field", field),
        )
    }
}
