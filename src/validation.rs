//! The validation protocol shared by the parse and compose engines.
//!
//! Every recoverable condition (conversion failure, missing mandatory cell, unknown line type,
//! missing schema line) is turned into a [`RecordError`] and routed through [`handle`] with the
//! [`ValidationAction`] configured for its [`ErrorKind`]. The outcome tells the engine whether
//! to keep the current unit of work or drop it; `Exception` unwinds the pass.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult, ErrorKind, RecordError};

/// What to do when a recoverable condition is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationAction {
    /// Report the error to the sink and continue with the current line.
    #[default]
    Error,
    /// Abort the pass with a fatal [`CodecError::Record`].
    Exception,
    /// Ignore silently and continue.
    None,
    /// Drop the current line without reporting an error.
    OmitLine,
    /// Drop the current cell without reporting an error.
    OmitCell,
}

/// What the engine should do with the current unit of work after [`handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Keep,
    OmitLine,
    OmitCell,
}

/// Receiver of recorded errors.
///
/// A sink may itself fail the pass, e.g. [`MaxErrorsSink`] once its threshold is exceeded.
pub trait ErrorSink {
    fn record(&mut self, error: RecordError) -> CodecResult<()>;
}

impl<F> ErrorSink for F
where
    F: FnMut(RecordError),
{
    fn record(&mut self, error: RecordError) -> CodecResult<()> {
        self(error);
        Ok(())
    }
}

/// Apply `action` to a detected condition.
pub fn handle(action: ValidationAction, error: RecordError, sink: &mut dyn ErrorSink) -> CodecResult<Outcome> {
    match action {
        ValidationAction::Error => {
            sink.record(error)?;
            Ok(Outcome::Keep)
        }
        ValidationAction::Exception => Err(CodecError::Record(error)),
        ValidationAction::None => Ok(Outcome::Keep),
        ValidationAction::OmitLine => Ok(Outcome::OmitLine),
        ValidationAction::OmitCell => Ok(Outcome::OmitCell),
    }
}

/// The action configured for each kind of condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPolicy {
    pub on_conversion_error: ValidationAction,
    pub on_missing_mandatory: ValidationAction,
    pub on_undefined_line_type: ValidationAction,
    pub on_no_schema_line: ValidationAction,
}

impl ValidationPolicy {
    /// The same action for every condition.
    pub fn uniform(action: ValidationAction) -> Self {
        Self {
            on_conversion_error: action,
            on_missing_mandatory: action,
            on_undefined_line_type: action,
            on_no_schema_line: action,
        }
    }

    pub fn action_for(&self, kind: ErrorKind) -> ValidationAction {
        match kind {
            ErrorKind::Conversion => self.on_conversion_error,
            ErrorKind::MissingMandatoryCell => self.on_missing_mandatory,
            ErrorKind::NoMatchingLineType => self.on_undefined_line_type,
            ErrorKind::NoMatchingSchemaLine => self.on_no_schema_line,
        }
    }

    /// [`handle`] with the action configured for the error's kind.
    pub fn apply(&self, error: RecordError, sink: &mut dyn ErrorSink) -> CodecResult<Outcome> {
        handle(self.action_for(error.kind), error, sink)
    }
}

/// Collects every recorded error in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    errors: Vec<RecordError>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &[RecordError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<RecordError> {
        self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl ErrorSink for CollectingSink {
    fn record(&mut self, error: RecordError) -> CodecResult<()> {
        self.errors.push(error);
        Ok(())
    }
}

/// Logs recorded errors as `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn record(&mut self, error: RecordError) -> CodecResult<()> {
        tracing::warn!(
            kind = %error.kind,
            line_number = error.line_number,
            cell = error.cell_name.as_deref().unwrap_or(""),
            "{error}"
        );
        Ok(())
    }
}

/// Forwards each error to a list of sinks in registration order.
#[derive(Default)]
pub struct SinkList {
    sinks: Vec<Box<dyn ErrorSink>>,
}

impl SinkList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.push(sink);
        self
    }

    pub fn push(&mut self, sink: impl ErrorSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl fmt::Debug for SinkList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkList")
            .field("sinks_len", &self.sinks.len())
            .finish()
    }
}

impl ErrorSink for SinkList {
    fn record(&mut self, error: RecordError) -> CodecResult<()> {
        for sink in &mut self.sinks {
            sink.record(error.clone())?;
        }
        Ok(())
    }
}

/// Wraps a sink and fails the pass once more than `max` errors have been recorded.
///
/// The raised [`CodecError::MaxErrorsExceeded`] carries every error recorded so far,
/// including the one that crossed the threshold. That last error is not forwarded.
#[derive(Debug)]
pub struct MaxErrorsSink<S> {
    inner: S,
    max: usize,
    errors: Vec<RecordError>,
}

impl<S: ErrorSink> MaxErrorsSink<S> {
    pub fn new(inner: S, max: usize) -> Self {
        Self {
            inner,
            max,
            errors: Vec::new(),
        }
    }

    pub fn recorded(&self) -> &[RecordError] {
        &self.errors
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ErrorSink> ErrorSink for MaxErrorsSink<S> {
    fn record(&mut self, error: RecordError) -> CodecResult<()> {
        self.errors.push(error.clone());
        if self.errors.len() > self.max {
            return Err(CodecError::MaxErrorsExceeded {
                max: self.max,
                errors: std::mem::take(&mut self.errors),
            });
        }
        self.inner.record(error)
    }
}

struct BorrowedSink<'a>(&'a mut dyn ErrorSink);

impl ErrorSink for BorrowedSink<'_> {
    fn record(&mut self, error: RecordError) -> CodecResult<()> {
        self.0.record(error)
    }
}

/// Per-pass error routing: applies the policy, counts reported errors and bounds them by the
/// pass's `max_errors` option when set.
pub(crate) struct PassSink<'a> {
    target: SinkTarget<'a>,
    policy: ValidationPolicy,
    recorded: usize,
}

enum SinkTarget<'a> {
    Unbounded(BorrowedSink<'a>),
    Bounded(MaxErrorsSink<BorrowedSink<'a>>),
}

impl ErrorSink for SinkTarget<'_> {
    fn record(&mut self, error: RecordError) -> CodecResult<()> {
        match self {
            SinkTarget::Unbounded(sink) => sink.record(error),
            SinkTarget::Bounded(sink) => sink.record(error),
        }
    }
}

impl<'a> PassSink<'a> {
    pub(crate) fn new(sink: &'a mut dyn ErrorSink, policy: ValidationPolicy, max_errors: Option<usize>) -> Self {
        let target = match max_errors {
            Some(max) => SinkTarget::Bounded(MaxErrorsSink::new(BorrowedSink(sink), max)),
            None => SinkTarget::Unbounded(BorrowedSink(sink)),
        };
        Self {
            target,
            policy,
            recorded: 0,
        }
    }

    pub(crate) fn report(&mut self, error: RecordError) -> CodecResult<Outcome> {
        let action = self.policy.action_for(error.kind);
        if action == ValidationAction::Error {
            self.recorded += 1;
        }
        handle(action, error, &mut self.target)
    }

    pub(crate) fn recorded(&self) -> usize {
        self.recorded
    }
}
