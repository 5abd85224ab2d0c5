//! Pass outcome reporting.
//!
//! Parse and compose passes report their outcome to an optional [`PassObserver`] configured
//! on [`crate::parse::ParseOptions`] / [`crate::compose::ComposeOptions`]:
//!
//! - `on_success` when the pass completes, with [`PassStats`]
//! - `on_failure` when it aborts, with a computed [`Severity`]
//! - `on_alert` when that severity is at or above the configured threshold

use std::fmt;
use std::sync::Arc;

use crate::error::{CodecError, CodecResult};
use crate::schema::SchemaKind;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    /// The pass failed on its input.
    Error,
    /// I/O failure, or the error budget of the pass was exhausted.
    Critical,
}

/// Which engine ran the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassDirection {
    Parse,
    Compose,
}

/// Context about a parse or compose pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassContext {
    pub direction: PassDirection,
    pub schema_kind: SchemaKind,
}

/// Counters reported when a pass completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Lines delivered (parse) or written (compose), header lines excluded.
    pub lines: usize,
    /// Errors reported to the error sink.
    pub errors: usize,
    /// Lines dropped by an `OmitLine` outcome or an unmatched line type.
    pub omitted: usize,
}

/// Observer interface for pass outcomes.
pub trait PassObserver: Send + Sync {
    fn on_success(&self, _ctx: &PassContext, _stats: PassStats) {}

    fn on_failure(&self, _ctx: &PassContext, _severity: Severity, _error: &CodecError) {}

    /// Called when a failure meets the alert threshold. Forwards to [`Self::on_failure`]
    /// unless overridden.
    fn on_alert(&self, ctx: &PassContext, severity: Severity, error: &CodecError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Fans out callbacks to a list of observers in registration order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PassObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn PassObserver>>) -> Self {
        Self { observers }
    }

    pub fn push(&mut self, observer: Arc<dyn PassObserver>) {
        self.observers.push(observer);
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PassObserver for CompositeObserver {
    fn on_success(&self, ctx: &PassContext, stats: PassStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &PassContext, severity: Severity, error: &CodecError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &PassContext, severity: Severity, error: &CodecError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs pass outcomes through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PassObserver for TracingObserver {
    fn on_success(&self, ctx: &PassContext, stats: PassStats) {
        tracing::info!(
            direction = ?ctx.direction,
            kind = ?ctx.schema_kind,
            lines = stats.lines,
            errors = stats.errors,
            omitted = stats.omitted,
            "pass completed"
        );
    }

    fn on_failure(&self, ctx: &PassContext, severity: Severity, error: &CodecError) {
        tracing::error!(direction = ?ctx.direction, kind = ?ctx.schema_kind, ?severity, %error, "pass failed");
    }

    fn on_alert(&self, ctx: &PassContext, severity: Severity, error: &CodecError) {
        tracing::error!(
            alert = true,
            direction = ?ctx.direction,
            kind = ?ctx.schema_kind,
            ?severity,
            %error,
            "pass failed"
        );
    }
}

pub(crate) fn severity_for_error(e: &CodecError) -> Severity {
    match e {
        CodecError::Io(_) | CodecError::MaxErrorsExceeded { .. } => Severity::Critical,
        CodecError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => Severity::Critical,
            _ => Severity::Error,
        },
        _ => Severity::Error,
    }
}

/// Report a finished pass to `observer`, if any.
pub(crate) fn report_outcome(
    observer: Option<&Arc<dyn PassObserver>>,
    ctx: &PassContext,
    alert_at_or_above: Severity,
    result: &CodecResult<PassStats>,
) {
    match result {
        Ok(stats) => {
            if let Some(obs) = observer {
                obs.on_success(ctx, *stats);
            }
        }
        Err(e) => report_failure(observer, ctx, alert_at_or_above, e),
    }
}

pub(crate) fn report_failure(
    observer: Option<&Arc<dyn PassObserver>>,
    ctx: &PassContext,
    alert_at_or_above: Severity,
    error: &CodecError,
) {
    let Some(obs) = observer else {
        return;
    };
    let sev = severity_for_error(error);
    obs.on_failure(ctx, sev, error);
    if sev >= alert_at_or_above {
        obs.on_alert(ctx, sev, error);
    }
}
