use std::sync::{Arc, Mutex};

use flatcodec::compose::{ComposeOptions, Composer};
use flatcodec::observability::{
    CompositeObserver, PassContext, PassDirection, PassObserver, PassStats, Severity, TracingObserver,
};
use flatcodec::parse::{ParseOptions, Parser};
use flatcodec::schema::{Schema, SchemaCell, SchemaLine};
use flatcodec::types::{Cell, CellType, Document, Line};
use flatcodec::validation::{CollectingSink, ValidationAction, ValidationPolicy};

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(PassDirection, PassStats)>>,
    failures: Mutex<Vec<Severity>>,
    alerts: Mutex<Vec<Severity>>,
}

impl PassObserver for RecordingObserver {
    fn on_success(&self, ctx: &PassContext, stats: PassStats) {
        self.successes.lock().unwrap().push((ctx.direction, stats));
    }

    fn on_failure(&self, _ctx: &PassContext, severity: Severity, _error: &flatcodec::CodecError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &PassContext, severity: Severity, _error: &flatcodec::CodecError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::delimited().with_line(
            SchemaLine::new("row").with_cell(SchemaCell::new("n", CellType::Integer).mandatory()),
        ),
    )
}

#[test]
fn observer_receives_parse_stats_on_success() {
    let obs = Arc::new(RecordingObserver::default());
    let options = ParseOptions {
        observer: Some(obs.clone()),
        ..Default::default()
    };
    let parser = Parser::new(schema(), options).unwrap();
    let (_, errors) = parser.parse_str("1\nx\n3\n").unwrap();
    assert_eq!(errors.len(), 1);

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(
        successes,
        vec![(
            PassDirection::Parse,
            PassStats {
                lines: 3,
                errors: 1,
                omitted: 0
            }
        )]
    );
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn max_errors_failure_is_critical_and_alerts() {
    let obs = Arc::new(RecordingObserver::default());
    let options = ParseOptions {
        observer: Some(obs.clone()),
        max_errors: Some(0),
        ..Default::default()
    };
    let parser = Parser::new(schema(), options).unwrap();
    let _ = parser.parse_str("x\n").unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![Severity::Critical]);
}

#[test]
fn exception_failure_alerts_only_below_threshold() {
    let obs = Arc::new(RecordingObserver::default());
    let options = ParseOptions {
        observer: Some(obs.clone()),
        validation: ValidationPolicy::uniform(ValidationAction::Exception),
        alert_at_or_above: Severity::Error,
        ..Default::default()
    };
    let parser = Parser::new(schema(), options).unwrap();
    let _ = parser.parse_str("x\n").unwrap_err();
    assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Error]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![Severity::Error]);

    let obs = Arc::new(RecordingObserver::default());
    let options = ParseOptions {
        observer: Some(obs.clone()),
        validation: ValidationPolicy::uniform(ValidationAction::Exception),
        ..Default::default()
    };
    let _ = Parser::new(schema(), options).unwrap().parse_str("x\n").unwrap_err();
    assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn compose_failure_is_reported_once() {
    let obs = Arc::new(RecordingObserver::default());
    let options = ComposeOptions {
        observer: Some(obs.clone()),
        validation: ValidationPolicy::uniform(ValidationAction::Exception),
        ..Default::default()
    };
    let composer = Composer::new(schema(), options).unwrap();
    let mut sink = CollectingSink::new();
    let mut writer = composer.writer(Vec::new(), &mut sink);
    writer.write_line(&Line::new("row").with_cell(Cell::new("n", 1))).unwrap();
    assert!(writer.write_line(&Line::new("row")).is_err());
    assert!(writer.write_line(&Line::new("row")).is_err());
    writer.finish().unwrap();

    assert_eq!(*obs.failures.lock().unwrap(), vec![Severity::Error]);
    assert!(obs.successes.lock().unwrap().is_empty());
}

#[test]
fn composite_observer_fans_out_compose_success() {
    let first = Arc::new(RecordingObserver::default());
    let second = Arc::new(RecordingObserver::default());
    let composite = CompositeObserver::new(vec![first.clone(), second.clone(), Arc::new(TracingObserver)]);
    let options = ComposeOptions {
        observer: Some(Arc::new(composite)),
        ..Default::default()
    };
    let composer = Composer::new(schema(), options).unwrap();
    let doc = Document::from_lines(vec![Line::new("row").with_cell(Cell::new("n", 7))]);
    let (text, _) = composer.compose_to_string(&doc).unwrap();
    assert_eq!(text, "7\n");

    for obs in [first, second] {
        let successes = obs.successes.lock().unwrap().clone();
        assert_eq!(successes.len(), 1);
        assert_eq!(successes[0].0, PassDirection::Compose);
        assert_eq!(successes[0].1.lines, 1);
    }
}
