use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use flatcodec::CodecError;
use flatcodec::compose::{ComposeOptions, Composer};
use flatcodec::error::{ErrorKind, RecordError};
use flatcodec::parse::{ParseOptions, Parser};
use flatcodec::schema::{LineTyping, Schema, SchemaCell, SchemaLine};
use flatcodec::types::{Cell, CellType, Document, Line};
use flatcodec::validation::{
    CollectingSink, MaxErrorsSink, SinkList, ValidationAction, ValidationPolicy,
};

const INPUT: &str = "1,a\nx,b\n3,c\n";

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::delimited().with_line(
            SchemaLine::new("row")
                .with_cell(SchemaCell::new("n", CellType::Integer))
                .with_cell(SchemaCell::new("s", CellType::String)),
        ),
    )
}

fn parser_with(action: ValidationAction, max_errors: Option<usize>) -> Parser {
    let options = ParseOptions {
        validation: ValidationPolicy::uniform(action),
        max_errors,
        ..Default::default()
    };
    Parser::new(schema(), options).unwrap()
}

/// Runs a pass and returns (delivered line numbers, recorded errors).
fn run(parser: &Parser, input: &str) -> Result<(Vec<usize>, Vec<RecordError>), CodecError> {
    let mut sink = CollectingSink::new();
    let mut delivered = Vec::new();
    parser.parse_with(input.as_bytes(), &mut sink, |line| {
        delivered.push(line.line_number());
        Ok(())
    })?;
    Ok((delivered, sink.into_errors()))
}

#[test]
fn error_notifies_sink_and_keeps_line() {
    let (delivered, errors) = run(&parser_with(ValidationAction::Error, None), INPUT).unwrap();
    assert_eq!(delivered, vec![1, 2, 3]);
    assert_eq!(errors.len(), 1);
    let e = &errors[0];
    assert_eq!(e.kind, ErrorKind::Conversion);
    assert_eq!(e.line_number, 2);
    assert_eq!(e.line_type.as_deref(), Some("row"));
    assert_eq!(e.cell_name.as_deref(), Some("n"));
    assert_eq!(e.raw.as_deref(), Some("x"));
    assert!(e.expected.is_some());
}

#[test]
fn none_keeps_line_without_notifying() {
    let (delivered, errors) = run(&parser_with(ValidationAction::None, None), INPUT).unwrap();
    assert_eq!(delivered, vec![1, 2, 3]);
    assert!(errors.is_empty());
}

#[test]
fn omit_line_drops_line_silently() {
    let parser = parser_with(ValidationAction::OmitLine, None);
    let mut sink = CollectingSink::new();
    let stats = parser.parse_with(INPUT.as_bytes(), &mut sink, |_| Ok(())).unwrap();
    assert_eq!(stats.lines, 2);
    assert_eq!(stats.omitted, 1);
    assert_eq!(stats.errors, 0);
    assert!(sink.is_empty());
}

#[test]
fn exception_aborts_at_first_problem() {
    let mut delivered = Vec::new();
    let mut sink = CollectingSink::new();
    let err = parser_with(ValidationAction::Exception, None)
        .parse_with(INPUT.as_bytes(), &mut sink, |line| {
            delivered.push(line.line_number());
            Ok(())
        })
        .unwrap_err();
    assert_eq!(delivered, vec![1]);
    assert_eq!(err.record_errors().len(), 1);
    assert_eq!(err.record_errors()[0].line_number, 2);
    assert!(sink.is_empty());
}

#[test]
fn max_errors_embeds_every_recorded_error() {
    let input = "a,1\nb,2\nc,3\nd,4\n";
    let err = run(&parser_with(ValidationAction::Error, Some(2)), input).unwrap_err();
    match &err {
        CodecError::MaxErrorsExceeded { max, errors } => {
            assert_eq!(*max, 2);
            let lines: Vec<usize> = errors.iter().map(|e| e.line_number).collect();
            assert_eq!(lines, vec![1, 2, 3]);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn max_errors_not_reached_completes() {
    let (delivered, errors) = run(&parser_with(ValidationAction::Error, Some(1)), INPUT).unwrap();
    assert_eq!(delivered.len(), 3);
    assert_eq!(errors.len(), 1);
}

#[test]
fn max_errors_sink_wraps_any_sink() {
    let mut sink = MaxErrorsSink::new(CollectingSink::new(), 0);
    let err = parser_with(ValidationAction::Error, None)
        .parse_with(INPUT.as_bytes(), &mut sink, |_| Ok(()))
        .unwrap_err();
    assert!(matches!(err, CodecError::MaxErrorsExceeded { max: 0, .. }));
    assert_eq!(err.record_errors().len(), 1);
    assert!(sink.into_inner().is_empty());
}

#[test]
fn sink_list_notifies_in_registration_order() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let (first, second) = (order.clone(), order.clone());
    let mut sinks = SinkList::new()
        .with(move |e: RecordError| first.borrow_mut().push(format!("first:{}", e.line_number)))
        .with(move |e: RecordError| second.borrow_mut().push(format!("second:{}", e.line_number)));
    parser_with(ValidationAction::Error, None)
        .parse_with(INPUT.as_bytes(), &mut sinks, |_| Ok(()))
        .unwrap();
    assert_eq!(*order.borrow(), vec!["first:2", "second:2"]);
}

#[test]
fn undefined_line_type_per_action() {
    let typed = Arc::new(
        Schema::delimited()
            .with_line_typing(LineTyping::ControlCell { cell_index: 0 })
            .with_line(
                SchemaLine::new("a")
                    .with_control_value("A")
                    .with_cell(SchemaCell::new("tag", CellType::String)),
            ),
    );
    let parse = |action| {
        let options = ParseOptions {
            validation: ValidationPolicy {
                on_undefined_line_type: action,
                ..Default::default()
            },
            ..Default::default()
        };
        Parser::new(typed.clone(), options).unwrap().parse_str("A\nB\nA\n")
    };

    let (doc, errors) = parse(ValidationAction::Error).unwrap();
    assert_eq!(doc.len(), 2);
    assert_eq!(errors[0].kind, ErrorKind::NoMatchingLineType);

    let (doc, errors) = parse(ValidationAction::None).unwrap();
    assert_eq!(doc.len(), 2);
    assert!(errors.is_empty());

    let err = parse(ValidationAction::Exception).unwrap_err();
    assert_eq!(err.record_errors()[0].kind, ErrorKind::NoMatchingLineType);
}

#[test]
fn compose_missing_schema_line_per_action() {
    let compose = |action| {
        let options = ComposeOptions {
            validation: ValidationPolicy {
                on_no_schema_line: action,
                ..Default::default()
            },
            ..Default::default()
        };
        let doc = Document::from_lines(vec![
            Line::new("row").with_cell(Cell::new("n", 1)),
            Line::new("unknown").with_cell(Cell::new("n", 2)),
        ]);
        Composer::new(schema(), options).unwrap().compose_to_string(&doc)
    };

    let (text, errors) = compose(ValidationAction::Error).unwrap();
    assert_eq!(text, "1,\n");
    assert_eq!(errors[0].kind, ErrorKind::NoMatchingSchemaLine);

    let (text, errors) = compose(ValidationAction::OmitLine).unwrap();
    assert_eq!(text, "1,\n");
    assert!(errors.is_empty());

    let err = compose(ValidationAction::Exception).unwrap_err();
    assert_eq!(err.record_errors()[0].kind, ErrorKind::NoMatchingSchemaLine);
}

#[test]
fn compose_omit_cell_writes_empty_cell() {
    let mandatory = Arc::new(
        Schema::delimited().with_line(
            SchemaLine::new("row")
                .with_cell(SchemaCell::new("n", CellType::Integer).mandatory().with_default("0"))
                .with_cell(SchemaCell::new("s", CellType::String)),
        ),
    );
    let options = ComposeOptions {
        validation: ValidationPolicy::uniform(ValidationAction::OmitCell),
        ..Default::default()
    };
    let composer = Composer::new(mandatory, options).unwrap();
    let doc = Document::from_lines(vec![Line::new("row").with_cell(Cell::new("s", "x"))]);
    let (text, errors) = composer.compose_to_string(&doc).unwrap();
    assert_eq!(text, ",x\n");
    assert!(errors.is_empty());
}
