use std::sync::Arc;

use flatcodec::compose::{ComposeOptions, Composer};
use flatcodec::error::ErrorKind;
use flatcodec::format::FormatSpec;
use flatcodec::parse::{ParseOptions, Parser};
use flatcodec::schema::{Quoting, Schema, SchemaCell, SchemaLine};
use flatcodec::text::{QuoteMode, Quoter};
use flatcodec::types::{Cell, CellType, CellValue, Document, Line};
use rust_decimal::Decimal;

fn single_cell(cell: SchemaCell) -> Arc<Schema> {
    Arc::new(Schema::delimited().with_line(SchemaLine::new("row").with_cell(cell)))
}

#[test]
fn boolean_literals_are_case_insensitive() {
    let schema = single_cell(SchemaCell::new("flag", CellType::Boolean).with_pattern("ja;nej"));
    let parser = Parser::new(schema, ParseOptions::default()).unwrap();
    let (doc, errors) = parser.parse_str("JA\nnej\nunknown\n").unwrap();

    let values: Vec<&CellValue> = doc.iter().map(|l| l.get_value("flag")).collect();
    assert_eq!(
        values,
        vec![&CellValue::Boolean(true), &CellValue::Boolean(false), &CellValue::Empty]
    );
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, ErrorKind::Conversion);
    assert_eq!(errors[0].raw.as_deref(), Some("unknown"));
}

#[test]
fn identical_boolean_literals_fail_at_construction() {
    let schema = single_cell(SchemaCell::new("flag", CellType::Boolean).with_pattern("x;x"));
    let err = Parser::new(schema, ParseOptions::default()).unwrap_err();
    assert!(err.to_string().contains("invalid format configuration"), "{err}");
}

#[test]
fn implied_decimal_scales_both_ways() {
    let schema = single_cell(
        SchemaCell::new("amount", CellType::Decimal).with_format(FormatSpec::ImpliedDecimal(2)),
    );
    let composer = Composer::new(schema.clone(), ComposeOptions::default()).unwrap();
    let doc = Document::from_lines(vec![Line::new("row").with_cell(Cell::new("amount", 1))]);
    let (text, _) = composer.compose_to_string(&doc).unwrap();
    assert_eq!(text, "100\n");

    let parser = Parser::new(schema, ParseOptions::default()).unwrap();
    let (doc, errors) = parser.parse_str("314\n").unwrap();
    assert!(errors.is_empty());
    assert_eq!(doc.lines()[0].get_value("amount"), &CellValue::Decimal(Decimal::new(314, 2)));
}

#[test]
fn rfc_quoting_with_custom_quote_character() {
    let quoter = Quoter::always_rfc('/');
    let encoded = quoter.encode("hej/san/123456");
    assert_eq!(encoded, "/hej//san//123456/");
    assert_eq!(quoter.decode(&encoded).unwrap(), "hej/san/123456");

    let schema = Arc::new(
        Schema::delimited().with_line(
            SchemaLine::new("row")
                .with_quoting(Quoting::new(QuoteMode::AlwaysRfc).with_quote('/'))
                .with_cell(SchemaCell::new("a", CellType::String))
                .with_cell(SchemaCell::new("b", CellType::String)),
        ),
    );
    let composer = Composer::new(schema.clone(), ComposeOptions::default()).unwrap();
    let doc = Document::from_lines(vec![
        Line::new("row")
            .with_cell(Cell::new("a", "hej/san/123456"))
            .with_cell(Cell::new("b", "x,y")),
    ]);
    let (text, _) = composer.compose_to_string(&doc).unwrap();
    assert_eq!(text, "/hej//san//123456/,/x,y/\n");

    let (parsed, errors) = Parser::new(schema, ParseOptions::default())
        .unwrap()
        .parse_str(&text)
        .unwrap();
    assert!(errors.is_empty());
    assert_eq!(parsed.lines()[0].get_value("a"), &CellValue::from("hej/san/123456"));
    assert_eq!(parsed.lines()[0].get_value("b"), &CellValue::from("x,y"));
}

#[test]
fn malformed_quoted_cell_is_conversion_error() {
    let schema = Arc::new(
        Schema::delimited().with_line(
            SchemaLine::new("row")
                .with_quoting(Quoting::new(QuoteMode::AlwaysRfc))
                .with_cell(SchemaCell::new("a", CellType::String)),
        ),
    );
    let parser = Parser::new(schema, ParseOptions::default()).unwrap();
    let (doc, errors) = parser.parse_str("\"open\n").unwrap();
    assert!(doc.lines()[0].get("a").unwrap().is_empty());
    assert_eq!(errors[0].kind, ErrorKind::Conversion);
    assert_eq!(errors[0].raw.as_deref(), Some("\"open"));
}

#[test]
fn locale_number_patterns() {
    let schema = single_cell(
        SchemaCell::new("total", CellType::Decimal)
            .with_pattern("#,##0.00")
            .with_locale("de"),
    );
    let composer = Composer::new(schema.clone(), ComposeOptions::default()).unwrap();
    let doc = Document::from_lines(vec![
        Line::new("row").with_cell(Cell::new("total", Decimal::new(123456789, 2))),
    ]);
    let (text, _) = composer.compose_to_string(&doc).unwrap();
    assert_eq!(text, "\"1.234.567,89\"\n");

    let (parsed, errors) = Parser::new(schema, ParseOptions::default())
        .unwrap()
        .parse_str(&text)
        .unwrap();
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(
        parsed.lines()[0].get_value("total"),
        &CellValue::Decimal(Decimal::new(123456789, 2))
    );
}
