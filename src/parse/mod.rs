//! Parse engine: text → typed [`Line`]s.
//!
//! Per physical line the engine reads the line (or fixed-size record), selects its schema
//! line, slices it into raw cell texts and converts each text with the cell's format. Every
//! recoverable problem is routed through the pass's [`ValidationPolicy`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use flatcodec::parse::{ParseOptions, Parser};
//! use flatcodec::schema::{Schema, SchemaCell, SchemaLine};
//! use flatcodec::types::{CellType, CellValue};
//!
//! # fn main() -> Result<(), flatcodec::CodecError> {
//! let schema = Schema::delimited().with_line(
//!     SchemaLine::new("person")
//!         .with_cell(SchemaCell::new("name", CellType::String))
//!         .with_cell(SchemaCell::new("age", CellType::Integer)),
//! );
//! let parser = Parser::new(Arc::new(schema), ParseOptions::default())?;
//! let (doc, errors) = parser.parse_str("Ada,36\nBob,x\n")?;
//! assert_eq!(doc.len(), 2);
//! assert_eq!(doc.lines()[0].get_value("age"), &CellValue::Integer(36));
//! assert_eq!(errors.len(), 1);
//! # Ok(())
//! # }
//! ```

pub(crate) mod reader;
pub(crate) mod split;
pub(crate) mod typing;

use std::fmt;
use std::io::{BufReader, Read};
use std::sync::Arc;

use crate::error::{CodecResult, ConversionError, ErrorKind, RecordError};
use crate::observability::{PassContext, PassDirection, PassObserver, PassStats, Severity, report_outcome};
use crate::schema::plan::{CellPlan, LinePlan, SchemaPlan};
use crate::schema::{Schema, SchemaCell, SchemaKind, SchemaLine};
use crate::types::{Cell, Document, Line};
use crate::validation::{CollectingSink, ErrorSink, Outcome, PassSink, ValidationPolicy};

use reader::LineReader;
use split::{LineText, unquote, unquote_lenient};

/// Options controlling a parse pass.
#[derive(Clone)]
pub struct ParseOptions {
    pub validation: ValidationPolicy,
    /// Skip zero-length lines. They still count towards line numbers.
    pub skip_empty_lines: bool,
    /// Abort with `MaxErrorsExceeded` once more than this many errors were reported.
    pub max_errors: Option<usize>,
    pub observer: Option<Arc<dyn PassObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("validation", &self.validation)
            .field("skip_empty_lines", &self.skip_empty_lines)
            .field("max_errors", &self.max_errors)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            validation: ValidationPolicy::default(),
            skip_empty_lines: true,
            max_errors: None,
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Parses text according to a shared, immutable [`Schema`].
///
/// A parser holds no per-pass state and can run any number of passes, from any thread.
pub struct Parser {
    schema: Arc<Schema>,
    plan: SchemaPlan,
    options: ParseOptions,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("kind", &self.schema.kind)
            .field("lines", &self.schema.lines.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Parser {
    /// Compile `schema`. Every format is built here, so configuration errors surface now.
    pub fn new(schema: Arc<Schema>, options: ParseOptions) -> CodecResult<Self> {
        let plan = SchemaPlan::compile(&schema)?;
        Ok(Self { schema, plan, options })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Stream `reader` line by line: `on_line` receives every delivered line and `sink` every
    /// recorded error. An error returned by `on_line` aborts the pass.
    pub fn parse_with<R, F>(&self, reader: R, sink: &mut dyn ErrorSink, mut on_line: F) -> CodecResult<PassStats>
    where
        R: Read,
        F: FnMut(Line) -> CodecResult<()>,
    {
        let ctx = PassContext {
            direction: PassDirection::Parse,
            schema_kind: self.schema.kind,
        };
        let result = self.run(reader, sink, &mut on_line);
        report_outcome(self.options.observer.as_ref(), &ctx, self.options.alert_at_or_above, &result);
        result
    }

    /// Parse everything into a [`Document`], collecting recorded errors.
    pub fn parse_document<R: Read>(&self, reader: R) -> CodecResult<(Document, Vec<RecordError>)> {
        let mut errors = CollectingSink::new();
        let mut doc = Document::new();
        self.parse_with(reader, &mut errors, |line| {
            doc.push(line);
            Ok(())
        })?;
        Ok((doc, errors.into_errors()))
    }

    pub fn parse_str(&self, text: &str) -> CodecResult<(Document, Vec<RecordError>)> {
        self.parse_document(text.as_bytes())
    }

    fn run<R: Read>(
        &self,
        reader: R,
        sink: &mut dyn ErrorSink,
        on_line: &mut dyn FnMut(Line) -> CodecResult<()>,
    ) -> CodecResult<PassStats> {
        let mut pass = ParsePass {
            schema: &self.schema,
            plan: &self.plan,
            sink: PassSink::new(sink, self.options.validation, self.options.max_errors),
            header: None,
            header_pending: self.schema.lines.iter().any(|l| l.first_line_as_header),
            stats: PassStats::default(),
        };
        let mut lines = LineReader::new(
            BufReader::new(reader),
            &self.schema.line_separator,
            self.plan.record_length,
        );
        tracing::debug!(kind = ?self.schema.kind, "parse pass started");

        while let Some(text) = lines.next_line()? {
            let number = lines.line_number();
            if text.is_empty() && self.options.skip_empty_lines {
                continue;
            }
            if pass.header_pending {
                pass.read_header(&text)?;
                continue;
            }
            if let Some(line) = pass.parse_line(&text, number)? {
                pass.stats.lines += 1;
                on_line(line)?;
            }
        }

        pass.stats.errors = pass.sink.recorded();
        tracing::debug!(
            lines = pass.stats.lines,
            errors = pass.stats.errors,
            omitted = pass.stats.omitted,
            "parse pass finished"
        );
        Ok(pass.stats)
    }
}

/// Where a column of a headed input goes.
enum Column {
    Cell(usize),
    Extra(String),
}

/// Cell text before conversion.
enum RawCell {
    Text(String),
    Malformed { raw: String, message: String },
}

enum Converted {
    Cell(Cell),
    OmitCell,
    OmitLine,
}

struct ParsePass<'p, 's> {
    schema: &'p Schema,
    plan: &'p SchemaPlan,
    sink: PassSink<'s>,
    header: Option<Vec<Column>>,
    header_pending: bool,
    stats: PassStats,
}

impl ParsePass<'_, '_> {
    fn read_header(&mut self, text: &str) -> CodecResult<()> {
        self.header_pending = false;
        let schema = self.schema;
        let def = &schema.lines[0];
        if schema.kind == SchemaKind::FixedWidth {
            // Fixed-width columns are positional; the header row is only skipped.
            return Ok(());
        }
        let mut line = LineText::new(text);
        let columns = line
            .tokens(def)?
            .iter()
            .map(|token| {
                let name = unquote_lenient(token, &def.quoting);
                let name = name.trim();
                match def.cells.iter().position(|c| c.name == name) {
                    Some(i) => Column::Cell(i),
                    None => Column::Extra(name.to_owned()),
                }
            })
            .collect();
        tracing::trace!(line_type = %def.line_type, "header read");
        self.header = Some(columns);
        Ok(())
    }

    fn parse_line(&mut self, text: &str, number: usize) -> CodecResult<Option<Line>> {
        let (schema, plan) = (self.schema, self.plan);
        let mut line_text = LineText::new(text);
        let Some(index) = typing::select_line(schema, plan, &mut line_text)? else {
            self.stats.omitted += 1;
            let err = RecordError::line(ErrorKind::NoMatchingLineType, number, "no schema line matches").with_raw(text);
            self.sink.report(err)?;
            return Ok(None);
        };
        let def = &schema.lines[index];
        if def.ignore_read {
            tracing::trace!(line_number = number, line_type = %def.line_type, "line ignored");
            return Ok(None);
        }
        let line_plan = &plan.lines[index];

        let (raw_cells, extras) = match schema.kind {
            SchemaKind::Delimited => self.slice_delimited(def, line_plan.cells.as_slice(), &mut line_text)?,
            SchemaKind::FixedWidth => slice_fixed(def, line_plan, &line_text),
        };

        let mut line = Line::with_capacity(def.line_type.as_str(), def.cells.len());
        line.set_line_number(number);
        for ((cell_def, cell_plan), raw) in def.cells.iter().zip(&line_plan.cells).zip(raw_cells) {
            if cell_def.ignore_read {
                continue;
            }
            match self.convert(number, def, cell_def, cell_plan, raw)? {
                Converted::Cell(cell) => line.add(cell),
                Converted::OmitCell => {}
                Converted::OmitLine => {
                    self.stats.omitted += 1;
                    return Ok(None);
                }
            }
        }
        if def.keep_extra_cells {
            for (name, text) in extras {
                line.add(if text.is_empty() {
                    Cell::empty(name, crate::types::CellType::String)
                } else {
                    Cell::new(name, text)
                });
            }
        }
        tracing::trace!(line_number = number, line_type = %def.line_type, cells = line.len(), "line parsed");
        Ok(Some(line))
    }

    fn slice_delimited(
        &self,
        def: &SchemaLine,
        cells: &[CellPlan],
        text: &mut LineText<'_>,
    ) -> CodecResult<(Vec<RawCell>, Vec<(String, String)>)> {
        let tokens = text.tokens(def)?;
        let mut raw: Vec<RawCell> = (0..def.cells.len()).map(|_| RawCell::Text(String::new())).collect();
        let mut extras = Vec::new();
        for (col, token) in tokens.iter().enumerate() {
            let column = match &self.header {
                Some(columns) => columns.get(col),
                None if col < def.cells.len() => {
                    raw[col] = decode_token(token, &cells[col]);
                    continue;
                }
                None => None,
            };
            match column {
                Some(Column::Cell(i)) => raw[*i] = decode_token(token, &cells[*i]),
                Some(Column::Extra(name)) => extras.push((name.clone(), unquote_lenient(token, &def.quoting))),
                None => extras.push((format!("extra_{}", col + 1), unquote_lenient(token, &def.quoting))),
            }
        }
        Ok((raw, extras))
    }

    fn convert(
        &mut self,
        number: usize,
        def: &SchemaLine,
        cell_def: &SchemaCell,
        cell_plan: &CellPlan,
        raw: RawCell,
    ) -> CodecResult<Converted> {
        let text = match raw {
            RawCell::Text(text) => text,
            RawCell::Malformed { raw, message } => {
                let cause = ConversionError::new("quoted text", message);
                let err = RecordError::conversion(number, &def.line_type, &cell_def.name, &raw, cause);
                return self.recover(err, cell_def);
            }
        };

        if text.is_empty() {
            if cell_def.mandatory {
                let err = RecordError::missing_mandatory(number, &def.line_type, &cell_def.name);
                match self.sink.report(err)? {
                    Outcome::Keep => {}
                    Outcome::OmitCell => return Ok(Converted::OmitCell),
                    Outcome::OmitLine => return Ok(Converted::OmitLine),
                }
            }
            let Some(default) = &cell_def.default_value else {
                return Ok(Converted::Cell(Cell::empty(cell_def.name.as_str(), cell_def.cell_type)));
            };
            return self.convert_text(number, def, cell_def, cell_plan, default);
        }
        self.convert_text(number, def, cell_def, cell_plan, &text)
    }

    fn convert_text(
        &mut self,
        number: usize,
        def: &SchemaLine,
        cell_def: &SchemaCell,
        cell_plan: &CellPlan,
        text: &str,
    ) -> CodecResult<Converted> {
        match cell_plan.format.parse(text) {
            Ok(value) => Ok(Converted::Cell(Cell::typed(
                cell_def.name.as_str(),
                cell_def.cell_type,
                value,
            )?)),
            Err(cause) => {
                let err = RecordError::conversion(number, &def.line_type, &cell_def.name, text, cause);
                self.recover(err, cell_def)
            }
        }
    }

    /// Route a cell-level problem; a kept cell is left empty.
    fn recover(&mut self, err: RecordError, cell_def: &SchemaCell) -> CodecResult<Converted> {
        Ok(match self.sink.report(err)? {
            Outcome::Keep => Converted::Cell(Cell::empty(cell_def.name.as_str(), cell_def.cell_type)),
            Outcome::OmitCell => Converted::OmitCell,
            Outcome::OmitLine => Converted::OmitLine,
        })
    }
}

fn decode_token(token: &str, cell: &CellPlan) -> RawCell {
    match &cell.quoter {
        Some(quoter) => match unquote(token, quoter) {
            Ok(text) => RawCell::Text(text),
            Err(e) => RawCell::Malformed {
                raw: token.to_owned(),
                message: e.to_string(),
            },
        },
        None => RawCell::Text(token.to_owned()),
    }
}

fn slice_fixed(
    def: &SchemaLine,
    plan: &LinePlan,
    text: &LineText<'_>,
) -> (Vec<RawCell>, Vec<(String, String)>) {
    let raw = plan
        .cells
        .iter()
        .zip(&plan.offsets)
        .map(|(cell, &offset)| match &cell.padder {
            Some(padder) => RawCell::Text(text.fixed_cell(offset, padder).to_owned()),
            None => RawCell::Text(String::new()),
        })
        .collect();
    let end = def.cells.iter().filter_map(|c| c.width).sum::<usize>();
    let rest = text.fixed_rest(end, def.line_fill);
    let extras = if rest.is_empty() {
        Vec::new()
    } else {
        vec![(format!("extra_{}", def.cells.len() + 1), rest.to_owned())]
    };
    (raw, extras)
}
