//! Compose engine: typed [`Line`]s → text.
//!
//! A [`Composer`] compiles the schema once; each pass writes through a [`ComposeWriter`]
//! which owns the pass state (error sink, line lookup cache, header flag, counters).
//!
//! ```
//! use std::sync::Arc;
//!
//! use flatcodec::compose::{ComposeOptions, Composer};
//! use flatcodec::schema::{Schema, SchemaCell, SchemaLine};
//! use flatcodec::types::{Cell, CellType, Document, Line};
//!
//! # fn main() -> Result<(), flatcodec::CodecError> {
//! let schema = Schema::delimited().with_line(
//!     SchemaLine::new("person")
//!         .with_cell(SchemaCell::new("name", CellType::String))
//!         .with_cell(SchemaCell::new("age", CellType::Integer)),
//! );
//! let composer = Composer::new(Arc::new(schema), ComposeOptions::default())?;
//! let doc = Document::from_lines(vec![
//!     Line::new("person").with_cell(Cell::new("name", "Ada")).with_cell(Cell::new("age", 36)),
//! ]);
//! let (text, errors) = composer.compose_to_string(&doc)?;
//! assert_eq!(text, "Ada,36\n");
//! assert!(errors.is_empty());
//! # Ok(())
//! # }
//! ```

mod encode;

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use crate::cache::BoundedCache;
use crate::error::{CodecError, CodecResult, ConversionError, ErrorKind, RecordError};
use crate::observability::{
    PassContext, PassDirection, PassObserver, PassStats, Severity, report_failure, report_outcome,
};
use crate::schema::plan::{CellPlan, SchemaPlan};
use crate::schema::{LineTyping, Schema, SchemaCell, SchemaKind};
use crate::types::{Cell, Document, Line};
use crate::validation::{CollectingSink, ErrorSink, Outcome, PassSink, ValidationPolicy};

use encode::encode_line;

/// Options controlling a compose pass.
#[derive(Clone)]
pub struct ComposeOptions {
    pub validation: ValidationPolicy,
    /// Write the header row of a `first_line_as_header` line before its first data line.
    pub write_header: bool,
    /// Abort with `MaxErrorsExceeded` once more than this many errors were reported.
    pub max_errors: Option<usize>,
    pub observer: Option<Arc<dyn PassObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for ComposeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposeOptions")
            .field("validation", &self.validation)
            .field("write_header", &self.write_header)
            .field("max_errors", &self.max_errors)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            validation: ValidationPolicy::default(),
            write_header: true,
            max_errors: None,
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Writes lines as text according to a shared, immutable [`Schema`].
pub struct Composer {
    schema: Arc<Schema>,
    plan: SchemaPlan,
    options: ComposeOptions,
}

impl fmt::Debug for Composer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composer")
            .field("kind", &self.schema.kind)
            .field("lines", &self.schema.lines.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Composer {
    /// Compile `schema`. Every format is built here, so configuration errors surface now.
    pub fn new(schema: Arc<Schema>, options: ComposeOptions) -> CodecResult<Self> {
        let plan = SchemaPlan::compile(&schema)?;
        Ok(Self { schema, plan, options })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Start a pass writing to `out` and reporting recorded errors to `sink`.
    pub fn writer<'c, 's, W: Write>(&'c self, out: W, sink: &'s mut dyn ErrorSink) -> ComposeWriter<'c, 's, W> {
        tracing::debug!(kind = ?self.schema.kind, "compose pass started");
        ComposeWriter {
            composer: self,
            out,
            sink: PassSink::new(sink, self.options.validation, self.options.max_errors),
            line_lookup: BoundedCache::new(2),
            header_written: false,
            stats: PassStats::default(),
            failed: false,
        }
    }

    /// Write every line of `doc` to `out` in one pass.
    pub fn compose_document<W: Write>(&self, doc: &Document, out: W, sink: &mut dyn ErrorSink) -> CodecResult<PassStats> {
        let mut writer = self.writer(out, sink);
        writer.write_document(doc)?;
        writer.finish()
    }

    /// Compose `doc` into a string, collecting recorded errors.
    pub fn compose_to_string(&self, doc: &Document) -> CodecResult<(String, Vec<RecordError>)> {
        let mut errors = CollectingSink::new();
        let mut out = Vec::new();
        self.compose_document(doc, &mut out, &mut errors)?;
        let text = String::from_utf8(out).map_err(|e| {
            CodecError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        Ok((text, errors.into_errors()))
    }

    fn context(&self) -> PassContext {
        PassContext {
            direction: PassDirection::Compose,
            schema_kind: self.schema.kind,
        }
    }

    /// Index of the schema line for `line_type`.
    ///
    /// Under single-line typing, a line without a type uses the first writable line.
    fn lookup_line(&self, line_type: &str) -> Option<usize> {
        let lines = &self.schema.lines;
        lines.iter().position(|l| l.line_type == line_type).or_else(|| {
            (line_type.is_empty() && self.schema.line_typing == LineTyping::Single)
                .then(|| lines.iter().position(|l| !l.ignore_write))
                .flatten()
        })
    }
}

/// One compose pass. Call [`ComposeWriter::finish`] to flush and report the outcome.
pub struct ComposeWriter<'c, 's, W: Write> {
    composer: &'c Composer,
    out: W,
    sink: PassSink<'s>,
    line_lookup: BoundedCache<String, Option<usize>>,
    header_written: bool,
    stats: PassStats,
    failed: bool,
}

impl<W: Write> fmt::Debug for ComposeWriter<'_, '_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposeWriter")
            .field("stats", &self.stats)
            .field("header_written", &self.header_written)
            .field("failed", &self.failed)
            .finish()
    }
}

impl<W: Write> ComposeWriter<'_, '_, W> {
    /// Compose and write one line.
    pub fn write_line(&mut self, line: &Line) -> CodecResult<()> {
        let result = self.compose_line(line);
        self.observe(result)
    }

    pub fn write_document(&mut self, doc: &Document) -> CodecResult<()> {
        for line in doc.iter() {
            self.write_line(line)?;
        }
        Ok(())
    }

    /// Write the column names of the schema line for `line_type` as a header row.
    pub fn write_header(&mut self, line_type: &str) -> CodecResult<()> {
        let result = self.header(line_type);
        self.observe(result)
    }

    pub fn stats(&self) -> PassStats {
        let mut stats = self.stats;
        stats.errors = self.sink.recorded();
        stats
    }

    /// Flush the output and report the pass outcome.
    pub fn finish(mut self) -> CodecResult<PassStats> {
        let result = self.out.flush().map_err(CodecError::from).map(|()| self.stats());
        if !self.failed {
            let c = self.composer;
            report_outcome(c.options.observer.as_ref(), &c.context(), c.options.alert_at_or_above, &result);
        }
        if let Ok(stats) = &result {
            tracing::debug!(
                lines = stats.lines,
                errors = stats.errors,
                omitted = stats.omitted,
                "compose pass finished"
            );
        }
        result
    }

    fn observe<T>(&mut self, result: CodecResult<T>) -> CodecResult<T> {
        if let Err(e) = &result {
            if !self.failed {
                self.failed = true;
                let c = self.composer;
                report_failure(c.options.observer.as_ref(), &c.context(), c.options.alert_at_or_above, e);
            }
        }
        result
    }

    fn header(&mut self, line_type: &str) -> CodecResult<()> {
        let composer = self.composer;
        let Some(index) = composer.lookup_line(line_type) else {
            return Err(CodecError::config(format!("no schema line '{line_type}' to write a header for")));
        };
        let def = &composer.schema.lines[index];
        let texts: Vec<Option<String>> = def
            .cells
            .iter()
            .map(|c| match (c.ignore_write, composer.schema.kind) {
                (false, _) => Some(c.name.clone()),
                (true, SchemaKind::FixedWidth) => Some(String::new()),
                (true, SchemaKind::Delimited) => None,
            })
            .collect();
        let text = encode_line(composer.schema.kind, def, &composer.plan.lines[index], &texts)?;
        self.header_written = true;
        self.emit(&text)
    }

    fn compose_line(&mut self, line: &Line) -> CodecResult<()> {
        let composer = self.composer;
        let number = line.line_number();
        let index = *self
            .line_lookup
            .get_or_try_insert_with(line.line_type().to_owned(), |t| {
                Ok::<_, CodecError>(composer.lookup_line(t))
            })?;
        let Some(index) = index else {
            self.stats.omitted += 1;
            let err = RecordError::line(
                ErrorKind::NoMatchingSchemaLine,
                number,
                format!("no schema line for line type '{}'", line.line_type()),
            )
            .with_line_type(line.line_type());
            self.sink.report(err)?;
            return Ok(());
        };

        let def = &composer.schema.lines[index];
        if def.ignore_write {
            return Ok(());
        }
        let line_plan = &composer.plan.lines[index];

        let mut texts = Vec::with_capacity(def.cells.len());
        for (cell_def, cell_plan) in def.cells.iter().zip(&line_plan.cells) {
            if cell_def.ignore_write {
                texts.push(match composer.schema.kind {
                    SchemaKind::FixedWidth => Some(String::new()),
                    SchemaKind::Delimited => None,
                });
                continue;
            }
            match self.cell_text(line, &def.line_type, cell_def, cell_plan)? {
                Some(text) => texts.push(Some(text)),
                None => {
                    self.stats.omitted += 1;
                    return Ok(());
                }
            }
        }

        if def.first_line_as_header && composer.options.write_header && !self.header_written {
            self.header(&def.line_type)?;
        }
        let text = encode_line(composer.schema.kind, def, line_plan, &texts)?;
        self.emit(&text)?;
        self.stats.lines += 1;
        tracing::trace!(line_number = number, line_type = %def.line_type, "line composed");
        Ok(())
    }

    /// External text of one cell, or `None` when the line is to be omitted.
    fn cell_text(
        &mut self,
        line: &Line,
        line_type: &str,
        cell_def: &SchemaCell,
        cell_plan: &CellPlan,
    ) -> CodecResult<Option<String>> {
        let number = line.line_number();
        let fallback_text = || cell_def.default_value.clone().unwrap_or_default();

        let cell = line.get(&cell_def.name).filter(|c| !c.is_empty());
        let Some(cell) = cell else {
            if !cell_def.mandatory {
                return Ok(Some(fallback_text()));
            }
            let err = RecordError::missing_mandatory(number, line_type, &cell_def.name);
            return Ok(match self.sink.report(err)? {
                Outcome::Keep => Some(fallback_text()),
                Outcome::OmitCell => Some(String::new()),
                Outcome::OmitLine => None,
            });
        };

        match Self::format_cell(cell, cell_def, cell_plan) {
            Ok(text) => Ok(Some(text)),
            Err(cause) => {
                let raw = cell.value().to_string();
                let err = RecordError::conversion(number, line_type, &cell_def.name, &raw, cause);
                Ok(match self.sink.report(err)? {
                    Outcome::Keep => Some(fallback_text()),
                    Outcome::OmitCell => Some(String::new()),
                    Outcome::OmitLine => None,
                })
            }
        }
    }

    /// Render with the schema cell's format.
    ///
    /// A numeric text wider than its fixed-width field is rejected rather than truncated.
    fn format_cell(cell: &Cell, cell_def: &SchemaCell, cell_plan: &CellPlan) -> Result<String, ConversionError> {
        let text = cell_plan.format.format(cell.value()).map_err(|err| {
            if cell.cell_type() == cell_def.cell_type {
                return err;
            }
            ConversionError::new(
                err.expected,
                format!("{:?} value in {:?} cell: {}", cell.cell_type(), cell_def.cell_type, err.message),
            )
        })?;
        if let Some(padder) = cell_plan.padder.filter(|_| cell_def.cell_type.is_numeric()) {
            let width = padder.width();
            if text.chars().count() > width {
                return Err(ConversionError::new(
                    format!("at most {width} characters"),
                    format!("{text} does not fit a field of width {width}"),
                ));
            }
        }
        Ok(text)
    }

    fn emit(&mut self, text: &str) -> CodecResult<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.write_all(self.composer.schema.line_separator.as_bytes())?;
        Ok(())
    }
}
