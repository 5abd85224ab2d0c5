//! Eager compilation of a [`Schema`] into the per-cell objects the engines use.
//!
//! Compiling checks every layout rule and builds every cell format once, so configuration
//! errors surface when a parser or composer is constructed rather than mid-stream.

use regex::Regex;

use crate::cache::BoundedCache;
use crate::error::{CodecError, CodecResult};
use crate::format::{CellFormat, FormatKey, Locale};
use crate::text::{Padder, QuoteMode, Quoter};

use super::{LineTyping, Schema, SchemaCell, SchemaKind, SchemaLine};

#[derive(Debug)]
pub(crate) struct CellPlan {
    pub(crate) format: CellFormat,
    pub(crate) locale: Locale,
    /// Fixed-width schemas only.
    pub(crate) padder: Option<Padder>,
    /// `Always` / `AlwaysRfc` quoting only.
    pub(crate) quoter: Option<Quoter>,
    pub(crate) condition: Option<Regex>,
}

#[derive(Debug)]
pub(crate) struct LinePlan {
    /// Parallel to `SchemaLine::cells`.
    pub(crate) cells: Vec<CellPlan>,
    /// Character offset of each cell in a fixed-width line.
    pub(crate) offsets: Vec<usize>,
}

#[derive(Debug)]
pub(crate) struct SchemaPlan {
    pub(crate) lines: Vec<LinePlan>,
    /// Set when input is read as fixed-size records rather than separated lines.
    pub(crate) record_length: Option<usize>,
}

impl SchemaPlan {
    pub(crate) fn compile(schema: &Schema) -> CodecResult<Self> {
        if schema.lines.is_empty() {
            return Err(CodecError::config("schema declares no lines"));
        }
        if schema.lines.len() > 1 && schema.lines.iter().any(|l| l.first_line_as_header) {
            return Err(CodecError::config(
                "a header line is only supported on a schema with a single line type",
            ));
        }
        if schema.kind == SchemaKind::Delimited && schema.line_separator.is_empty() {
            return Err(CodecError::config("a delimited schema needs a line separator"));
        }
        let record_length = schema.fixed_record_length()?;

        let cell_count = schema.lines.iter().map(|l| l.cells.len()).sum::<usize>();
        let mut formats: BoundedCache<FormatKey, CellFormat> = BoundedCache::new(cell_count.max(1));
        let schema_locale = Locale::from_tag(&schema.locale)?;

        let mut lines = Vec::with_capacity(schema.lines.len());
        for line in &schema.lines {
            check_line(schema, line)?;
            let mut cells = Vec::with_capacity(line.cells.len());
            let mut offsets = Vec::with_capacity(line.cells.len());
            let mut offset = 0usize;
            for cell in &line.cells {
                offsets.push(offset);
                offset += cell.width.unwrap_or(0);
                cells.push(compile_cell(schema, line, cell, &schema_locale, &mut formats)?);
            }
            lines.push(LinePlan { cells, offsets });
        }

        tracing::debug!(lines = lines.len(), cells = cell_count, formats = formats.len(), "schema compiled");
        Ok(Self { lines, record_length })
    }
}

fn check_line(schema: &Schema, line: &SchemaLine) -> CodecResult<()> {
    let ctx = |msg: String| CodecError::config(format!("line '{}': {msg}", line.line_type));

    for (i, cell) in line.cells.iter().enumerate() {
        if line.cells[..i].iter().any(|c| c.name == cell.name) {
            return Err(ctx(format!("cell '{}' is declared twice", cell.name)));
        }
    }

    match schema.kind {
        SchemaKind::Delimited => {
            let q = line.quoting;
            if q.mode != QuoteMode::Never && q.quote == line.delimiter {
                return Err(ctx("quote character and delimiter must differ".to_owned()));
            }
            if q.mode == QuoteMode::AsNeeded && !(line.delimiter.is_ascii() && q.quote.is_ascii()) {
                return Err(ctx("as-needed quoting requires an ASCII delimiter and quote".to_owned()));
            }
        }
        SchemaKind::FixedWidth => {
            if let Some(cell) = line.cells.iter().find(|c| c.width.is_none()) {
                return Err(ctx(format!("fixed-width cell '{}' has no width", cell.name)));
            }
            let total: usize = line.cells.iter().filter_map(|c| c.width).sum();
            if let Some(len) = line.line_length {
                if len < total {
                    return Err(ctx(format!("line_length {len} is shorter than the cell widths ({total})")));
                }
            }
        }
    }

    if let LineTyping::ControlCell { cell_index } = schema.line_typing {
        if line.control_value.is_none() {
            return Err(ctx("control-cell typing needs a control_value".to_owned()));
        }
        if cell_index >= line.cells.len() {
            return Err(ctx(format!("control cell index {cell_index} is out of range")));
        }
    }
    Ok(())
}

fn compile_cell(
    schema: &Schema,
    line: &SchemaLine,
    cell: &SchemaCell,
    schema_locale: &Locale,
    formats: &mut BoundedCache<FormatKey, CellFormat>,
) -> CodecResult<CellPlan> {
    let ctx = |e: CodecError| match e {
        CodecError::FormatConfig { message } => CodecError::config(format!(
            "line '{}' cell '{}': {message}",
            line.line_type, cell.name
        )),
        other => other,
    };

    let locale = match &cell.locale {
        Some(tag) => Locale::from_tag(tag).map_err(ctx)?,
        None => schema_locale.clone(),
    };
    let key = FormatKey::new(cell.cell_type, cell.format.as_ref(), &locale);
    let format = formats
        .get_or_try_insert_with(key, |k| CellFormat::build(k.cell_type, k.spec.as_ref(), &locale))
        .map_err(ctx)?
        .clone();

    if let Some(default) = &cell.default_value {
        if let Err(err) = format.parse(default) {
            return Err(ctx(CodecError::config(format!("default value '{default}' is invalid: {err}"))));
        }
    }

    let padder = match schema.kind {
        SchemaKind::FixedWidth => Some(Padder::new(
            cell.width.unwrap_or(0),
            cell.padding.fill,
            cell.padding.policy,
        )),
        SchemaKind::Delimited => None,
    };

    let quoter = match (schema.kind, line.quoting.mode) {
        (SchemaKind::Delimited, QuoteMode::Always) => Some(
            Quoter::always(line.quoting.quote, line.quoting.escape)
                .with_max_len(cell.max_length)
                .map_err(ctx)?,
        ),
        (SchemaKind::Delimited, QuoteMode::AlwaysRfc) => Some(
            Quoter::always_rfc(line.quoting.quote)
                .with_max_len(cell.max_length)
                .map_err(ctx)?,
        ),
        _ => None,
    };

    let condition = match &cell.line_condition {
        Some(pattern) => Some(
            Regex::new(&format!("^(?:{pattern})$"))
                .map_err(|e| ctx(CodecError::config(format!("invalid line condition: {e}"))))?,
        ),
        None => None,
    };

    Ok(CellPlan {
        format,
        locale,
        padder,
        quoter,
        condition,
    })
}
