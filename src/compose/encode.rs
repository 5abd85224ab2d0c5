//! Assembly of cell texts into one physical line.

use std::io;

use crate::error::{CodecError, CodecResult};
use crate::schema::plan::LinePlan;
use crate::schema::{SchemaKind, SchemaLine};
use crate::text::QuoteMode;
use crate::text::pad::char_slice;

/// Join the texts of a line's cells. `texts` is parallel to `def.cells`; `None` marks a cell
/// that is not written.
pub(crate) fn encode_line(
    kind: SchemaKind,
    def: &SchemaLine,
    plan: &LinePlan,
    texts: &[Option<String>],
) -> CodecResult<String> {
    match kind {
        SchemaKind::FixedWidth => Ok(encode_fixed(def, plan, texts)),
        SchemaKind::Delimited => encode_delimited(def, plan, texts),
    }
}

fn encode_fixed(def: &SchemaLine, plan: &LinePlan, texts: &[Option<String>]) -> String {
    let mut out = String::new();
    for (cell, text) in plan.cells.iter().zip(texts) {
        if let Some(padder) = &cell.padder {
            out.push_str(&padder.fill(text.as_deref().unwrap_or("")));
        }
    }
    if let Some(len) = def.line_length {
        let have = out.chars().count();
        out.extend(std::iter::repeat_n(def.line_fill, len.saturating_sub(have)));
    }
    out
}

fn encode_delimited(def: &SchemaLine, plan: &LinePlan, texts: &[Option<String>]) -> CodecResult<String> {
    let fields: Vec<String> = def
        .cells
        .iter()
        .zip(&plan.cells)
        .zip(texts)
        .filter_map(|((cell_def, cell), text)| {
            let text = text.as_deref()?;
            Some(match &cell.quoter {
                Some(quoter) => quoter.encode(text),
                None => match cell_def.max_length {
                    Some(max) => char_slice(text, 0, max).to_owned(),
                    None => text.to_owned(),
                },
            })
        })
        .collect();

    match def.quoting.mode {
        QuoteMode::AsNeeded => join_csv(&fields, def.delimiter as u8, def.quoting.quote as u8),
        QuoteMode::Never | QuoteMode::Always | QuoteMode::AlwaysRfc => {
            let mut sep = [0u8; 4];
            Ok(fields.join(&*def.delimiter.encode_utf8(&mut sep)))
        }
    }
}

/// RFC 4180 record writing via the `csv` crate: only cells that need it are quoted.
fn join_csv(fields: &[String], delimiter: u8, quote: u8) -> CodecResult<String> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .quote(quote)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record(fields)?;
    let bytes = wtr.into_inner().map_err(|e| CodecError::Io(e.into_error()))?;
    let mut text = String::from_utf8(bytes).map_err(|e| CodecError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}
