//! Decomposition of a physical line into raw cell texts.

use crate::cache::BoundedCache;
use crate::error::CodecResult;
use crate::schema::{Quoting, SchemaLine};
use crate::text::pad::char_slice;
use crate::text::{Padder, QuoteMode, Quoter};

/// One physical line plus its delimiter splits.
///
/// Typing may split the same text with several candidate layouts before the matched line
/// splits it again for conversion; the split of the last two layouts is kept.
pub(crate) struct LineText<'t> {
    pub(crate) text: &'t str,
    splits: BoundedCache<(char, Quoting), Vec<String>>,
}

impl<'t> LineText<'t> {
    pub(crate) fn new(text: &'t str) -> Self {
        Self {
            text,
            splits: BoundedCache::new(2),
        }
    }

    pub(crate) fn tokens(&mut self, line: &SchemaLine) -> CodecResult<&[String]> {
        let text = self.text;
        self.splits
            .get_or_try_insert_with((line.delimiter, line.quoting), |_| split_delimited(text, line))
            .map(Vec::as_slice)
    }

    /// Text of a fixed-width cell with its fill removed.
    pub(crate) fn fixed_cell(&self, offset: usize, padder: &Padder) -> &'t str {
        padder.strip(char_slice(self.text, offset, padder.width()))
    }

    /// Everything after the fixed-width cells, with trailing line fill removed.
    pub(crate) fn fixed_rest(&self, offset: usize, line_fill: char) -> &'t str {
        char_slice(self.text, offset, usize::MAX).trim_end_matches(line_fill)
    }
}

pub(crate) fn split_delimited(text: &str, line: &SchemaLine) -> CodecResult<Vec<String>> {
    let q = line.quoting;
    match q.mode {
        QuoteMode::Never => Ok(text.split(line.delimiter).map(str::to_owned).collect()),
        QuoteMode::AsNeeded => split_csv(text, line.delimiter as u8, q.quote as u8),
        QuoteMode::Always => Ok(split_quoted(text, line.delimiter, q.quote, q.escape, false)),
        QuoteMode::AlwaysRfc => Ok(split_quoted(text, line.delimiter, q.quote, q.quote, true)),
    }
}

/// RFC 4180 splitting of a single record via the `csv` crate.
fn split_csv(text: &str, delimiter: u8, quote: u8) -> CodecResult<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .quote(quote)
        .from_reader(text.as_bytes());
    let mut record = csv::StringRecord::new();
    if rdr.read_record(&mut record)? {
        Ok(record.iter().map(str::to_owned).collect())
    } else {
        Ok(vec![String::new()])
    }
}

/// Split on `delimiter` outside quoted sections. Tokens keep their quotes; a token that does
/// not start with the quote character is taken as is.
fn split_quoted(text: &str, delimiter: char, quote: char, escape: char, rfc: bool) -> Vec<String> {
    let doubling = rfc || escape == quote;
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            current.push(c);
            if !doubling && c == escape {
                current.extend(chars.next());
            } else if c == quote {
                let doubled = if doubling { chars.next_if_eq(&quote) } else { None };
                match doubled {
                    Some(q) => current.push(q),
                    None => in_quotes = false,
                }
            }
        } else if c == delimiter {
            fields.push(std::mem::take(&mut current));
        } else {
            in_quotes = c == quote && current.is_empty();
            current.push(c);
        }
    }
    fields.push(current);
    fields
}

/// Remove quoting from a token of an always-quoted line. Unquoted tokens are returned as is.
pub(crate) fn unquote(token: &str, quoter: &Quoter) -> CodecResult<String> {
    if token.starts_with(quoter.quote_char()) {
        quoter.decode(token)
    } else {
        Ok(token.to_owned())
    }
}

/// Like [`unquote`] but falls back to the raw token when it is malformed.
pub(crate) fn unquote_lenient(token: &str, quoting: &Quoting) -> String {
    let quoter = match quoting.mode {
        QuoteMode::Always => Quoter::always(quoting.quote, quoting.escape),
        QuoteMode::AlwaysRfc => Quoter::always_rfc(quoting.quote),
        QuoteMode::Never | QuoteMode::AsNeeded => return token.to_owned(),
    };
    unquote(token, &quoter).unwrap_or_else(|_| token.to_owned())
}
