//! Parse → transform → compose in one streaming pass.
//!
//! A [`Converter`] pairs a [`Parser`] for the input layout with a [`Composer`] for the
//! output layout. Each parsed line runs through the registered transforms in registration
//! order; a transform returning `None` drops the line. Both directions report to the same
//! error sink.

use std::cell::RefCell;
use std::fmt;
use std::io::{Read, Write};

use crate::compose::Composer;
use crate::error::{CodecError, CodecResult, RecordError};
use crate::observability::PassStats;
use crate::parse::Parser;
use crate::types::Line;
use crate::validation::{CollectingSink, ErrorSink};

type Transform = Box<dyn FnMut(Line) -> Option<Line> + Send>;

/// Counters of a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    pub parsed: PassStats,
    pub composed: PassStats,
    /// Lines dropped by a transform.
    pub dropped: usize,
}

pub struct Converter {
    parser: Parser,
    composer: Composer,
    transforms: Vec<Transform>,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("parser", &self.parser)
            .field("composer", &self.composer)
            .field("transforms_len", &self.transforms.len())
            .finish()
    }
}

impl Converter {
    pub fn new(parser: Parser, composer: Composer) -> Self {
        Self {
            parser,
            composer,
            transforms: Vec::new(),
        }
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: FnMut(Line) -> Option<Line> + Send + 'static,
    {
        self.add_transform(transform);
        self
    }

    pub fn add_transform<F>(&mut self, transform: F)
    where
        F: FnMut(Line) -> Option<Line> + Send + 'static,
    {
        self.transforms.push(Box::new(transform));
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Convert everything `reader` yields into `out`.
    pub fn convert<R: Read, W: Write>(
        &mut self,
        reader: R,
        out: W,
        sink: &mut dyn ErrorSink,
    ) -> CodecResult<ConvertStats> {
        let shared = RefCell::new(sink);
        let mut parse_sink = SharedSink(&shared);
        let mut compose_sink = SharedSink(&shared);
        let mut writer = self.composer.writer(out, &mut compose_sink);
        let transforms = &mut self.transforms;
        let mut dropped = 0;

        let parsed = self.parser.parse_with(reader, &mut parse_sink, |line| {
            match apply(transforms, line) {
                Some(line) => writer.write_line(&line),
                None => {
                    dropped += 1;
                    Ok(())
                }
            }
        })?;
        let composed = writer.finish()?;
        tracing::debug!(parsed = parsed.lines, composed = composed.lines, dropped, "conversion finished");
        Ok(ConvertStats {
            parsed,
            composed,
            dropped,
        })
    }

    /// Convert `text`, collecting recorded errors of both directions.
    pub fn convert_str(&mut self, text: &str) -> CodecResult<(String, Vec<RecordError>)> {
        let mut errors = CollectingSink::new();
        let mut out = Vec::new();
        self.convert(text.as_bytes(), &mut out, &mut errors)?;
        let text = String::from_utf8(out).map_err(|e| {
            CodecError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;
        Ok((text, errors.into_errors()))
    }
}

fn apply(transforms: &mut [Transform], line: Line) -> Option<Line> {
    transforms.iter_mut().try_fold(line, |line, transform| transform(line))
}

/// Lets the parse pass and the compose pass record into one sink. Records never nest: the
/// parser reports between lines, the composer while a line is written.
struct SharedSink<'a, 'b>(&'a RefCell<&'b mut dyn ErrorSink>);

impl ErrorSink for SharedSink<'_, '_> {
    fn record(&mut self, error: RecordError) -> CodecResult<()> {
        self.0.borrow_mut().record(error)
    }
}
