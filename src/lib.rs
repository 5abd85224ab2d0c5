//! `flatcodec` reads and writes flat files (delimited/CSV and fixed-width) according to a
//! user-provided [`schema::Schema`], converting between raw text and typed
//! [`types::Line`]s in both directions.
//!
//! The two entrypoints are [`parse::Parser`] (text → lines) and [`compose::Composer`]
//! (lines → text). Both compile the schema once on construction, so invalid formats are
//! reported before any text is touched, and both route every recoverable problem through
//! the same [`validation`] protocol.
//!
//! ## What a schema describes
//!
//! - **Layouts**: delimited lines (any delimiter, RFC 4180 or custom quoting) and fixed-width
//!   lines (per-cell width, left/right/both padding, optional line length), including
//!   files with no line separator at all (fixed-size records).
//! - **Cell types**: [`types::CellType::String`], [`types::CellType::Integer`],
//!   [`types::CellType::Float`], [`types::CellType::Decimal`], [`types::CellType::Boolean`],
//!   [`types::CellType::Date`], [`types::CellType::DateTime`] and
//!   [`types::CellType::Custom`], each with an optional [`format::FormatSpec`] and locale.
//! - **Line types**: one schema line for the whole file, or several selected by a control
//!   cell value or by per-cell regex conditions.
//!
//! Empty input text maps to an empty cell ([`types::CellValue::Empty`]) unless the cell
//! declares a default value or is mandatory.
//!
//! ## Quick example: parse, edit, compose
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use flatcodec::compose::{ComposeOptions, Composer};
//! use flatcodec::parse::{ParseOptions, Parser};
//! use flatcodec::schema::{Schema, SchemaCell, SchemaLine};
//! use flatcodec::text::PadPolicy;
//! use flatcodec::types::{Cell, CellType, CellValue, Document};
//!
//! # fn main() -> Result<(), flatcodec::CodecError> {
//! let schema = Arc::new(
//!     Schema::fixed_width().with_line(
//!         SchemaLine::new("account")
//!             .with_cell(SchemaCell::new("id", CellType::String).with_width(6))
//!             .with_cell(
//!                 SchemaCell::new("balance", CellType::Integer)
//!                     .with_width(8)
//!                     .with_padding(PadPolicy::LeftPad, '0'),
//!             ),
//!     ),
//! );
//!
//! let parser = Parser::new(schema.clone(), ParseOptions::default())?;
//! let (doc, errors) = parser.parse_str("AC-001000000150\n")?;
//! assert!(errors.is_empty());
//! assert_eq!(doc.lines()[0].get_value("balance"), &CellValue::Integer(150));
//!
//! let mut lines = doc.into_lines();
//! lines[0].add(Cell::new("balance", -20));
//! let doc = Document::from_lines(lines);
//!
//! let composer = Composer::new(schema, ComposeOptions::default())?;
//! let (text, _) = composer.compose_to_string(&doc)?;
//! assert_eq!(text, "AC-001-0000020\n");
//! # Ok(())
//! # }
//! ```
//!
//! ## Validation
//!
//! Conversion failures, missing mandatory cells, unmatched line types and lines without a
//! schema line are each handled by the [`validation::ValidationAction`] configured for them:
//! report to the [`validation::ErrorSink`] and continue, abort the pass, ignore, or drop the
//! line or cell. A pass with `max_errors` set fails with
//! [`CodecError::MaxErrorsExceeded`] carrying every recorded error.
//!
//! ## Modules
//!
//! - [`types`]: cells, lines and documents
//! - [`format`]: format providers (numbers, booleans, dates, patterns, enumerations)
//! - [`schema`]: the schema consumed by both engines, buildable in code or from JSON
//! - [`parse`] / [`compose`]: the two engines
//! - [`convert`]: parse → transform → compose pipeline
//! - [`mapping`]: mapping lines to and from caller structs
//! - [`validation`]: validation actions and error sinks
//! - [`observability`]: pass outcome observers
//! - [`text`]: padding and quoting engines
//! - [`cache`]: the bounded cache used for formats and line lookups
//! - [`error`]: error types used across the crate

pub mod cache;
pub mod compose;
pub mod convert;
pub mod error;
pub mod format;
pub mod mapping;
pub mod observability;
pub mod parse;
pub mod schema;
pub mod text;
pub mod types;
pub mod validation;

pub use error::{CodecError, CodecResult};
