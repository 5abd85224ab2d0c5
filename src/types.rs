//! Core record model: typed [`Cell`]s grouped into [`Line`]s, optionally collected in a
//! [`Document`].

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

/// Logical type of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    /// UTF-8 string.
    String,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point number.
    Float,
    /// Exact decimal number.
    Decimal,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Date with time of day.
    DateTime,
    /// String constrained by a custom pattern.
    Custom,
}

impl CellType {
    pub fn is_numeric(self) -> bool {
        matches!(self, CellType::Integer | CellType::Float | CellType::Decimal)
    }
}

/// Typed payload of a cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// No value. The owning cell still reports its declared type.
    Empty,
    String(String),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Custom(String),
}

impl CellValue {
    /// The cell type this payload belongs to, or `None` for [`CellValue::Empty`].
    pub fn cell_type(&self) -> Option<CellType> {
        match self {
            CellValue::Empty => None,
            CellValue::String(_) => Some(CellType::String),
            CellValue::Integer(_) => Some(CellType::Integer),
            CellValue::Float(_) => Some(CellType::Float),
            CellValue::Decimal(_) => Some(CellType::Decimal),
            CellValue::Boolean(_) => Some(CellType::Boolean),
            CellValue::Date(_) => Some(CellType::Date),
            CellValue::DateTime(_) => Some(CellType::DateTime),
            CellValue::Custom(_) => Some(CellType::Custom),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Numeric payload as a decimal. Floats that cannot be represented return `None`.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            CellValue::Integer(v) => Some(Decimal::from(*v)),
            CellValue::Decimal(v) => Some(*v),
            CellValue::Float(v) => Decimal::from_f64(*v),
            _ => None,
        }
    }

    /// Numeric payload as a double.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(v) => Some(*v as f64),
            CellValue::Float(v) => Some(*v),
            CellValue::Decimal(v) => v.to_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) | CellValue::Custom(s) => Some(s),
            _ => None,
        }
    }
}

/// Type-default string conversion, used when no cell format is available.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::String(s) | CellValue::Custom(s) => f.write_str(s),
            CellValue::Integer(v) => write!(f, "{v}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Decimal(v) => write!(f, "{v}"),
            CellValue::Boolean(v) => write!(f, "{v}"),
            CellValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            CellValue::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(impl From<$t> for CellValue {
            fn from(v: $t) -> Self {
                CellValue::$variant(v.into())
            }
        })*
    };
}

impl_from_for_value!(
    String => String,
    &str => String,
    i64 => Integer,
    i32 => Integer,
    f64 => Float,
    Decimal => Decimal,
    bool => Boolean,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
);

/// A single named, typed value within a [`Line`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    name: String,
    cell_type: CellType,
    value: CellValue,
}

impl Cell {
    /// Create a cell whose type is taken from the value.
    ///
    /// An [`CellValue::Empty`] value produces an empty `String` cell; use [`Cell::empty`] to
    /// declare another type.
    pub fn new(name: impl Into<String>, value: impl Into<CellValue>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            cell_type: value.cell_type().unwrap_or(CellType::String),
            value,
        }
    }

    /// Create a cell without a value.
    pub fn empty(name: impl Into<String>, cell_type: CellType) -> Self {
        Self {
            name: name.into(),
            cell_type,
            value: CellValue::Empty,
        }
    }

    /// Create a cell with a declared type, checking that the payload agrees.
    pub fn typed(name: impl Into<String>, cell_type: CellType, value: CellValue) -> CodecResult<Self> {
        let mut cell = Self::empty(name, cell_type);
        cell.set_value(value)?;
        Ok(cell)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn value(&self) -> &CellValue {
        &self.value
    }

    pub fn into_value(self) -> CellValue {
        self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Replace the value. The payload must agree with the declared type (or be empty).
    pub fn set_value(&mut self, value: CellValue) -> CodecResult<()> {
        match value.cell_type() {
            Some(actual) if actual != self.cell_type => Err(CodecError::TypeMismatch {
                cell: self.name.clone(),
                expected: self.cell_type,
                actual,
            }),
            _ => {
                self.value = value;
                Ok(())
            }
        }
    }

    /// Compare two numeric cells, converting both to a common representation.
    ///
    /// Doubles are compared when either side is a `Float`; otherwise the values are compared
    /// as exact decimals. Empty or non-numeric cells are an error.
    pub fn compare_numeric(&self, other: &Cell) -> CodecResult<Ordering> {
        let not_numeric = |c: &Cell| CodecError::NotNumeric {
            cell: c.name.clone(),
            cell_type: c.cell_type,
        };
        if !self.cell_type.is_numeric() || self.is_empty() {
            return Err(not_numeric(self));
        }
        if !other.cell_type.is_numeric() || other.is_empty() {
            return Err(not_numeric(other));
        }

        let either_float = matches!(self.value, CellValue::Float(_))
            || matches!(other.value, CellValue::Float(_));
        if !either_float {
            if let (Some(a), Some(b)) = (self.value.as_decimal(), other.value.as_decimal()) {
                return Ok(a.cmp(&b));
            }
        }
        let a = self.value.as_f64().ok_or_else(|| not_numeric(self))?;
        let b = other.value.as_f64().ok_or_else(|| not_numeric(other))?;
        a.partial_cmp(&b).ok_or_else(|| not_numeric(if a.is_nan() { self } else { other }))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// An ordered collection of uniquely named cells tagged with a line type and number.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Line {
    line_type: String,
    line_number: usize,
    cells: Vec<Cell>,
}

impl Line {
    pub fn new(line_type: impl Into<String>) -> Self {
        Self {
            line_type: line_type.into(),
            line_number: 0,
            cells: Vec::new(),
        }
    }

    pub fn with_capacity(line_type: impl Into<String>, capacity: usize) -> Self {
        Self {
            line_type: line_type.into(),
            line_number: 0,
            cells: Vec::with_capacity(capacity),
        }
    }

    /// Builder-style [`Line::add`].
    pub fn with_cell(mut self, cell: Cell) -> Self {
        self.add(cell);
        self
    }

    pub fn line_type(&self) -> &str {
        &self.line_type
    }

    pub fn set_line_type(&mut self, line_type: impl Into<String>) {
        self.line_type = line_type.into();
    }

    /// 1-based line number; zero when the line was not produced by a parser.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn set_line_number(&mut self, line_number: usize) {
        self.line_number = line_number;
    }

    /// Add a cell. A cell with the same name is replaced in place (last write wins).
    pub fn add(&mut self, cell: Cell) {
        match self.cells.iter_mut().find(|c| c.name == cell.name) {
            Some(existing) => *existing = cell,
            None => self.cells.push(cell),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.name == name)
    }

    /// The value of a named cell; [`CellValue::Empty`] when the cell is absent.
    pub fn get_value(&self, name: &str) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.get(name).map(Cell::value).unwrap_or(&EMPTY)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Cell> {
        let idx = self.cells.iter().position(|c| c.name == name)?;
        Some(self.cells.remove(idx))
    }

    /// Cells in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{} [", self.line_type, self.line_number)?;
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{cell}")?;
        }
        f.write_str("]")
    }
}

/// Batch container for a fully materialized sequence of [`Line`]s.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    lines: Vec<Line>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<Line> {
        self.lines
    }

    /// Lines of one line type, in document order.
    pub fn lines_of_type<'a>(&'a self, line_type: &'a str) -> impl Iterator<Item = &'a Line> + 'a {
        self.lines.iter().filter(move |l| l.line_type == line_type)
    }

    /// Create a new document containing only lines that match `predicate`.
    pub fn filter_lines<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Line) -> bool,
    {
        Self {
            lines: self.lines.iter().filter(|l| predicate(l)).cloned().collect(),
        }
    }
}

impl IntoIterator for Document {
    type Item = Line;
    type IntoIter = std::vec::IntoIter<Line>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.into_iter()
    }
}

impl Extend<Line> for Document {
    fn extend<T: IntoIterator<Item = Line>>(&mut self, iter: T) {
        self.lines.extend(iter);
    }
}
