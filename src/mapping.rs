//! Mapping between [`Line`]s and caller structs through a table of named accessors.
//!
//! ```
//! use flatcodec::mapping::RecordMapper;
//! use flatcodec::types::{CellValue, Line};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! # fn main() -> Result<(), flatcodec::CodecError> {
//! let mapper = RecordMapper::<Person>::new("person")
//!     .field("name", |p| p.name.as_str().into(), |p, v| {
//!         p.name = v.try_into()?;
//!         Ok(())
//!     })
//!     .field("age", |p| p.age.into(), |p, v| {
//!         p.age = v.try_into()?;
//!         Ok(())
//!     });
//!
//! let ada = Person { name: "Ada".into(), age: 36 };
//! let line = mapper.to_line(&ada);
//! assert_eq!(line.get_value("age"), &CellValue::Integer(36));
//! assert_eq!(mapper.from_line(&line)?, ada);
//! # Ok(())
//! # }
//! ```

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{CodecResult, ConversionError, RecordError};
use crate::types::{Cell, CellValue, Line};

pub type Getter<T> = fn(&T) -> CellValue;
pub type Setter<T> = fn(&mut T, &CellValue) -> Result<(), ConversionError>;

struct Field<T> {
    name: &'static str,
    get: Getter<T>,
    set: Setter<T>,
}

/// Converts values of `T` to and from lines of one line type.
pub struct RecordMapper<T> {
    line_type: String,
    fields: Vec<Field<T>>,
}

impl<T> fmt::Debug for RecordMapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordMapper")
            .field("line_type", &self.line_type)
            .field("fields", &self.fields.iter().map(|f| f.name).collect::<Vec<_>>())
            .finish()
    }
}

impl<T> RecordMapper<T> {
    pub fn new(line_type: impl Into<String>) -> Self {
        Self {
            line_type: line_type.into(),
            fields: Vec::new(),
        }
    }

    /// Register the accessors of the cell `name`. Cells are written in registration order.
    pub fn field(mut self, name: &'static str, get: Getter<T>, set: Setter<T>) -> Self {
        self.fields.push(Field { name, get, set });
        self
    }

    pub fn line_type(&self) -> &str {
        &self.line_type
    }

    pub fn to_line(&self, value: &T) -> Line {
        let mut line = Line::with_capacity(self.line_type.as_str(), self.fields.len());
        for field in &self.fields {
            line.add(Cell::new(field.name, (field.get)(value)));
        }
        line
    }

    /// Set every registered field whose cell is present and non-empty in `line`.
    ///
    /// A value the setter rejects fails with a conversion [`RecordError`].
    pub fn fill_from_line(&self, line: &Line, target: &mut T) -> CodecResult<()> {
        for field in &self.fields {
            let Some(cell) = line.get(field.name).filter(|c| !c.is_empty()) else {
                continue;
            };
            (field.set)(target, cell.value()).map_err(|err| {
                RecordError::conversion(
                    line.line_number(),
                    line.line_type(),
                    field.name,
                    &cell.value().to_string(),
                    err,
                )
            })?;
        }
        Ok(())
    }

    pub fn from_line(&self, line: &Line) -> CodecResult<T>
    where
        T: Default,
    {
        let mut value = T::default();
        self.fill_from_line(line, &mut value)?;
        Ok(value)
    }
}

fn mismatch(expected: &str, value: &CellValue) -> ConversionError {
    ConversionError::new(expected, format!("cannot convert {:?} value", value.cell_type()))
}

impl TryFrom<&CellValue> for String {
    type Error = ConversionError;

    fn try_from(value: &CellValue) -> Result<Self, Self::Error> {
        match value {
            CellValue::String(s) | CellValue::Custom(s) => Ok(s.clone()),
            other => Err(mismatch("string", other)),
        }
    }
}

impl TryFrom<&CellValue> for i64 {
    type Error = ConversionError;

    fn try_from(value: &CellValue) -> Result<Self, Self::Error> {
        match value {
            CellValue::Integer(v) => Ok(*v),
            CellValue::Decimal(d) if d.fract().is_zero() => d.to_i64().ok_or_else(|| mismatch("i64", value)),
            other => Err(mismatch("i64", other)),
        }
    }
}

impl TryFrom<&CellValue> for i32 {
    type Error = ConversionError;

    fn try_from(value: &CellValue) -> Result<Self, Self::Error> {
        let wide = i64::try_from(value).map_err(|_| mismatch("i32", value))?;
        i32::try_from(wide).map_err(|_| ConversionError::new("i32", format!("{wide} is out of range")))
    }
}

impl TryFrom<&CellValue> for f64 {
    type Error = ConversionError;

    fn try_from(value: &CellValue) -> Result<Self, Self::Error> {
        value.as_f64().ok_or_else(|| mismatch("f64", value))
    }
}

impl TryFrom<&CellValue> for Decimal {
    type Error = ConversionError;

    fn try_from(value: &CellValue) -> Result<Self, Self::Error> {
        match value {
            CellValue::Decimal(d) => Ok(*d),
            CellValue::Integer(v) => Ok(Decimal::from(*v)),
            other => Err(mismatch("decimal", other)),
        }
    }
}

impl TryFrom<&CellValue> for bool {
    type Error = ConversionError;

    fn try_from(value: &CellValue) -> Result<Self, Self::Error> {
        match value {
            CellValue::Boolean(b) => Ok(*b),
            other => Err(mismatch("boolean", other)),
        }
    }
}

impl TryFrom<&CellValue> for NaiveDate {
    type Error = ConversionError;

    fn try_from(value: &CellValue) -> Result<Self, Self::Error> {
        match value {
            CellValue::Date(d) => Ok(*d),
            CellValue::DateTime(dt) => Ok(dt.date()),
            other => Err(mismatch("date", other)),
        }
    }
}

impl TryFrom<&CellValue> for NaiveDateTime {
    type Error = ConversionError;

    fn try_from(value: &CellValue) -> Result<Self, Self::Error> {
        match value {
            CellValue::DateTime(dt) => Ok(*dt),
            other => Err(mismatch("date-time", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::RecordMapper;
    use crate::error::{CodecError, ErrorKind};
    use crate::types::{Cell, CellType, CellValue, Line};

    #[derive(Debug, Default, PartialEq)]
    struct Payment {
        reference: String,
        amount: Decimal,
        due: Option<NaiveDate>,
        count: i32,
    }

    fn mapper() -> RecordMapper<Payment> {
        RecordMapper::<Payment>::new("payment")
            .field("reference", |p| p.reference.as_str().into(), |p, v| {
                p.reference = v.try_into()?;
                Ok(())
            })
            .field("amount", |p| p.amount.into(), |p, v| {
                p.amount = v.try_into()?;
                Ok(())
            })
            .field(
                "due",
                |p| p.due.map_or(CellValue::Empty, CellValue::Date),
                |p, v| {
                    p.due = Some(v.try_into()?);
                    Ok(())
                },
            )
            .field("count", |p| p.count.into(), |p, v| {
                p.count = v.try_into()?;
                Ok(())
            })
    }

    #[test]
    fn line_round_trip_keeps_field_order() {
        let payment = Payment {
            reference: "INV-1".into(),
            amount: Decimal::new(1250, 2),
            due: NaiveDate::from_ymd_opt(2024, 3, 1),
            count: 2,
        };
        let line = mapper().to_line(&payment);
        assert_eq!(line.line_type(), "payment");
        let names: Vec<&str> = line.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["reference", "amount", "due", "count"]);
        assert_eq!(mapper().from_line(&line).unwrap(), payment);
    }

    #[test]
    fn empty_and_absent_cells_leave_defaults() {
        let line = Line::new("payment")
            .with_cell(Cell::new("reference", "X"))
            .with_cell(Cell::empty("due", CellType::Date));
        let p = mapper().from_line(&line).unwrap();
        assert_eq!(p.reference, "X");
        assert_eq!(p.due, None);
        assert_eq!(p.count, 0);
    }

    #[test]
    fn rejected_value_is_conversion_error() {
        let mut line = Line::new("payment").with_cell(Cell::new("count", i64::MAX));
        line.set_line_number(4);
        let err = mapper().from_line(&line).unwrap_err();
        match err {
            CodecError::Record(e) => {
                assert_eq!(e.kind, ErrorKind::Conversion);
                assert_eq!(e.line_number, 4);
                assert_eq!(e.cell_name.as_deref(), Some("count"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn numeric_conversions_widen() {
        assert_eq!(f64::try_from(&CellValue::Integer(3)).unwrap(), 3.0);
        assert_eq!(Decimal::try_from(&CellValue::Integer(3)).unwrap(), Decimal::from(3));
        assert_eq!(i64::try_from(&CellValue::Decimal(Decimal::new(700, 2))).unwrap(), 7);
        assert!(i64::try_from(&CellValue::Decimal(Decimal::new(705, 2))).is_err());
        assert!(bool::try_from(&CellValue::from("true")).is_err());
    }
}
