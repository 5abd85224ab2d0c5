//! Line typing: which schema line describes a physical line.

use crate::error::CodecResult;
use crate::schema::plan::SchemaPlan;
use crate::schema::{LineTyping, Schema, SchemaKind};

use super::split::{LineText, unquote_lenient};

/// Index of the schema line matching `text`, or `None` when no line matches.
pub(crate) fn select_line(schema: &Schema, plan: &SchemaPlan, text: &mut LineText<'_>) -> CodecResult<Option<usize>> {
    match &schema.line_typing {
        LineTyping::Single => Ok(Some(
            schema.lines.iter().position(|l| !l.ignore_read).unwrap_or(0),
        )),
        LineTyping::ControlCell { cell_index } => {
            for (i, line) in schema.lines.iter().enumerate() {
                let raw = raw_cell(schema, plan, i, *cell_index, text)?;
                if line.control_value.as_deref() == Some(raw.as_str()) {
                    return Ok(Some(i));
                }
            }
            Ok(None)
        }
        LineTyping::ByCondition => {
            for (i, line) in plan.lines.iter().enumerate() {
                let mut matched = true;
                for (c, cell) in line.cells.iter().enumerate() {
                    let Some(condition) = &cell.condition else {
                        continue;
                    };
                    if !condition.is_match(&raw_cell(schema, plan, i, c, text)?) {
                        matched = false;
                        break;
                    }
                }
                if matched {
                    return Ok(Some(i));
                }
            }
            Ok(None)
        }
    }
}

/// Unquoted, unpadded text of cell `cell` as laid out by schema line `line`.
fn raw_cell(schema: &Schema, plan: &SchemaPlan, line: usize, cell: usize, text: &mut LineText<'_>) -> CodecResult<String> {
    let def = &schema.lines[line];
    match schema.kind {
        SchemaKind::FixedWidth => {
            let lp = &plan.lines[line];
            Ok(match lp.cells[cell].padder.as_ref() {
                Some(padder) => text.fixed_cell(lp.offsets[cell], padder).to_owned(),
                None => String::new(),
            })
        }
        SchemaKind::Delimited => Ok(text
            .tokens(def)?
            .get(cell)
            .map(|t| unquote_lenient(t, &def.quoting))
            .unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::select_line;
    use crate::parse::split::LineText;
    use crate::schema::plan::SchemaPlan;
    use crate::schema::{LineTyping, Schema, SchemaCell, SchemaLine};
    use crate::types::CellType;

    fn select(schema: &Schema, text: &str) -> Option<usize> {
        let plan = SchemaPlan::compile(schema).unwrap();
        select_line(schema, &plan, &mut LineText::new(text)).unwrap()
    }

    #[test]
    fn control_cell_uses_each_lines_layout() {
        let schema = Schema::fixed_width()
            .with_line_typing(LineTyping::ControlCell { cell_index: 0 })
            .with_line(
                SchemaLine::new("header")
                    .with_control_value("H")
                    .with_cell(SchemaCell::new("tag", CellType::String).with_width(1))
                    .with_cell(SchemaCell::new("date", CellType::String).with_width(8)),
            )
            .with_line(
                SchemaLine::new("detail")
                    .with_control_value("D1")
                    .with_cell(SchemaCell::new("tag", CellType::String).with_width(2))
                    .with_cell(SchemaCell::new("amount", CellType::String).with_width(6)),
            );
        assert_eq!(select(&schema, "H20240101"), Some(0));
        assert_eq!(select(&schema, "D1000100"), Some(1));
        assert_eq!(select(&schema, "X1"), None);
    }

    #[test]
    fn control_cell_in_quoted_delimited_line() {
        let schema = Schema::delimited()
            .with_line_typing(LineTyping::ControlCell { cell_index: 1 })
            .with_line(
                SchemaLine::new("a")
                    .with_control_value("A")
                    .with_cell(SchemaCell::new("x", CellType::String))
                    .with_cell(SchemaCell::new("t", CellType::String)),
            )
            .with_line(
                SchemaLine::new("b")
                    .with_control_value("B")
                    .with_cell(SchemaCell::new("x", CellType::String))
                    .with_cell(SchemaCell::new("t", CellType::String)),
            );
        assert_eq!(select(&schema, "1,\"B\""), Some(1));
        assert_eq!(select(&schema, "1"), None);
    }

    #[test]
    fn by_condition_picks_first_full_match() {
        let schema = Schema::delimited()
            .with_line_typing(LineTyping::ByCondition)
            .with_line(
                SchemaLine::new("numbers")
                    .with_cell(SchemaCell::new("a", CellType::String).with_line_condition("[0-9]+"))
                    .with_cell(SchemaCell::new("b", CellType::String).with_line_condition("[0-9]+")),
            )
            .with_line(SchemaLine::new("anything").with_cell(SchemaCell::new("a", CellType::String)));
        assert_eq!(select(&schema, "12,34"), Some(0));
        assert_eq!(select(&schema, "12,x"), Some(1));
    }

    #[test]
    fn single_skips_read_ignored_lines() {
        let schema = Schema::delimited()
            .with_line(SchemaLine::new("skip").ignore_read())
            .with_line(SchemaLine::new("main"));
        assert_eq!(select(&schema, "x"), Some(1));
    }
}
