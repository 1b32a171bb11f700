//! Structural rules: resizing, sorting, rows, cells, ranges, columns and panes.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{with_column, ColumnScope, RuleInput};
use crate::columns::{are_adjacent, column_index, column_letter};
use crate::extract;
use crate::patterns::{self, RANGE_REF};
use crate::types::{Classification, Intent, Target};

static ALL_COLUMNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\ball\s+(?:the\s+)?columns\b|\bevery\s+column\b").unwrap());

static RESIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:resize|auto\s*-?fit|autofit|widen|narrow|(?:adjust|set|change)\s+(?:the\s+)?width|make\s+.+\s+(?:wider|narrower))\b|\bwidth\s+of\b").unwrap()
});

static WIDTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bto\s+(?P<to>\d+)\b|(?P<px>\d+)\s*(?:px|pixels?)\b").unwrap()
});

static HAS_COLUMN_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bcol(?:umn)?s?\b").unwrap());

pub(super) fn column_resize(input: &RuleInput) -> Option<Classification> {
    let text = input.text;
    if !RESIZE.is_match(text) || !HAS_COLUMN_WORD.is_match(text) {
        return None;
    }
    let scope = input.column_scope();
    let target = match (&scope, ALL_COLUMNS.is_match(text)) {
        (_, true) => Target::all_data(),
        (ColumnScope::Resolved(col), false) => Target::column(col.letter.clone()),
        _ => return None,
    };

    let mut c = Classification::new(
        Intent::ColumnOperation,
        "resize_column",
        target,
        0.9,
        "Column width change",
    );
    let width = WIDTH.captures(text).and_then(|caps| {
        caps.name("to")
            .or_else(|| caps.name("px"))
            .and_then(|m| m.as_str().parse::<u64>().ok())
    });
    c = match width {
        Some(width) => c.with_param("width", width),
        None if text.contains("wider") || text.contains("widen") => c.with_param("adjust", "wider"),
        None if text.contains("narrow") => c.with_param("adjust", "narrower"),
        None => c.with_param("auto_fit", true),
    };
    Some(match scope.column() {
        Some(col) => with_column(c, col),
        None => c,
    })
}

static SORT_VERB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:sort|order|arrange|rank)\b").unwrap());

static DESCENDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:desc|descending|decreasing|reverse|z\s*-\s*a|z\s+to\s+a|high(?:est)?\s+to\s+low(?:est)?|largest\s+(?:to\s+smallest|first)|biggest\s+first|newest\s+first)\b").unwrap()
});

pub(super) fn sort(input: &RuleInput) -> Option<Classification> {
    if !SORT_VERB.is_match(input.text) {
        return None;
    }
    let direction = if DESCENDING.is_match(input.text) {
        "desc"
    } else {
        "asc"
    };
    let scope = input.column_scope();
    let c = match &scope {
        ColumnScope::Resolved(col) => with_column(
            Classification::new(
                Intent::Sort,
                "sort_column",
                Target::column(col.letter.clone()),
                0.9,
                format!("Sort column {} {}", col.letter, direction),
            ),
            col,
        ),
        ColumnScope::Unspecified => Classification::new(
            Intent::Sort,
            "sort_data",
            Target::all_data(),
            0.9,
            format!("Sort all data {}", direction),
        ),
        ColumnScope::Unresolved => return None,
    };
    Some(c.with_param("direction", direction))
}

static INSERT_ROWS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:insert|add)\s+(?:(?P<count>\d+)\s+)?(?:a\s+|an\s+|one\s+)?(?:new\s+|blank\s+|empty\s+)?rows?\b(?P<rest>.*)$").unwrap()
});

static ROW_POSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?P<pos>above|below|before|after|at)\s+row\s+(?P<row>\d+)\b").unwrap()
});

static ROW_PAYLOAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s+(?:with|for|containing)\b").unwrap());

static DELETE_ROWS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:delete|remove|drop)\s+rows?\s+(?P<start>\d+)(?:\s*(?:-|to|through|thru)\s*(?P<end>\d+))?\b").unwrap()
});

static HIDE_ROWS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?P<verb>unhide|hide|show)\s+rows?\s+(?P<start>\d+)(?:\s*(?:-|to|through|thru)\s*(?P<end>\d+))?\b").unwrap()
});

/// Parse an inclusive row span in either order; returns (identifier, first, count).
fn row_span(start: &str, end: Option<&str>) -> Option<(String, u64, u64)> {
    let start: u64 = start.parse().ok()?;
    match end.and_then(|e| e.parse::<u64>().ok()) {
        Some(end) if end != start => {
            let (first, last) = (start.min(end), start.max(end));
            Some((format!("{}:{}", first, last), first, last - first + 1))
        }
        _ => Some((start.to_string(), start, 1)),
    }
}

pub(super) fn row_operation(input: &RuleInput) -> Option<Classification> {
    let text = input.text;

    if let Some(caps) = INSERT_ROWS.captures(text) {
        let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or_default();
        if ROW_PAYLOAD.is_match(rest) {
            return None;
        }
        let count = caps
            .name("count")
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(1);
        let (position, row) = match ROW_POSITION.captures(rest) {
            Some(pos) => {
                let position = match &pos["pos"] {
                    "below" | "after" => "below",
                    _ => "above",
                };
                (position, pos["row"].to_string())
            }
            None => ("end", "*".to_string()),
        };
        let mut c = Classification::new(
            Intent::RowOperation,
            "insert_row",
            Target::row(row.clone()),
            0.9,
            format!("Insert {} row(s) {}", count, position),
        )
        .with_param("count", count)
        .with_param("position", position);
        if let Ok(row) = row.parse::<u64>() {
            c = c.with_param("row", row);
        }
        return Some(c);
    }

    if let Some(caps) = DELETE_ROWS.captures(text) {
        let (identifier, start, count) =
            row_span(&caps["start"], caps.name("end").map(|m| m.as_str()))?;
        return Some(
            Classification::new(
                Intent::RowOperation,
                "delete_row",
                Target::row(identifier),
                0.9,
                "Delete rows by number",
            )
            .with_param("row", start)
            .with_param("count", count),
        );
    }

    if let Some(caps) = HIDE_ROWS.captures(text) {
        let (identifier, start, count) =
            row_span(&caps["start"], caps.name("end").map(|m| m.as_str()))?;
        let action = if &caps["verb"] == "hide" {
            "hide_row"
        } else {
            "show_row"
        };
        return Some(
            Classification::new(
                Intent::RowOperation,
                action,
                Target::row(identifier),
                0.9,
                "Row visibility change",
            )
            .with_param("row", start)
            .with_param("count", count),
        );
    }

    None
}

static RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b(?P<range>{})\b", RANGE_REF)).unwrap());

static SET_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:set|change|update|put|make)\s+(?:cell\s+)?(?P<cell>[a-z]{1,2}\d+)\s+(?:to|=|as|equal\s+to)\s+(?P<value>.+?)\s*[.!]*$").unwrap()
});

static PUT_IN_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:put|enter|write|type)\s+(?P<value>.+?)\s+in(?:to)?\s+(?:cell\s+)?(?P<cell>[a-z]{1,2}\d+)\s*[.!]*$").unwrap()
});

static NON_VALUE_PAYLOAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:image|picture|photo|logo|comment|note|link|hyperlink|formula)\b").unwrap()
});

static CLEAR_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:clear|empty|erase|delete)\s+(?:the\s+)?(?:contents?\s+of\s+)?(?:cell\s+)?(?P<cell>[a-z]{1,2}\d+)\b").unwrap()
});

static FORMAT_CELL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?P<style>bold|italici[sz]e|italic|underline)\s+(?:cell\s+)?(?P<cell>[a-z]{1,2}\d+)\b").unwrap()
});

pub(super) fn cell_operation(input: &RuleInput) -> Option<Classification> {
    let text = input.text;
    if RANGE.is_match(text) {
        return None;
    }

    let set = SET_CELL.captures(text).or_else(|| {
        PUT_IN_CELL
            .captures(text)
            .filter(|caps| !NON_VALUE_PAYLOAD.is_match(&caps["value"]))
    });
    if let Some(caps) = set {
        let cell = caps["cell"].to_uppercase();
        return Some(
            Classification::new(
                Intent::CellOperation,
                "set_value",
                Target::cell(cell.clone()),
                0.9,
                format!("Set cell {}", cell),
            )
            .with_param("value", extract::literal_value(&caps["value"])),
        );
    }

    if let Some(caps) = CLEAR_CELL.captures(text) {
        let cell = caps["cell"].to_uppercase();
        return Some(Classification::new(
            Intent::CellOperation,
            "clear_cell",
            Target::cell(cell.clone()),
            0.9,
            format!("Clear cell {}", cell),
        ));
    }

    if let Some(caps) = FORMAT_CELL.captures(text) {
        let style = match &caps["style"] {
            "italicise" | "italicize" => "italic",
            other => other,
        }
        .to_string();
        return Some(
            Classification::new(
                Intent::CellOperation,
                "format_cell",
                Target::cell(caps["cell"].to_uppercase()),
                0.9,
                "Cell text style",
            )
            .with_param("style", style),
        );
    }

    None
}

static MERGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?P<un>un)?merge\b").unwrap());
static SHIFT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bshift(?:ing)?\s+(?:cells?\s+)?(?P<dir>up|down|left|right)\b").unwrap());
static INSERT_VERB: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:insert|add)\b").unwrap());
static DELETE_VERB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:delete|remove|drop)\b").unwrap());
static CLEAR_VERB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:clear|empty|erase|wipe)\b").unwrap());

pub(super) fn range_operation(input: &RuleInput) -> Option<Classification> {
    let text = input.text;
    let caps = RANGE.captures(text)?;
    let range: String = caps["range"]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    let shift = SHIFT.captures(text).map(|c| c["dir"].to_string());

    let (action, shift) = if let Some(merge) = MERGE.captures(text) {
        if merge.name("un").is_some() {
            ("unmerge_cells", None)
        } else {
            ("merge_cells", None)
        }
    } else if INSERT_VERB.is_match(text) {
        let dir = match shift.as_deref() {
            Some("right") => "right",
            _ => "down",
        };
        ("insert_cells_shift", Some(dir))
    } else if DELETE_VERB.is_match(text) {
        let dir = match shift.as_deref() {
            Some("left") => "left",
            _ => "up",
        };
        ("delete_cells_shift", Some(dir))
    } else if CLEAR_VERB.is_match(text) {
        ("clear_range", None)
    } else {
        return None;
    };

    let mut c = Classification::new(
        Intent::RangeOperation,
        action,
        Target::range(range.clone()),
        0.9,
        format!("Range operation on {}", range),
    );
    if let Some(dir) = shift {
        c = c.with_param("shift", dir);
    }
    Some(c)
}

static INSERT_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:insert|add)\s+(?:(?P<count>\d+)\s+)?(?:a\s+|an\s+|one\s+)?(?:new\s+|blank\s+|empty\s+)?col(?:umn)?s?\b(?P<rest>.*)$").unwrap()
});

static COLUMN_POSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?P<pos>before|after|left\s+of|right\s+of|to\s+the\s+left\s+of|to\s+the\s+right\s+of)\s+(?:column\s+)?(?P<reference>[a-z]{1,2})\b").unwrap()
});

static COLUMN_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:called|named|titled)\s+(?P<name>"[^"]*"|'[^']*'|\S+)"#).unwrap()
});

static DELETE_COLUMN_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:delete|remove|drop)\s+(?:the\s+)?col(?:umn)?s?\s+(?P<from>[a-z]{1,2})\s*(?:-|:|to|through|thru)\s*(?P<to>[a-z]{1,2})\b").unwrap()
});

static DELETE_COLUMN_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:delete|remove|drop)\s+(?:the\s+)?col(?:umn)?s\s+(?P<list>[a-z]{1,2}(?:\s*(?:,|and|&)\s*(?:and\s+)?[a-z]{1,2})+)\b").unwrap()
});

static VISIBILITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?P<verb>unhide|hide|show)\b").unwrap());

static RENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\brename\s+(?P<old>.+?)\s+(?:to|as)\s+(?P<new>"[^"]*"|'[^']*'|.+?)\s*[.!]*$"#)
        .unwrap()
});

static REMOVE_VERB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:delete|remove|drop|get\s+rid\s+of)\b").unwrap());

pub(super) fn column_operation(input: &RuleInput) -> Option<Classification> {
    let text = input.text;

    if let Some(caps) = INSERT_COLUMN.captures(text) {
        let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or_default();
        let count = caps
            .name("count")
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(1);
        let (position, reference) = match COLUMN_POSITION.captures(rest) {
            Some(pos) => {
                let position = if pos["pos"].contains("before") || pos["pos"].contains("left") {
                    "before"
                } else {
                    "after"
                };
                let reference = pos["reference"].to_uppercase();
                column_index(&reference)?;
                (position, reference)
            }
            None => ("end", "*".to_string()),
        };
        let mut c = Classification::new(
            Intent::ColumnOperation,
            "insert_column",
            Target::column(reference.clone()),
            0.9,
            format!("Insert {} column(s) {} {}", count, position, reference),
        )
        .with_param("count", count)
        .with_param("position", position);
        if let Some(name) = COLUMN_NAME.captures(rest) {
            c = c.with_param("name", patterns::unquote(&name["name"]).to_string());
        }
        return Some(c);
    }

    if let Some(caps) = DELETE_COLUMN_SPAN.captures(text) {
        let from = caps["from"].to_uppercase();
        let to = caps["to"].to_uppercase();
        let (start, end) = (column_index(&from)?, column_index(&to)?);
        if end >= start {
            return Some(delete_columns(&from, (end - start + 1) as u64));
        }
    }

    if let Some(caps) = DELETE_COLUMN_LIST.captures(text) {
        let columns = extract::parse_column_list(&caps["list"]);
        match columns.as_slice() {
            [first, second] if are_adjacent(first, second) => {
                return Some(delete_columns(first, 2));
            }
            [_, _, ..] => {
                return Some(
                    Classification::new(
                        Intent::ColumnOperation,
                        "delete_columns_multiple",
                        Target::column(columns.join(",")),
                        0.9,
                        format!("Delete columns {}", columns.join(", ")),
                    )
                    .with_param("columns", columns),
                );
            }
            _ => {}
        }
    }

    if let Some(caps) = RENAME.captures(text) {
        let col = extract::resolve_column(&caps["old"], input.columns)
            .or_else(|| extract::resolve_column(&format!("column {}", &caps["old"]), input.columns))?;
        let new_name = patterns::unquote(&caps["new"]).to_string();
        return Some(with_column(
            Classification::new(
                Intent::ColumnOperation,
                "rename_column",
                Target::column(col.letter.clone()),
                0.9,
                format!("Rename column {}", col.letter),
            )
            .with_param("new_name", new_name),
            &col,
        ));
    }

    if !HAS_COLUMN_WORD.is_match(text) {
        return None;
    }
    let scope = input.column_scope();
    let col = scope.column()?;

    if let Some(caps) = VISIBILITY.captures(text) {
        let action = if &caps["verb"] == "hide" {
            "hide_column"
        } else {
            "show_column"
        };
        return Some(with_column(
            Classification::new(
                Intent::ColumnOperation,
                action,
                Target::column(col.letter.clone()),
                0.9,
                "Column visibility change",
            ),
            col,
        ));
    }

    if REMOVE_VERB.is_match(text) {
        return Some(with_column(
            delete_columns(&col.letter, 1),
            col,
        ));
    }

    None
}

fn delete_columns(first: &str, count: u64) -> Classification {
    Classification::new(
        Intent::ColumnOperation,
        "delete_column",
        Target::column(first.to_string()),
        0.9,
        format!("Delete {} column(s) starting at {}", count, first),
    )
    .with_param("column", first.to_string())
    .with_param("count", count)
}

static UNFREEZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bunfreeze\b").unwrap());
static FREEZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bfreeze\b").unwrap());

static FREEZE_FIRST_COLUMNS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:first|left(?:most)?)\s+(?:(?P<n>\d+)\s+)?col(?:umn)?s?\b").unwrap()
});
static FREEZE_UP_TO_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:col(?:umn)?s?\s+(?:a\s*(?:-|to|through)\s*)?|up\s+to\s+col(?:umn)?\s+)(?P<letter>[a-z])\b").unwrap()
});
static FREEZE_FIRST_ROWS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:first|top)\s+(?:(?P<n>\d+)\s+)?rows?\b|\bheader(?:\s+row)?\b").unwrap()
});
static FREEZE_UP_TO_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:rows?\s+(?:1\s*(?:-|to|through)\s*)?|up\s+to\s+row\s+)(?P<n>\d+)\b").unwrap()
});

pub(super) fn freeze(input: &RuleInput) -> Option<Classification> {
    let text = input.text;
    if UNFREEZE.is_match(text) {
        return Some(Classification::new(
            Intent::FreezeOperation,
            "unfreeze",
            Target::all_data(),
            0.9,
            "Remove frozen panes",
        ));
    }
    if !FREEZE.is_match(text) {
        return None;
    }

    let count_of = |caps: &regex::Captures| -> u64 {
        caps.name("n")
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(1)
    };

    if let Some(caps) = FREEZE_FIRST_COLUMNS.captures(text) {
        return Some(freeze_columns(count_of(&caps)));
    }
    if let Some(caps) = FREEZE_UP_TO_COLUMN.captures(text) {
        if let Some(idx) = column_index(&caps["letter"]) {
            return Some(freeze_columns(idx as u64 + 1));
        }
    }
    if let Some(caps) = FREEZE_FIRST_ROWS.captures(text) {
        return Some(freeze_rows(count_of(&caps)));
    }
    if let Some(caps) = FREEZE_UP_TO_ROW.captures(text) {
        return Some(freeze_rows(count_of(&caps)));
    }
    Some(freeze_rows(1))
}

fn freeze_rows(count: u64) -> Classification {
    Classification::new(
        Intent::FreezeOperation,
        "freeze_rows",
        Target::row(count.to_string()),
        0.9,
        format!("Freeze the first {} row(s)", count),
    )
    .with_param("rows", count)
}

fn freeze_columns(count: u64) -> Classification {
    let last = column_letter(count.saturating_sub(1) as usize);
    Classification::new(
        Intent::FreezeOperation,
        "freeze_columns",
        Target::column(last),
        0.9,
        format!("Freeze the first {} column(s)", count),
    )
    .with_param("columns", count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::ColumnMapping;
    use serde_json::json;

    fn run(rule: fn(&RuleInput) -> Option<Classification>, text: &str) -> Option<Classification> {
        let mapping = ColumnMapping::new();
        rule(&RuleInput::new(text, &mapping))
    }

    #[test]
    fn resize_reads_width_or_autofit() {
        let fixed = run(column_resize, "set the width of column c to 120").unwrap();
        assert_eq!(fixed.parameters.get("width"), Some(&json!(120)));
        assert_eq!(fixed.target, Target::column("C"));
        let auto = run(column_resize, "autofit all columns").unwrap();
        assert_eq!(auto.target, Target::all_data());
        assert_eq!(auto.parameters.get("auto_fit"), Some(&json!(true)));
    }

    #[test]
    fn sort_direction_and_scope() {
        let c = run(sort, "sort column a descending").unwrap();
        assert_eq!(c.action, "sort_column");
        assert_eq!(c.param_str("direction"), Some("desc"));
        assert_eq!(c.param_str("column"), Some("A"));
        let all = run(sort, "sort the data").unwrap();
        assert_eq!(all.action, "sort_data");
        assert_eq!(all.param_str("direction"), Some("asc"));
        assert!(run(sort, "sort by price").is_none());
    }

    #[test]
    fn row_operations() {
        let ins = run(row_operation, "insert 2 rows below row 10").unwrap();
        assert_eq!(ins.param_str("position"), Some("below"));
        assert_eq!(ins.parameters.get("count"), Some(&json!(2)));
        assert_eq!(ins.target, Target::row("10"));

        let del = run(row_operation, "delete rows 5 to 7").unwrap();
        assert_eq!(del.target, Target::row("5:7"));
        assert_eq!(del.parameters.get("count"), Some(&json!(3)));

        let reversed = run(row_operation, "delete rows 5 to 3").unwrap();
        assert_eq!(reversed.target, Target::row("3:5"));
        assert_eq!(reversed.parameters.get("row"), Some(&json!(3)));
        assert_eq!(reversed.parameters.get("count"), Some(&json!(3)));

        assert_eq!(run(row_operation, "hide row 4").unwrap().action, "hide_row");
        assert!(run(row_operation, "add a new row with name bob").is_none());
    }

    #[test]
    fn cell_operations() {
        let set = run(cell_operation, "set b2 to 42").unwrap();
        assert_eq!(set.target, Target::cell("B2"));
        assert_eq!(set.parameters.get("value"), Some(&json!(42.0)));
        let put = run(cell_operation, "put 'done' in cell c7").unwrap();
        assert_eq!(put.parameters.get("value"), Some(&json!("done")));
        assert_eq!(run(cell_operation, "clear cell a1").unwrap().action, "clear_cell");
        assert!(run(cell_operation, "clear a1:b2").is_none());
        assert!(run(cell_operation, "insert an image in c2").is_none());
    }

    #[test]
    fn range_operations() {
        let merge = run(range_operation, "merge a1:c1").unwrap();
        assert_eq!(merge.action, "merge_cells");
        assert_eq!(merge.target, Target::range("A1:C1"));
        assert_eq!(run(range_operation, "unmerge a1 : c1").unwrap().action, "unmerge_cells");
        let del = run(range_operation, "delete b2:c4 and shift cells left").unwrap();
        assert_eq!(del.param_str("shift"), Some("left"));
    }

    #[test]
    fn column_operations() {
        let ins = run(column_operation, "insert a column after b called notes").unwrap();
        assert_eq!(ins.param_str("position"), Some("after"));
        assert_eq!(ins.target, Target::column("B"));
        assert_eq!(ins.param_str("name"), Some("notes"));

        let span = run(column_operation, "delete columns b to d").unwrap();
        assert_eq!(span.parameters.get("count"), Some(&json!(3)));

        let list = run(column_operation, "remove columns a, c and e").unwrap();
        assert_eq!(list.parameters.get("columns"), Some(&json!(["A", "C", "E"])));

        assert_eq!(run(column_operation, "hide column f").unwrap().action, "hide_column");
        assert_eq!(run(column_operation, "delete column c").unwrap().param_str("column"), Some("C"));
        assert!(run(column_operation, "delete the price column").is_none());
    }

    #[test]
    fn freeze_panes() {
        assert_eq!(run(freeze, "unfreeze panes").unwrap().action, "unfreeze");
        let rows = run(freeze, "freeze the first 3 rows").unwrap();
        assert_eq!(rows.parameters.get("rows"), Some(&json!(3)));
        let cols = run(freeze, "freeze columns a to c").unwrap();
        assert_eq!(cols.parameters.get("columns"), Some(&json!(3)));
        assert_eq!(run(freeze, "freeze the header").unwrap().action, "freeze_rows");
    }
}
