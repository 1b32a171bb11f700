//! Lightweight extraction shared by the matchers and the router:
//! operation keywords, comparison conditions, column references and
//! sub-command splitting.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::columns::{column_index, column_letter, ColumnMapping};
use crate::patterns::{
    self, capture, PatternBuilder, CMP_BETWEEN, CMP_CONTAINS, CMP_EQUAL, CMP_GREATER, CMP_LESS,
    VALUE_NUMBER, VALUE_QUOTED, VALUE_TEXT, VALUE_WORD,
};
use crate::types::Parameters;

// ============================================================================
// Operations
// ============================================================================

/// Operation keyword found by scanning an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Delete,
    Insert,
    Hide,
    Merge,
    Freeze,
    Format,
    Sort,
    Filter,
    Replace,
    Analyze,
    Visualize,
}

/// Coarse family an [`Operation`] belongs to; compound detection needs two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationCategory {
    Removal,
    Insertion,
    Structural,
    Freeze,
    Formatting,
    Ordering,
    Filtering,
    Replacing,
    Analysis,
    Visualization,
}

impl Operation {
    pub fn category(&self) -> OperationCategory {
        match self {
            Operation::Delete => OperationCategory::Removal,
            Operation::Insert => OperationCategory::Insertion,
            Operation::Hide | Operation::Merge => OperationCategory::Structural,
            Operation::Freeze => OperationCategory::Freeze,
            Operation::Format => OperationCategory::Formatting,
            Operation::Sort => OperationCategory::Ordering,
            Operation::Filter => OperationCategory::Filtering,
            Operation::Replace => OperationCategory::Replacing,
            Operation::Analyze => OperationCategory::Analysis,
            Operation::Visualize => OperationCategory::Visualization,
        }
    }

    pub fn is_ui(&self) -> bool {
        !matches!(self, Operation::Analyze | Operation::Visualize)
    }
}

static OPERATION_KEYWORDS: Lazy<Vec<(Operation, Regex)>> = Lazy::new(|| {
    [
        (Operation::Delete, r"\b(?:delete|remove|drop|erase)\b"),
        (Operation::Insert, r"\b(?:insert|add)\b"),
        (Operation::Hide, r"\b(?:hide|unhide)\b"),
        (Operation::Merge, r"\b(?:un)?merge\b"),
        (Operation::Freeze, r"\b(?:un)?freeze\b"),
        (
            Operation::Format,
            r"\b(?:highlight|colou?r|bold|italici[sz]e|italic|underline|format|shade)\b",
        ),
        (Operation::Sort, r"\b(?:sort|arrange|order\s+by)\b"),
        (Operation::Filter, r"\b(?:filter|show\s+only|only\s+show)\b"),
        (Operation::Replace, r"\breplace\b"),
        (
            Operation::Analyze,
            r"\b(?:analy[sz]e|analysis|average|mean|median|sum|total|count|compare|correlat\w*|trends?|insights?|summar\w*|statistic\w*|predict\w*|forecast\w*)\b",
        ),
        (
            Operation::Visualize,
            r"\b(?:chart|graph|plot|visuali[sz]e|visuali[sz]ation|histogram|dashboard)\b",
        ),
    ]
    .into_iter()
    .map(|(op, src)| (op, Regex::new(&format!("(?i){}", src)).unwrap()))
    .collect()
});

/// Scan for operation keywords, ordered by first occurrence, de-duplicated.
pub fn extract_operations(text: &str) -> Vec<Operation> {
    let mut found: Vec<(usize, Operation)> = OPERATION_KEYWORDS
        .iter()
        .filter_map(|(op, re)| re.find(text).map(|m| (m.start(), *op)))
        .collect();
    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, op)| op).collect()
}

/// Distinct categories among the given operations, in order.
pub fn operation_categories(operations: &[Operation]) -> Vec<OperationCategory> {
    let mut categories = Vec::new();
    for op in operations {
        let category = op.category();
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    categories
}

// ============================================================================
// Sub-command splitting
// ============================================================================

static STRONG_SEQUENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s*,?\s*\b(?:and\s+then|then|after\s+that|afterwards|followed\s+by|and\s+also)\b\s*",
    )
    .unwrap()
});

static WEAK_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:,\s*and\s+|;\s*|,\s*|\s+and\s+)").unwrap());

static COMMAND_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:please\s+)?(?:delete|remove|drop|insert|add|freeze|unfreeze|highlight|colou?r|bold|format|sort|filter|hide|unhide|show|merge|unmerge|create|make|rename|clear|set|replace|resize|calculate|compute|analy[sz]e|plot|chart|graph|visuali[sz]e|find|compare|summari[sz]e)\b").unwrap()
});

/// True when the text contains a sequencing or listing conjunction.
pub fn has_conjunction(text: &str) -> bool {
    STRONG_SEQUENCE.is_match(text) || WEAK_SEPARATOR.is_match(text)
}

/// True when the text contains an explicit sequencing conjunction ("then", "after that").
pub fn has_sequence_conjunction(text: &str) -> bool {
    STRONG_SEQUENCE.is_match(text)
}

/// Split a multi-operation utterance into ordered sub-commands.
///
/// Explicit sequencing words split unconditionally; "and"/comma split only
/// when the following piece starts with a command verb, so "delete column D
/// and E" stays one command.
pub fn split_sub_commands(text: &str) -> Vec<String> {
    let strong: Vec<String> = STRONG_SEQUENCE
        .split(text.trim())
        .map(clean_piece)
        .filter(|p| !p.is_empty())
        .collect();

    let mut commands = Vec::new();
    for piece in strong {
        commands.extend(split_on_verbs(&piece));
    }
    commands
}

fn split_on_verbs(text: &str) -> Vec<String> {
    let mut commands: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut last = 0usize;

    for sep in WEAK_SEPARATOR.find_iter(text) {
        let piece = &text[last..sep.start()];
        append_piece(&mut commands, &mut current, piece);
        current.push_str(sep.as_str());
        last = sep.end();
    }
    append_piece(&mut commands, &mut current, &text[last..]);

    let tail = clean_piece(&current);
    if !tail.is_empty() {
        commands.push(tail);
    }
    commands
}

fn append_piece(commands: &mut Vec<String>, current: &mut String, piece: &str) {
    let trimmed = piece.trim();
    let starts_new = COMMAND_START.is_match(trimmed) && !clean_piece(current).is_empty();
    if starts_new {
        // Drop the separator we optimistically appended to the previous command.
        let finished = clean_piece(current);
        commands.push(finished);
        current.clear();
    }
    current.push_str(piece);
}

fn clean_piece(piece: &str) -> String {
    let trimmed = piece.trim().trim_matches(|c| c == ',' || c == ';').trim();
    let without_and = trimmed
        .strip_suffix(" and")
        .or_else(|| trimmed.strip_prefix("and "))
        .unwrap_or(trimmed);
    without_and.trim().to_string()
}

// ============================================================================
// Comparison conditions
// ============================================================================

/// Canonical comparison regardless of surface form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonKind {
    GreaterThan,
    LessThan,
    Equals,
    Between,
    Contains,
}

impl ComparisonKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonKind::GreaterThan => "greater_than",
            ComparisonKind::LessThan => "less_than",
            ComparisonKind::Equals => "equals",
            ComparisonKind::Between => "between",
            ComparisonKind::Contains => "contains",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub kind: ComparisonKind,
    pub value: Value,
    /// Upper bound, only for `Between`.
    pub upper: Option<Value>,
}

impl Condition {
    /// Write `condition`, `value` (and `min`/`max` for ranges) into a parameter bag.
    pub fn write_params(&self, params: &mut Parameters) {
        params.insert("condition".to_string(), json!(self.kind.as_str()));
        match (&self.kind, &self.upper) {
            (ComparisonKind::Between, Some(upper)) => {
                params.insert("min".to_string(), self.value.clone());
                params.insert("max".to_string(), upper.clone());
            }
            _ => {
                params.insert("value".to_string(), self.value.clone());
            }
        }
    }
}

static COND_BETWEEN: Lazy<Regex> = Lazy::new(|| {
    PatternBuilder::new()
        .word(CMP_BETWEEN)
        .capture("low", VALUE_NUMBER)
        .word(r"(?:and|to|-)")
        .capture("high", VALUE_NUMBER)
        .build()
        .unwrap()
});

static COND_GREATER: Lazy<Regex> = Lazy::new(|| {
    PatternBuilder::new()
        .word(CMP_GREATER)
        .then(&capture("value", VALUE_NUMBER))
        .build()
        .unwrap()
});

static COND_LESS: Lazy<Regex> = Lazy::new(|| {
    PatternBuilder::new()
        .word(CMP_LESS)
        .then(&capture("value", VALUE_NUMBER))
        .build()
        .unwrap()
});

static COND_CONTAINS: Lazy<Regex> = Lazy::new(|| {
    PatternBuilder::new()
        .word(CMP_CONTAINS)
        .capture("value", &format!("(?:{}|{})", VALUE_QUOTED, VALUE_WORD))
        .build()
        .unwrap()
});

static COND_EQUAL: Lazy<Regex> = Lazy::new(|| {
    PatternBuilder::new()
        .word(CMP_EQUAL)
        .then(&capture(
            "value",
            &format!("(?:{}|{}|{})", VALUE_QUOTED, VALUE_NUMBER, VALUE_WORD),
        ))
        .build()
        .unwrap()
});

/// "values that are X" / "is X" phrasing; treated as equality.
static COND_IS_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)\b(?:that\s+are|which\s+are|that\s+is|which\s+is|is|are|of|saying)\s+(?P<value>{}|{})"#,
        VALUE_QUOTED, VALUE_WORD
    ))
    .unwrap()
});

/// Extract a comparison condition; `between` needs two numeric literals.
pub fn extract_condition(text: &str) -> Option<Condition> {
    if let Some(caps) = COND_BETWEEN.captures(text) {
        let low = patterns::parse_number(&caps["low"]);
        let high = patterns::parse_number(&caps["high"]);
        if let (Some(low), Some(high)) = (low, high) {
            return Some(Condition {
                kind: ComparisonKind::Between,
                value: json!(low),
                upper: Some(json!(high)),
            });
        }
    }
    if let Some(caps) = COND_GREATER.captures(text) {
        if let Some(v) = patterns::parse_number(&caps["value"]) {
            return Some(numeric(ComparisonKind::GreaterThan, v));
        }
    }
    if let Some(caps) = COND_LESS.captures(text) {
        if let Some(v) = patterns::parse_number(&caps["value"]) {
            return Some(numeric(ComparisonKind::LessThan, v));
        }
    }
    if let Some(caps) = COND_CONTAINS.captures(text) {
        return Some(Condition {
            kind: ComparisonKind::Contains,
            value: json!(patterns::unquote(&caps["value"])),
            upper: None,
        });
    }
    if let Some(caps) = COND_EQUAL.captures(text) {
        return Some(Condition {
            kind: ComparisonKind::Equals,
            value: literal_value(&caps["value"]),
            upper: None,
        });
    }
    None
}

/// Like [`extract_condition`], additionally reading "that are X" as equality.
pub fn extract_condition_or_equality(text: &str) -> Option<Condition> {
    extract_condition(text).or_else(|| {
        COND_IS_VALUE.captures(text).and_then(|caps| {
            let raw = caps.name("value")?.as_str();
            if is_filler_word(raw) {
                return None;
            }
            Some(Condition {
                kind: ComparisonKind::Equals,
                value: literal_value(raw),
                upper: None,
            })
        })
    })
}

fn numeric(kind: ComparisonKind, v: f64) -> Condition {
    Condition {
        kind,
        value: json!(v),
        upper: None,
    }
}

/// Numbers become JSON numbers, everything else an unquoted string.
pub fn literal_value(raw: &str) -> Value {
    let unquoted = patterns::unquote(raw);
    if unquoted.len() == raw.trim().len() {
        if let Some(n) = patterns::parse_number(unquoted) {
            return json!(n);
        }
    }
    json!(unquoted)
}

fn is_short_word(word: &str) -> bool {
    matches!(
        word.to_lowercase().as_str(),
        "to" | "in" | "of" | "on" | "at" | "by" | "is" | "or" | "an" | "as" | "if" | "it" | "be"
            | "do" | "so" | "up" | "no" | "me" | "my" | "we"
    )
}

fn is_filler_word(word: &str) -> bool {
    matches!(
        word,
        "the" | "a" | "an" | "in" | "on" | "of" | "to" | "column" | "row" | "empty" | "blank" | "not"
            | "greater" | "less" | "more" | "above" | "below" | "over" | "under" | "between"
            | "equal" | "exactly" | "duplicated" | "duplicates"
    )
}

// ============================================================================
// Column references
// ============================================================================

/// A column resolved from an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub letter: String,
    pub index: usize,
    /// Header name when resolved through the column mapping.
    pub name: Option<String>,
}

static EXPLICIT_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bcol(?:umn)?s?\s+(?P<letter>[a-z]{1,2})\b(?:\s*$|[^0-9:])").unwrap()
});

static THE_LETTER_COLUMN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bthe\s+(?P<letter>[a-z]{1,2})\s+column\b").unwrap());

static NAMED_BEFORE_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:in|of|on|for|from|by|to|the)\s+(?:the\s+)?(?P<name>{}?)\s+column\b",
        VALUE_TEXT
    ))
    .unwrap()
});

static NAMED_AFTER_COLUMN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\bcolumn\s+(?:named\s+|called\s+)?(?P<name>{}|{})",
        VALUE_QUOTED, VALUE_WORD
    ))
    .unwrap()
});

static NAMED_BY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:by|on|for|of|in)\s+(?:the\s+)?(?P<name>[a-z0-9][a-z0-9_\-]*(?:\s+[a-z0-9][a-z0-9_\-]*)?)").unwrap()
});

static NAMED_WHERE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:where|whose|if|with)\s+(?:the\s+)?(?P<name>[a-z0-9][a-z0-9_\-]*(?:\s+[a-z0-9][a-z0-9_\-]*)?)").unwrap()
});

/// Resolve the column an utterance refers to.
///
/// Tries an explicit column letter first, then a natural-language name looked
/// up in the mapping. Returns `None` when neither resolves.
pub fn resolve_column(text: &str, columns: &ColumnMapping) -> Option<ColumnRef> {
    explicit_column(text, columns).or_else(|| named_column(text, columns))
}

fn explicit_column(text: &str, columns: &ColumnMapping) -> Option<ColumnRef> {
    let caps = EXPLICIT_COLUMN
        .captures(text)
        .or_else(|| THE_LETTER_COLUMN.captures(text))?;
    let letters = caps.name("letter")?.as_str();
    if is_short_word(letters) {
        return None;
    }
    // Two-letter words such as "id" are header names when the table has them.
    if letters.len() == 2 && columns.lookup(letters).is_some() {
        return None;
    }
    let index = column_index(letters)?;
    Some(ColumnRef {
        letter: letters.to_uppercase(),
        index,
        name: None,
    })
}

fn named_column(text: &str, columns: &ColumnMapping) -> Option<ColumnRef> {
    if columns.is_empty() {
        return None;
    }
    let mut candidates: Vec<String> = Vec::new();
    for re in [&*NAMED_BEFORE_COLUMN, &*NAMED_AFTER_COLUMN] {
        if let Some(caps) = re.captures(text) {
            candidates.push(patterns::unquote(&caps["name"]).to_string());
        }
    }
    for caps in NAMED_BY.captures_iter(text).chain(NAMED_WHERE.captures_iter(text)) {
        let name = caps["name"].to_string();
        candidates.push(name.clone());
        if let Some(first) = name.split_whitespace().next() {
            candidates.push(first.to_string());
        }
    }

    candidates
        .into_iter()
        .filter(|c| !c.trim().is_empty() && !is_filler_word(c.trim()))
        .find_map(|candidate| {
            let index = columns.lookup(&candidate)?;
            Some(ColumnRef {
                letter: column_letter(index),
                index,
                name: columns.header(index).map(str::to_string),
            })
        })
}

static LETTER_LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?P<letter>[a-z]{1,2})\b").unwrap());

/// Parse "A, B, and C" into an ordered, de-duplicated, upper-cased list.
pub fn parse_column_list(list: &str) -> Vec<String> {
    let mut letters: Vec<String> = Vec::new();
    for caps in LETTER_LIST_ITEM.captures_iter(list) {
        let letter = caps["letter"].to_uppercase();
        if letter == "AND" || letter == "OR" {
            continue;
        }
        if !letters.contains(&letter) {
            letters.push(letter);
        }
    }
    letters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_are_ordered_by_first_occurrence() {
        let ops = extract_operations("delete column b and then freeze the top row");
        assert_eq!(ops, vec![Operation::Delete, Operation::Freeze]);
        let cats = operation_categories(&extract_operations("delete column d and remove e"));
        assert_eq!(cats, vec![OperationCategory::Structural]);
    }

    #[test]
    fn splitting_keeps_column_lists_together() {
        assert_eq!(
            split_sub_commands("delete column d and e"),
            vec!["delete column d and e".to_string()]
        );
        assert_eq!(
            split_sub_commands("delete column b and then freeze the first row"),
            vec!["delete column b".to_string(), "freeze the first row".to_string()]
        );
        assert_eq!(
            split_sub_commands("insert a row above row 3, bold the header and sort by name"),
            vec![
                "insert a row above row 3".to_string(),
                "bold the header".to_string(),
                "sort by name".to_string()
            ]
        );
    }

    #[test]
    fn comparison_surface_forms_are_canonicalised() {
        for text in [
            "values greater than 50",
            "values above 50",
            "scores over 50",
            "cells > 50",
        ] {
            let cond = extract_condition(text).unwrap();
            assert_eq!(cond.kind, ComparisonKind::GreaterThan, "{}", text);
            assert_eq!(cond.value, json!(50.0));
        }
        let below = extract_condition("rows below 10").unwrap();
        assert_eq!(below.kind, ComparisonKind::LessThan);

        let between = extract_condition("values between 10 and 20").unwrap();
        assert_eq!(between.kind, ComparisonKind::Between);
        assert_eq!(between.upper, Some(json!(20.0)));

        let contains = extract_condition("cells containing \"late fee\"").unwrap();
        assert_eq!(contains.kind, ComparisonKind::Contains);
        assert_eq!(contains.value, json!("late fee"));

        let equals = extract_condition("status equals done").unwrap();
        assert_eq!(equals.kind, ComparisonKind::Equals);
        assert_eq!(equals.value, json!("done"));
    }

    #[test]
    fn between_requires_two_numbers() {
        assert!(extract_condition("between apples and pears").is_none());
    }

    #[test]
    fn equality_phrasing_is_read_as_equals() {
        let cond = extract_condition_or_equality("highlight values that are pending").unwrap();
        assert_eq!(cond.kind, ComparisonKind::Equals);
        assert_eq!(cond.value, json!("pending"));
    }

    #[test]
    fn explicit_letter_wins_over_names() {
        let mapping = ColumnMapping::build(&["Name", "Score"]);
        let col = resolve_column("sort column b descending", &mapping).unwrap();
        assert_eq!(col.letter, "B");
        assert_eq!(col.index, 1);
        assert_eq!(col.name, None);
    }

    #[test]
    fn names_resolve_through_mapping() {
        let mapping = ColumnMapping::build(&["Name", "Playtime Hours", "Genre"]);
        let col = resolve_column("sort by playtime descending", &mapping).unwrap();
        assert_eq!(col.letter, "B");
        assert_eq!(col.name.as_deref(), Some("Playtime Hours"));

        let col = resolve_column("filter the genre column to rpg", &mapping).unwrap();
        assert_eq!(col.index, 2);

        assert!(resolve_column("sort by price", &mapping).is_none());
        assert!(resolve_column("sort by price", &ColumnMapping::new()).is_none());
    }

    #[test]
    fn column_lists_are_deduplicated_and_upper_cased() {
        assert_eq!(parse_column_list("a, b, and c"), vec!["A", "B", "C"]);
        assert_eq!(parse_column_list("c, a, c and b"), vec!["C", "A", "B"]);
    }
}
