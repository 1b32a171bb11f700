//! Literal/priority matcher
//!
//! Narrow, high-value phrasings checked before anything else. A match here
//! short-circuits the LLM and the heuristic battery.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::columns::are_adjacent;
use crate::extract::{self, operation_categories};
use crate::heuristic::{with_column, Rule, RuleInput};
use crate::types::{Classification, Intent, Target, TargetType};

static PRIORITY_RULES: &[Rule] = &[
    Rule {
        name: "highlight_duplicates",
        apply: highlight_duplicates,
    },
    Rule {
        name: "delete_two_columns",
        apply: delete_two_columns,
    },
    Rule {
        name: "delete_column_list",
        apply: delete_column_list,
    },
    Rule {
        name: "compound",
        apply: compound,
    },
];

pub fn rules() -> &'static [Rule] {
    PRIORITY_RULES
}

/// First priority rule that fires, with the rule's name.
pub fn match_priority(input: &RuleInput) -> Option<(Classification, &'static str)> {
    PRIORITY_RULES
        .iter()
        .find_map(|rule| (rule.apply)(input).map(|c| (c, rule.name)))
}

fn highlight_duplicates(input: &RuleInput) -> Option<Classification> {
    let text = input.text;
    if !(text.contains("highlight") && text.contains("duplicate")) {
        return None;
    }
    let c = Classification::new(
        Intent::ConditionalFormat,
        "highlight_duplicates",
        Target::all_data(),
        0.95,
        "Literal 'highlight' + 'duplicate'",
    );
    Some(match extract::resolve_column(text, input.columns) {
        Some(col) => {
            let mut c = with_column(c, &col);
            c.target = Target::column(col.letter.clone());
            c
        }
        None => c,
    })
}

static TWO_COLUMNS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:please\s+)?(?:delete|remove|drop)\s+(?:the\s+)?col(?:umn)?s?\s+(?P<first>[a-z])\s+(?:and|&)\s+(?:col(?:umn)?\s+)?(?P<second>[a-z])\s*[.!]*$").unwrap()
});

fn delete_two_columns(input: &RuleInput) -> Option<Classification> {
    let caps = TWO_COLUMNS.captures(input.text)?;
    let first = caps["first"].to_uppercase();
    let second = caps["second"].to_uppercase();

    if are_adjacent(&first, &second) {
        Some(
            Classification::new(
                Intent::ColumnOperation,
                "delete_column",
                Target::column(first.clone()),
                0.95,
                format!("Adjacent columns {} and {}", first, second),
            )
            .with_param("column", first)
            .with_param("count", 2),
        )
    } else {
        Some(multiple_columns(vec![first, second]))
    }
}

static COLUMN_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:please\s+)?(?:delete|remove|drop)\s+(?:the\s+)?col(?:umn)?s?\s+(?P<list>[a-z]{1,2}(?:\s*,\s*(?:and\s+)?[a-z]{1,2})+(?:\s*,?\s*(?:and|&)\s+[a-z]{1,2})?)\s*[.!]*$").unwrap()
});

fn delete_column_list(input: &RuleInput) -> Option<Classification> {
    let caps = COLUMN_LIST.captures(input.text)?;
    let columns = extract::parse_column_list(&caps["list"]);
    if columns.is_empty() {
        return None;
    }
    Some(multiple_columns(columns))
}

fn multiple_columns(columns: Vec<String>) -> Classification {
    Classification::new(
        Intent::ColumnOperation,
        "delete_columns_multiple",
        Target::column(columns.join(",")),
        0.95,
        format!("Explicit column list {}", columns.join(", ")),
    )
    .with_param("columns", columns)
}

/// Conjunction plus at least two operation categories.
fn compound(input: &RuleInput) -> Option<Classification> {
    if !extract::has_conjunction(input.text) {
        return None;
    }
    let categories = operation_categories(&input.operations);
    if categories.len() < 2 {
        return None;
    }
    let operations = extract::split_sub_commands(input.text);
    if operations.len() < 2 {
        return None;
    }
    let count = operations.len();
    Some(
        Classification::new(
            Intent::CompoundOperation,
            "execute_sequence",
            Target::new(TargetType::Compound, count.to_string()),
            0.9,
            format!("{} operations across {} categories", count, categories.len()),
        )
        .with_param(
            "operations",
            operations.into_iter().map(Value::String).collect::<Vec<_>>(),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::ColumnMapping;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(text: &str) -> Option<Classification> {
        let mapping = ColumnMapping::new();
        match_priority(&RuleInput::new(text, &mapping)).map(|(c, _)| c)
    }

    #[test]
    fn highlight_duplicates_wins_over_destructive_verbs() {
        for text in [
            "highlight duplicates",
            "remove the highlight from duplicates",
            "find duplicates and highlight them then remove column b",
            "highlight duplicated names in column c",
        ] {
            let c = run(text).unwrap();
            assert_eq!(c.intent, Intent::ConditionalFormat, "{}", text);
            assert_eq!(c.action, "highlight_duplicates", "{}", text);
        }
        assert_eq!(
            run("highlight duplicated names in column c").unwrap().target,
            Target::column("C")
        );
    }

    #[test]
    fn adjacent_pair_collapses_to_count() {
        let c = run("delete columns d and e").unwrap();
        assert_eq!(c.action, "delete_column");
        assert_eq!(c.param_str("column"), Some("D"));
        assert_eq!(c.parameters.get("count"), Some(&json!(2)));
        assert_eq!(c.intent, Intent::ColumnOperation);
    }

    #[test]
    fn non_adjacent_pair_keeps_input_order() {
        let c = run("delete column e and b").unwrap();
        assert_eq!(c.action, "delete_columns_multiple");
        assert_eq!(c.parameters.get("columns"), Some(&json!(["E", "B"])));
        let reversed = run("remove columns b and a").unwrap();
        assert_eq!(reversed.parameters.get("columns"), Some(&json!(["B", "A"])));
    }

    #[test]
    fn comma_lists_are_ordered_and_deduplicated() {
        let c = run("delete columns a, b, and c").unwrap();
        assert_eq!(c.parameters.get("columns"), Some(&json!(["A", "B", "C"])));
        let dup = run("delete columns c, a, c and b").unwrap();
        assert_eq!(dup.parameters.get("columns"), Some(&json!(["C", "A", "B"])));
    }

    #[test]
    fn heterogeneous_operations_are_compound() {
        let c = run("delete column b and then freeze the top row").unwrap();
        assert_eq!(c.intent, Intent::CompoundOperation);
        assert_eq!(
            c.parameters.get("operations"),
            Some(&json!(["delete column b", "freeze the top row"]))
        );
        assert!(c.confidence >= 0.9);
    }

    #[test]
    fn deletion_plus_insertion_is_compound() {
        let c = run("delete column a and insert a row above row 2").unwrap();
        assert_eq!(c.intent, Intent::CompoundOperation);
        assert_eq!(
            c.parameters.get("operations"),
            Some(&json!(["delete column a", "insert a row above row 2"]))
        );
    }

    #[test]
    fn single_category_is_not_compound() {
        assert!(run("delete column d and remove column f").is_none());
        assert!(run("sort column a").is_none());
        assert!(run("filter rows where region is east and total is above 100").is_none());
    }
}
