//! Heuristic classifier
//!
//! Deterministic, LLM-independent classification: an ordered battery of
//! rules, one per semantic family, evaluated first-match-wins. The battery is
//! a plain slice so callers and tests can enumerate every rule.

mod data;
mod extras;
mod structure;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::columns::ColumnMapping;
use crate::extract::{self, ColumnRef, Operation};
use crate::types::{Classification, Target};

/// Input handed to every rule: normalised text plus lightweight context.
#[derive(Debug, Clone)]
pub struct RuleInput<'a> {
    /// Lower-cased, trimmed utterance.
    pub text: &'a str,
    /// Operation keywords found in `text`, in order of appearance.
    pub operations: Vec<Operation>,
    pub columns: &'a ColumnMapping,
}

impl<'a> RuleInput<'a> {
    pub fn new(text: &'a str, columns: &'a ColumnMapping) -> Self {
        Self {
            text,
            operations: extract::extract_operations(text),
            columns,
        }
    }

    pub fn has_operation(&self, op: Operation) -> bool {
        self.operations.contains(&op)
    }

    /// Where the utterance points column-wise.
    pub fn column_scope(&self) -> ColumnScope {
        match extract::resolve_column(self.text, self.columns) {
            Some(col) => ColumnScope::Resolved(col),
            None if COLUMN_CUE.is_match(self.text) => ColumnScope::Unresolved,
            None => ColumnScope::Unspecified,
        }
    }
}

static COLUMN_CUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcol(?:umn)?s?\b|\bby\s+(?:the\s+)?[a-z0-9]").unwrap());

/// Column resolution outcome for a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnScope {
    /// A column was identified by letter or by name.
    Resolved(ColumnRef),
    /// The text names a column that could not be resolved; column rules must not fire.
    Unresolved,
    /// The text does not mention a column at all.
    Unspecified,
}

impl ColumnScope {
    /// Column target when resolved, all data when unspecified, `None` when unresolved.
    pub fn target_or_all(&self) -> Option<Target> {
        match self {
            ColumnScope::Resolved(col) => Some(Target::column(col.letter.clone())),
            ColumnScope::Unspecified => Some(Target::all_data()),
            ColumnScope::Unresolved => None,
        }
    }

    pub fn column(&self) -> Option<&ColumnRef> {
        match self {
            ColumnScope::Resolved(col) => Some(col),
            _ => None,
        }
    }
}

/// One member of the battery.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&RuleInput) -> Option<Classification>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

static BATTERY: &[Rule] = &[
    Rule {
        name: "duplicates",
        apply: data::duplicates,
    },
    Rule {
        name: "clear_filters",
        apply: data::clear_filters,
    },
    Rule {
        name: "enable_filters",
        apply: data::enable_filters,
    },
    Rule {
        name: "data_modification",
        apply: data::data_modification,
    },
    Rule {
        name: "find_replace",
        apply: data::find_replace,
    },
    Rule {
        name: "filter_by_value",
        apply: data::filter_by_value,
    },
    Rule {
        name: "column_resize",
        apply: structure::column_resize,
    },
    Rule {
        name: "sort",
        apply: structure::sort,
    },
    Rule {
        name: "row_operation",
        apply: structure::row_operation,
    },
    Rule {
        name: "cell_operation",
        apply: structure::cell_operation,
    },
    Rule {
        name: "range_operation",
        apply: structure::range_operation,
    },
    Rule {
        name: "column_operation",
        apply: structure::column_operation,
    },
    Rule {
        name: "freeze",
        apply: structure::freeze,
    },
    Rule {
        name: "value_condition",
        apply: data::value_condition,
    },
    Rule {
        name: "clear_filter_variants",
        apply: data::clear_filter_variants,
    },
    Rule {
        name: "table",
        apply: extras::table,
    },
    Rule {
        name: "hyperlink",
        apply: extras::hyperlink,
    },
    Rule {
        name: "comment",
        apply: extras::comment,
    },
    Rule {
        name: "data_validation",
        apply: extras::data_validation,
    },
    Rule {
        name: "named_range",
        apply: extras::named_range,
    },
    Rule {
        name: "image",
        apply: extras::image,
    },
    Rule {
        name: "smart_format",
        apply: extras::smart_format,
    },
    Rule {
        name: "data_entry",
        apply: extras::data_entry,
    },
    Rule {
        name: "general_query",
        apply: extras::general_query,
    },
    Rule {
        name: "analysis",
        apply: extras::analysis,
    },
];

/// The ordered rule battery.
pub fn battery() -> &'static [Rule] {
    BATTERY
}

/// Run the battery; the first rule that fires wins, otherwise `unknown` at 0.3.
pub fn classify(input: &RuleInput) -> Classification {
    for rule in battery() {
        if let Some(classification) = (rule.apply)(input) {
            tracing::debug!(rule = rule.name, intent = %classification.intent, "heuristic rule matched");
            return classification;
        }
    }
    Classification::unknown(format!("No heuristic rule matched '{}'", input.text))
}

/// Convenience wrapper building the [`RuleInput`] from raw normalised text.
pub fn classify_text(text: &str, columns: &ColumnMapping) -> Classification {
    classify(&RuleInput::new(text, columns))
}

/// Name of the first battery rule that fires, if any.
pub fn matching_rule(input: &RuleInput) -> Option<&'static str> {
    battery()
        .iter()
        .find(|rule| (rule.apply)(input).is_some())
        .map(|rule| rule.name)
}

/// Attach a resolved column's letter (and header name) to a classification.
pub(crate) fn with_column(classification: Classification, col: &ColumnRef) -> Classification {
    let classification = classification.with_param("column", col.letter.clone());
    match &col.name {
        Some(name) => classification.with_param("column_name", name.clone()),
        None => classification,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Intent, TargetType, UNKNOWN_CONFIDENCE};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn classify_plain(text: &str) -> Classification {
        classify_text(text, &ColumnMapping::new())
    }

    fn classify_with(text: &str, headers: &[&str]) -> Classification {
        classify_text(text, &ColumnMapping::build(headers))
    }

    #[test]
    fn battery_order_is_fixed() {
        let names: Vec<&str> = battery().iter().map(|r| r.name).collect();
        assert_eq!(names.first(), Some(&"duplicates"));
        assert_eq!(names.last(), Some(&"analysis"));
        let pos = |n: &str| names.iter().position(|x| *x == n).unwrap();
        assert!(pos("clear_filters") < pos("enable_filters"));
        assert!(pos("data_modification") < pos("find_replace"));
        assert!(pos("sort") < pos("row_operation"));
        assert!(pos("range_operation") < pos("column_operation"));
        assert!(pos("freeze") < pos("value_condition"));
    }

    #[test]
    fn each_rule_has_an_exemplar() {
        let cases: &[(&str, &str)] = &[
            ("duplicates", "remove duplicates from column a"),
            ("clear_filters", "clear all filters"),
            ("enable_filters", "turn on filters"),
            ("data_modification", "remove empty rows"),
            ("find_replace", "replace \"n/a\" with \"0\""),
            ("filter_by_value", "filter column c where value is greater than 100"),
            ("column_resize", "autofit column b"),
            ("sort", "sort column a descending"),
            ("row_operation", "insert a row above row 3"),
            ("cell_operation", "set b2 to 42"),
            ("range_operation", "merge a1:c1"),
            ("column_operation", "delete column c"),
            ("freeze", "freeze the top row"),
            ("value_condition", "highlight values greater than 50"),
            ("clear_filter_variants", "show all rows"),
            ("table", "create a table"),
            ("hyperlink", "add a link to https://example.com in a1"),
            ("comment", "add a comment to b3 saying check this"),
            ("data_validation", "add a dropdown to column d with options yes, no"),
            ("named_range", "name the range a1:b10 as totals"),
            ("image", "insert an image in c2"),
            ("smart_format", "format column b as currency"),
            ("data_entry", "add a new entry for john with salary 5000"),
            ("general_query", "what can you do"),
            ("analysis", "what is the average playtime"),
        ];
        let mapping = ColumnMapping::new();
        for rule in battery() {
            let (_, text) = cases
                .iter()
                .find(|(name, _)| *name == rule.name)
                .unwrap_or_else(|| panic!("no exemplar for rule {}", rule.name));
            let input = RuleInput::new(text, &mapping);
            assert_eq!(matching_rule(&input), Some(rule.name), "text: {}", text);
        }
    }

    #[test]
    fn highlight_beats_destructive_verbs() {
        let c = classify_plain("highlight and remove values over 10");
        assert_eq!(c.intent, Intent::ConditionalFormat);
    }

    #[test]
    fn deleting_columns_is_structural_but_deleting_rows_of_data_is_not() {
        assert_eq!(classify_plain("delete column b").intent, Intent::ColumnOperation);
        assert_eq!(classify_plain("remove duplicates").intent, Intent::DataModification);
        assert_eq!(
            classify_plain("delete rows where amount is below 0").intent,
            Intent::DataModification
        );
    }

    #[test]
    fn value_conditions_share_one_shape() {
        for text in [
            "highlight values greater than 50",
            "highlight cells above 50",
            "highlight numbers over 50",
            "highlight anything > 50",
        ] {
            let c = classify_plain(text);
            assert_eq!(c.intent, Intent::ConditionalFormat, "{}", text);
            assert_eq!(c.param_str("condition"), Some("greater_than"), "{}", text);
            assert_eq!(c.parameters.get("value"), Some(&json!(50.0)), "{}", text);
        }
        let between = classify_plain("highlight values between 10 and 20");
        assert_eq!(between.param_str("condition"), Some("between"));
        assert_eq!(between.parameters.get("min"), Some(&json!(10.0)));
        assert_eq!(between.parameters.get("max"), Some(&json!(20.0)));
    }

    #[test]
    fn named_columns_resolve_through_mapping() {
        let c = classify_with(
            "sort by playtime descending",
            &["Game", "Playtime", "Genre"],
        );
        assert_eq!(c.intent, Intent::Sort);
        assert_eq!(c.target.target_type, TargetType::Column);
        assert_eq!(c.target.identifier, "B");
        assert_eq!(c.param_str("direction"), Some("desc"));
    }

    #[test]
    fn unresolved_column_does_not_fire() {
        let c = classify_with("sort by price", &["Game", "Playtime"]);
        assert_eq!(c.intent, Intent::Unknown);
        assert_eq!(c.confidence, UNKNOWN_CONFIDENCE);
    }

    #[test]
    fn equality_is_the_default_for_bare_values() {
        let c = classify_with(
            "highlight values that are pending in the status column",
            &["Task", "Status"],
        );
        assert_eq!(c.intent, Intent::ConditionalFormat);
        assert_eq!(c.param_str("condition"), Some("equals"));
        assert_eq!(c.param_str("value"), Some("pending"));
        assert_eq!(c.target, Target::column("B"));
    }

    #[test]
    fn rule_confidences_are_fixed_and_bounded() {
        for text in [
            "sort column a",
            "freeze the first 2 rows",
            "remove duplicates",
            "create a table",
            "gibberish words here",
        ] {
            let c = classify_plain(text);
            assert!((0.0..=1.0).contains(&c.confidence));
        }
        assert_eq!(
            classify_plain("sort column a").confidence,
            classify_plain("sort column b ascending").confidence
        );
    }

    #[test]
    fn nothing_matches_yields_unknown() {
        let c = classify_plain("purple monkey dishwasher");
        assert_eq!(c.intent, Intent::Unknown);
        assert_eq!(c.action, "unknown");
        assert_eq!(c.confidence, UNKNOWN_CONFIDENCE);
    }
}
