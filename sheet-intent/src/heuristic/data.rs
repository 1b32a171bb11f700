//! Rules over cell values: duplicates, filters, destructive data changes,
//! find/replace and value conditions.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{with_column, ColumnScope, RuleInput};
use crate::extract::{self, Condition};
use crate::patterns::{self, ACTION_FILTER, ACTION_HIGHLIGHT, ACTION_REMOVE};
use crate::types::{Classification, Intent, Target};

static DUPLICATE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bduplicat\w*|\bdupes?\b|\brepeated\s+values\b").unwrap());

static HIGHLIGHT_VERB: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b{}\b", ACTION_HIGHLIGHT)).unwrap());

static REMOVE_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b{}\b|\bdedupe\b|\beliminate\b", ACTION_REMOVE)).unwrap()
});

static FIND_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:find|show|identify|list|count|detect|check|spot)\b").unwrap()
});

static COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?P<color>red|green|blue|yellow|orange|purple|pink|gr[ae]y|black|white)\b")
        .unwrap()
});

pub(super) fn color(text: &str) -> Option<String> {
    COLOR
        .captures(text)
        .map(|caps| caps["color"].replace("grey", "gray"))
}

pub(super) fn duplicates(input: &RuleInput) -> Option<Classification> {
    if !DUPLICATE_WORD.is_match(input.text) {
        return None;
    }
    let scope = input.column_scope();
    let target = scope.target_or_all()?;

    let classification = if HIGHLIGHT_VERB.is_match(input.text) {
        let mut c = Classification::new(
            Intent::ConditionalFormat,
            "highlight_duplicates",
            target,
            0.95,
            "Highlight verb with duplicate keyword",
        );
        if let Some(color) = color(input.text) {
            c = c.with_param("color", color);
        }
        c
    } else if REMOVE_VERB.is_match(input.text) {
        Classification::new(
            Intent::DataModification,
            "remove_duplicates",
            target,
            0.9,
            "Removing duplicates modifies data, not structure",
        )
    } else if FIND_VERB.is_match(input.text) {
        Classification::new(
            Intent::ConditionalFormat,
            "highlight_duplicates",
            target,
            0.85,
            "Finding duplicates is rendered as highlighting them",
        )
    } else {
        return None;
    };

    Some(match scope.column() {
        Some(col) => with_column(classification, col),
        None => classification,
    })
}

static CLEAR_FILTERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:clear|remove|reset|disable|turn\s+off|delete|drop)\s+(?:all\s+)?(?:the\s+)?(?:auto\s*-?)?(?:filters?|filtering)\b|\bunfilter\b",
    )
    .unwrap()
});

pub(super) fn clear_filters(input: &RuleInput) -> Option<Classification> {
    CLEAR_FILTERS.is_match(input.text).then(|| {
        Classification::new(
            Intent::Filter,
            "clear_filters",
            Target::all_data(),
            0.9,
            "Explicit request to clear filters",
        )
    })
}

static ENABLE_FILTERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:add|enable|turn\s+on|open|apply|create|show|activate|insert|put)\s+(?:a\s+|an\s+|the\s+)?(?:auto\s*-?)?filters?\b|\bfilters?\s+on\b",
    )
    .unwrap()
});

pub(super) fn enable_filters(input: &RuleInput) -> Option<Classification> {
    if !ENABLE_FILTERS.is_match(input.text) || extract::extract_condition(input.text).is_some() {
        return None;
    }
    let scope = input.column_scope();
    let classification = Classification::new(
        Intent::Filter,
        "enable_filters",
        scope.target_or_all()?,
        0.9,
        "Request to turn on filter controls",
    );
    Some(match scope.column() {
        Some(col) => with_column(classification, col),
        None => classification,
    })
}

static REMOVE_EMPTY_ROWS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:delete|remove|drop|clear\s+out|get\s+rid\s+of)\s+(?:all\s+)?(?:the\s+)?(?:empty|blank)\s+rows\b").unwrap()
});

static DELETE_ROWS_WHERE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:delete|remove|drop|get\s+rid\s+of)\s+(?:all\s+)?(?:the\s+)?(?:rows?|records?|entries|data)\s+(?P<criteria>(?:where|with|that|which|whose|containing|having|if)\b.*)$").unwrap()
});

static TRIM_WHITESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:trim|strip)\b.*\b(?:whitespace|spaces?)\b").unwrap()
});

static CHANGE_CASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:convert|change|make|transform|turn)\b.*\b(?P<case>upper|lower|title|proper)\s*-?case\b").unwrap()
});

static FILL_EMPTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bfill\s+(?:all\s+)?(?:the\s+)?(?:empty|blank)\s+cells\s+with\s+(?P<value>.+?)\s*[.!]*$").unwrap()
});

pub(super) fn data_modification(input: &RuleInput) -> Option<Classification> {
    let text = input.text;
    if HIGHLIGHT_VERB.is_match(text) {
        return None;
    }

    if REMOVE_EMPTY_ROWS.is_match(text) {
        return Some(Classification::new(
            Intent::DataModification,
            "remove_empty_rows",
            Target::all_data(),
            0.9,
            "Removing empty rows deletes data rows",
        ));
    }

    if let Some(caps) = DELETE_ROWS_WHERE.captures(text) {
        let criteria = caps["criteria"].to_string();
        let scope = input.column_scope();
        let mut c = Classification::new(
            Intent::DataModification,
            "delete_rows_where",
            scope.target_or_all()?,
            0.9,
            "Conditional deletion of data rows",
        )
        .with_param("criteria", criteria.clone());
        if let Some(condition) = extract::extract_condition_or_equality(&criteria) {
            condition.write_params(&mut c.parameters);
        }
        if let Some(col) = scope.column() {
            c = with_column(c, col);
        }
        return Some(c);
    }

    if TRIM_WHITESPACE.is_match(text) {
        return scoped(input, "trim_whitespace", 0.85, "Whitespace cleanup");
    }

    if let Some(caps) = CHANGE_CASE.captures(text) {
        let case = caps["case"].to_lowercase().replace("proper", "title");
        return scoped(input, "change_case", 0.85, "Text case conversion")
            .map(|c| c.with_param("case", case));
    }

    if let Some(caps) = FILL_EMPTY.captures(text) {
        let value = extract::literal_value(&caps["value"]);
        return Some(
            Classification::new(
                Intent::DataModification,
                "fill_empty",
                Target::all_data(),
                0.85,
                "Fill blank cells with a constant",
            )
            .with_param("value", value),
        );
    }

    None
}

fn scoped(input: &RuleInput, action: &str, confidence: f64, reasoning: &str) -> Option<Classification> {
    let scope = input.column_scope();
    let c = Classification::new(
        Intent::DataModification,
        action,
        scope.target_or_all()?,
        confidence,
        reasoning,
    );
    Some(match scope.column() {
        Some(col) => with_column(c, col),
        None => c,
    })
}

static REPLACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\breplace\s+(?:all\s+)?(?:occurrences\s+of\s+|instances\s+of\s+)?(?P<find>"[^"]*"|'[^']*'|\S+(?:\s+\S+)*?)\s+(?:with|by)\s+(?P<replace>"[^"]*"|'[^']*'|\S+(?:\s+\S+)*?)(?:\s+(?:in|on|across|throughout)\s+.*)?\s*[.!]*$"#).unwrap()
});

static CHANGE_ALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bchange\s+(?:all\s+)?(?P<find>"[^"]*"|'[^']*')\s+(?:to|into)\s+(?P<replace>"[^"]*"|'[^']*'|\S+)"#).unwrap()
});

pub(super) fn find_replace(input: &RuleInput) -> Option<Classification> {
    let caps = REPLACE
        .captures(input.text)
        .or_else(|| CHANGE_ALL.captures(input.text))?;
    let find = patterns::unquote(&caps["find"]).to_string();
    let replace = patterns::unquote(&caps["replace"]).to_string();

    let scope = input.column_scope();
    let c = Classification::new(
        Intent::FindReplace,
        "replace_all",
        scope.target_or_all()?,
        0.9,
        format!("Replace '{}' with '{}'", find, replace),
    )
    .with_param("find", find)
    .with_param("replace", replace);
    Some(match scope.column() {
        Some(col) => with_column(c, col),
        None => c,
    })
}

static FILTER_VERB: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b{}\b", ACTION_FILTER)).unwrap());

/// Explicit filter verb with a resolved column and a condition.
pub(super) fn filter_by_value(input: &RuleInput) -> Option<Classification> {
    if !FILTER_VERB.is_match(input.text) {
        return None;
    }
    let condition = extract::extract_condition_or_equality(input.text)?;
    let scope = input.column_scope();
    let col = scope.column()?;
    Some(with_column(
        condition_classification(
            Intent::Filter,
            "filter_by_value",
            Target::column(col.letter.clone()),
            &condition,
            0.9,
        ),
        col,
    ))
}

static VALUE_FILTER_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:filter|show|display|only|find|list|keep|get|select)\b").unwrap()
});

/// Alternative value phrasings normalised to `{condition, value}` or `{condition, min, max}`.
pub(super) fn value_condition(input: &RuleInput) -> Option<Classification> {
    let text = input.text;
    let highlight = HIGHLIGHT_VERB.is_match(text);
    let condition = extract::extract_condition_or_equality(text);
    if !highlight && (condition.is_none() || !VALUE_FILTER_VERB.is_match(text)) {
        return None;
    }

    let scope = input.column_scope();
    let target = scope.target_or_all()?;

    let mut c = match (&condition, highlight) {
        (Some(condition), true) => condition_classification(
            Intent::ConditionalFormat,
            "highlight_cells",
            target,
            condition,
            0.9,
        ),
        (None, true) => Classification::new(
            Intent::ConditionalFormat,
            "highlight_cells",
            target,
            0.85,
            "Highlight without a value condition",
        ),
        (Some(condition), false) => {
            condition_classification(Intent::Filter, "filter_by_value", target, condition, 0.85)
        }
        (None, false) => return None,
    };
    if highlight {
        if let Some(color) = color(text) {
            c = c.with_param("color", color);
        }
    }
    if let ColumnScope::Resolved(col) = &scope {
        c = with_column(c, col);
    }
    Some(c)
}

fn condition_classification(
    intent: Intent,
    action: &str,
    target: Target,
    condition: &Condition,
    confidence: f64,
) -> Classification {
    let mut c = Classification::new(
        intent,
        action,
        target,
        confidence,
        format!("Value condition '{}'", condition.kind.as_str()),
    );
    condition.write_params(&mut c.parameters);
    c
}

static CLEAR_FILTER_VARIANTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:show|display|unhide|bring\s+back)\s+(?:all|every)\s+(?:the\s+)?(?:rows|data|records)\b|\bstop\s+filtering\b|\bno\s+filters?\b|\bfilters?\s+off\b|\breset\s+(?:the\s+)?view\b").unwrap()
});

pub(super) fn clear_filter_variants(input: &RuleInput) -> Option<Classification> {
    CLEAR_FILTER_VARIANTS.is_match(input.text).then(|| {
        Classification::new(
            Intent::Filter,
            "clear_filters",
            Target::all_data(),
            0.85,
            "Phrasing that restores all rows",
        )
    })
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
    fn duplicate_verbs_pick_the_family() {
        let highlighted = run(duplicates, "mark duplicates in red").unwrap();
        assert_eq!(highlighted.action, "highlight_duplicates");
        assert_eq!(highlighted.param_str("color"), Some("red"));

        let removed = run(duplicates, "remove duplicates from column a").unwrap();
        assert_eq!(removed.intent, Intent::DataModification);
        assert_eq!(removed.target, Target::column("A"));

        assert!(run(duplicates, "sort column a").is_none());
    }

    #[test]
    fn filter_toggles() {
        assert_eq!(run(clear_filters, "remove all filters").unwrap().action, "clear_filters");
        assert_eq!(run(enable_filters, "turn on filters").unwrap().action, "enable_filters");
        assert!(run(enable_filters, "add a filter for values over 10").is_none());
        assert!(run(clear_filter_variants, "show all rows").is_some());
    }

    #[test]
    fn conditional_row_deletion_keeps_criteria() {
        let c = run(data_modification, "delete rows where amount is below 0").unwrap();
        assert_eq!(c.action, "delete_rows_where");
        assert_eq!(c.param_str("condition"), Some("less_than"));
        assert_eq!(c.parameters.get("value"), Some(&json!(0.0)));
        assert_eq!(c.param_str("criteria"), Some("where amount is below 0"));
    }

    #[test]
    fn data_modification_variants() {
        assert_eq!(run(data_modification, "remove blank rows").unwrap().action, "remove_empty_rows");
        assert_eq!(
            run(data_modification, "trim the whitespace in column b").unwrap().target,
            Target::column("B")
        );
        let case = run(data_modification, "convert column a to uppercase").unwrap();
        assert_eq!(case.param_str("case"), Some("upper"));
        let fill = run(data_modification, "fill empty cells with 0").unwrap();
        assert_eq!(fill.parameters.get("value"), Some(&json!(0.0)));
        assert!(run(data_modification, "highlight and delete rows where x is 1").is_none());
    }

    #[test]
    fn replace_extracts_both_sides() {
        let c = run(find_replace, "replace 'n/a' with 'unknown' in column c").unwrap();
        assert_eq!(c.param_str("find"), Some("n/a"));
        assert_eq!(c.param_str("replace"), Some("unknown"));
        assert_eq!(c.target, Target::column("C"));

        let plain = run(find_replace, "replace apples with oranges").unwrap();
        assert_eq!(plain.param_str("find"), Some("apples"));
        assert_eq!(plain.param_str("replace"), Some("oranges"));
    }

    #[test]
    fn filter_by_value_requires_a_column() {
        let c = run(filter_by_value, "filter column c where value is greater than 100").unwrap();
        assert_eq!(c.target, Target::column("C"));
        assert_eq!(c.param_str("condition"), Some("greater_than"));
        assert!(run(filter_by_value, "filter values greater than 100").is_none());
    }

    #[test]
    fn value_condition_without_column_targets_all_data() {
        let c = run(value_condition, "show only rows with values below 5").unwrap();
        assert_eq!(c.intent, Intent::Filter);
        assert_eq!(c.target, Target::all_data());
        assert_eq!(c.param_str("condition"), Some("less_than"));
    }
}
