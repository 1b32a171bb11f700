//! Object rules (tables, links, comments, validation, names, images),
//! formatting, data entry and the analysis catch-all.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{with_column, RuleInput};
use crate::patterns::{self, CELL_REF, RANGE_REF};
use crate::types::{Classification, Intent, Target};

static RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b(?P<range>{})\b", RANGE_REF)).unwrap());

static CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"(?i)\b(?P<cell>{})\b", CELL_REF)).unwrap());

static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?P<url>https?://\S+|www\.\S+)").unwrap());

fn normalised_range(text: &str) -> Option<String> {
    RANGE.captures(text).map(|caps| {
        caps["range"]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase()
    })
}

/// Cell reference outside of any URL.
fn cell_target(text: &str) -> Target {
    let without_urls = URL.replace_all(text, "");
    match CELL.captures(&without_urls) {
        Some(caps) => Target::cell(caps["cell"].to_uppercase()),
        None => Target::all_data(),
    }
}

fn url(text: &str) -> Option<String> {
    URL.captures(text).map(|caps| {
        caps["url"]
            .trim_end_matches(|c| matches!(c, '.' | ',' | '!' | ')'))
            .to_string()
    })
}

static TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:create|make|insert|add|build)\s+(?:a\s+|an\s+)?(?:new\s+)?table\b|\bformat\s+(?:\S+\s+)*?as\s+(?:a\s+)?table\b|\bconvert\b.*\b(?:in)?to\s+(?:a\s+)?table\b").unwrap()
});

pub(super) fn table(input: &RuleInput) -> Option<Classification> {
    if !TABLE.is_match(input.text) || input.text.contains("pivot") {
        return None;
    }
    let target = match normalised_range(input.text) {
        Some(range) => Target::range(range),
        None => Target::all_data(),
    };
    Some(Classification::new(
        Intent::TableOperation,
        "create_table",
        target,
        0.95,
        "Create a table over the data",
    ))
}

static ADD_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:add|insert|create|put|attach)\s+(?:a\s+)?(?:hyper)?link\b|\bhyperlink\b|\blink\s+(?:cell\s+)?[a-z]{1,2}\d+\s+to\b").unwrap()
});

static REMOVE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:remove|delete|clear)\s+(?:the\s+|all\s+)?(?:hyper)?links?\b").unwrap()
});

pub(super) fn hyperlink(input: &RuleInput) -> Option<Classification> {
    let text = input.text;
    if REMOVE_LINK.is_match(text) {
        return Some(Classification::new(
            Intent::HyperlinkOperation,
            "remove_hyperlink",
            cell_target(text),
            0.9,
            "Remove hyperlink",
        ));
    }
    if !ADD_LINK.is_match(text) {
        return None;
    }
    let mut c = Classification::new(
        Intent::HyperlinkOperation,
        "add_hyperlink",
        cell_target(text),
        0.9,
        "Attach a hyperlink",
    );
    if let Some(url) = url(text) {
        c = c.with_param("url", url);
    }
    Some(c)
}

static ADD_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:add|insert|put|leave|write|attach)\s+(?:a\s+)?(?:comment|note)\b").unwrap()
});

static REMOVE_COMMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:delete|remove|clear)\s+(?:the\s+|all\s+)?(?:comments?|notes?)\b").unwrap()
});

static COMMENT_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\bsaying|\bthat\s+says|\bwith\s+(?:the\s+)?text|:)\s*(?P<text>.+?)\s*$").unwrap()
});

pub(super) fn comment(input: &RuleInput) -> Option<Classification> {
    let text = input.text;
    if REMOVE_COMMENT.is_match(text) {
        return Some(Classification::new(
            Intent::CommentOperation,
            "remove_comment",
            cell_target(text),
            0.9,
            "Remove comment",
        ));
    }
    if !ADD_COMMENT.is_match(text) {
        return None;
    }
    let mut c = Classification::new(
        Intent::CommentOperation,
        "add_comment",
        cell_target(text),
        0.9,
        "Attach a comment",
    );
    if let Some(caps) = COMMENT_TEXT.captures(text) {
        c = c.with_param("text", patterns::unquote(&caps["text"]).to_string());
    }
    Some(c)
}

static VALIDATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:data\s+validation|validation|validate|dropdown|drop-down|drop\s+down|picklist|restrict\s+(?:input|values|entries))\b").unwrap()
});

static DROPDOWN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:dropdown|drop-down|drop\s+down|picklist)\b").unwrap());

static OPTIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:options|values|choices|items)\s*:?\s*(?P<list>.+?)\s*[.!]*$").unwrap()
});

static OPTION_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*,\s*(?:and\s+|or\s+)?|\s+(?:and|or)\s+|\s*/\s*").unwrap());

pub(super) fn data_validation(input: &RuleInput) -> Option<Classification> {
    let text = input.text;
    if !VALIDATION.is_match(text) {
        return None;
    }
    let scope = input.column_scope();
    let target = scope.target_or_all()?;

    let mut c = if DROPDOWN.is_match(text) {
        let mut c = Classification::new(
            Intent::DataValidation,
            "add_dropdown",
            target,
            0.9,
            "Dropdown list validation",
        );
        if let Some(caps) = OPTIONS.captures(text) {
            let options: Vec<String> = OPTION_SEPARATOR
                .split(&caps["list"])
                .map(|o| patterns::unquote(o).to_string())
                .filter(|o| !o.is_empty())
                .collect();
            c = c.with_param("options", options);
        }
        c
    } else {
        let mut c = Classification::new(
            Intent::DataValidation,
            "add_validation",
            target,
            0.85,
            "Input validation rule",
        );
        if let Some(condition) = crate::extract::extract_condition(text) {
            condition.write_params(&mut c.parameters);
        }
        c
    };
    if let Some(col) = scope.column() {
        c = with_column(c, col);
    }
    Some(c)
}

static NAME_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"(?i)\bname\s+(?:the\s+)?(?:range\s+)?(?P<range>{})\s+(?:as\s+)?(?P<name>"[^"]*"|'[^']*'|[a-z_][a-z0-9_]*)"#,
        RANGE_REF
    ))
    .unwrap()
});

static CREATE_NAMED_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:create|add|define|make)\s+(?:a\s+)?named\s+range(?:\s+(?:called|named))?(?:\s+(?P<name>"[^"]*"|'[^']*'|[a-z_][a-z0-9_]*))?"#).unwrap()
});

pub(super) fn named_range(input: &RuleInput) -> Option<Classification> {
    let text = input.text;
    let (name, range) = if let Some(caps) = NAME_RANGE.captures(text) {
        (
            Some(patterns::unquote(&caps["name"]).to_string()),
            normalised_range(&caps["range"]),
        )
    } else if let Some(caps) = CREATE_NAMED_RANGE.captures(text) {
        (
            caps.name("name")
                .map(|m| patterns::unquote(m.as_str()).to_string())
                .filter(|n| n != "for"),
            normalised_range(text),
        )
    } else {
        return None;
    };

    let target = match &range {
        Some(range) => Target::range(range.clone()),
        None => Target::all_data(),
    };
    let mut c = Classification::new(
        Intent::NamedRangeOperation,
        "create_named_range",
        target,
        0.9,
        "Define a named range",
    );
    if let Some(name) = name {
        c = c.with_param("name", name);
    }
    if let Some(range) = range {
        c = c.with_param("range", range);
    }
    Some(c)
}

static IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:insert|add|put|embed|place)\s+(?:an?\s+|the\s+|my\s+)?(?:image|picture|photo|logo)\b").unwrap()
});

pub(super) fn image(input: &RuleInput) -> Option<Classification> {
    if !IMAGE.is_match(input.text) {
        return None;
    }
    let mut c = Classification::new(
        Intent::ImageOperation,
        "insert_image",
        cell_target(input.text),
        0.9,
        "Insert an image",
    );
    if let Some(url) = url(input.text) {
        c = c.with_param("url", url);
    }
    Some(c)
}

static NUMBER_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:format|display|show|make|set)\b.*?\b(?:as|in|into|to)\s+(?:a\s+)?(?P<format>currency|dollars?|percent(?:age)?s?|dates?|numbers?|decimals?|time|scientific)\b").unwrap()
});

static TEXT_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?P<style>bold|italici[sz]e|italic|underline)\b").unwrap());

static AUTO_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:auto\s*-?format|beautify|smart\s+format|clean\s+up\s+the\s+formatting|format\s+(?:the\s+)?(?:table|sheet|data|spreadsheet)|make\s+(?:it|this|the\s+\w+)\s+look\s+(?:nice|better|professional|good))\b").unwrap()
});

static HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bheaders?(?:\s+row)?\b").unwrap());

pub(super) fn smart_format(input: &RuleInput) -> Option<Classification> {
    let text = input.text;
    let scope = input.column_scope();

    let c = if let Some(caps) = NUMBER_FORMAT.captures(text) {
        let format = match caps["format"].trim_end_matches('s') {
            "dollar" | "currency" => "currency",
            f if f.starts_with("percent") => "percent",
            other => other,
        }
        .to_string();
        Classification::new(
            Intent::SmartFormat,
            "apply_number_format",
            scope.target_or_all()?,
            0.85,
            format!("Number format '{}'", format),
        )
        .with_param("format", format)
    } else if let Some(caps) = TEXT_STYLE.captures(text) {
        let style = match &caps["style"] {
            "italicise" | "italicize" => "italic",
            other => other,
        }
        .to_string();
        let target = if HEADER.is_match(text) {
            Target::row("1")
        } else {
            scope.target_or_all()?
        };
        Classification::new(
            Intent::SmartFormat,
            "apply_text_style",
            target,
            0.85,
            format!("Text style '{}'", style),
        )
        .with_param("style", style)
    } else if AUTO_FORMAT.is_match(text) {
        Classification::new(
            Intent::SmartFormat,
            "auto_format",
            scope.target_or_all()?,
            0.85,
            "Automatic formatting",
        )
    } else {
        return None;
    };

    Some(match scope.column() {
        Some(col) => with_column(c, col),
        None => c,
    })
}

static DATA_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:add|enter|append|log|record|insert)\s+(?:a\s+|an\s+)?(?:new\s+)?(?:entry|record|sale|expense|transaction|row\s+(?:with|for|containing))\b").unwrap()
});

static FILL_SERIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bfill\s+(?:down|right|series|in\s+the\s+series)\b").unwrap());

static ENTRY_DETAILS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:for|with|containing)\s+(?P<details>.+?)\s*[.!]*$").unwrap());

pub(super) fn data_entry(input: &RuleInput) -> Option<Classification> {
    let text = input.text;
    if FILL_SERIES.is_match(text) {
        let scope = input.column_scope();
        return Some(Classification::new(
            Intent::DataEntry,
            "fill_series",
            scope.target_or_all()?,
            0.85,
            "Fill a series",
        ));
    }
    if !DATA_ENTRY.is_match(text) {
        return None;
    }
    let mut c = Classification::new(
        Intent::DataEntry,
        "add_entry",
        Target::all_data(),
        0.85,
        "Append a record",
    );
    if let Some(caps) = ENTRY_DETAILS.captures(text) {
        c = c.with_param("details", caps["details"].to_string());
    }
    Some(c)
}

static GENERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:hi|hello|hey|help|thanks?|thank\s+you|what\s+can\s+you\s+do|who\s+are\s+you|how\s+do\s+i\s+use\s+this)\b").unwrap()
});

pub(super) fn general_query(input: &RuleInput) -> Option<Classification> {
    GENERAL.is_match(input.text).then(|| {
        Classification::new(
            Intent::GeneralQuery,
            "answer_question",
            Target::all_data(),
            0.8,
            "Conversational or help request",
        )
        .with_param("query", input.text.to_string())
    })
}

static ANALYSIS_KINDS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("comparison", r"\b(?:compare|comparison|versus|vs\.?|difference\s+between)\b"),
        ("correlation", r"\bcorrelat\w*|\brelationship\s+between\b"),
        ("trend", r"\b(?:trends?|over\s+time|growth|month\s+over\s+month|year\s+over\s+year)\b"),
        ("forecast", r"\b(?:predict\w*|forecast\w*|projection|project)\b"),
        ("visualization", r"\b(?:chart|graph|plot|visuali[sz]\w*|histogram|dashboard|pie)\b"),
        ("statistics", r"\b(?:average|mean|median|mode|sum|total|count|how\s+many|how\s+much|max(?:imum)?|min(?:imum)?|std|standard\s+deviation|variance|distribution|outliers?|percentage\s+of|pivot)\b"),
        ("summary", r"\b(?:analy[sz]e|analysis|insights?|summar\w*|overview|breakdown|statistic\w*|patterns?)\b"),
        ("question", r"^(?:what|which|who|why|when|where|how)\b"),
    ]
    .into_iter()
    .map(|(kind, src)| (kind, Regex::new(&format!("(?i){}", src)).unwrap()))
    .collect()
});

/// Generic analysis and visualization catch-all.
pub(super) fn analysis(input: &RuleInput) -> Option<Classification> {
    let kind = ANALYSIS_KINDS
        .iter()
        .find(|(_, re)| re.is_match(input.text))
        .map(|(kind, _)| *kind)?;
    Some(
        Classification::new(
            Intent::IntelligentAnalysis,
            "analyze_data",
            Target::all_data(),
            0.75,
            format!("Analytical request ({})", kind),
        )
        .with_param("analysis_type", kind)
        .with_param("query", input.text.to_string()),
    )
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
    fn table_over_range_or_all_data() {
        assert_eq!(run(table, "create a table").unwrap().target, Target::all_data());
        assert_eq!(
            run(table, "format a1:d20 as a table").unwrap().target,
            Target::range("A1:D20")
        );
        assert!(run(table, "create a pivot table").is_none());
    }

    #[test]
    fn links_and_comments_target_cells() {
        let link = run(hyperlink, "add a link to https://example.com/v2 in a1").unwrap();
        assert_eq!(link.target, Target::cell("A1"));
        assert_eq!(link.param_str("url"), Some("https://example.com/v2"));

        let note = run(comment, "add a comment to b3 saying check this").unwrap();
        assert_eq!(note.target, Target::cell("B3"));
        assert_eq!(note.param_str("text"), Some("check this"));
        assert_eq!(run(comment, "remove all comments").unwrap().action, "remove_comment");
    }

    #[test]
    fn dropdown_options_are_split() {
        let c = run(data_validation, "add a dropdown to column d with options yes, no or maybe").unwrap();
        assert_eq!(c.parameters.get("options"), Some(&json!(["yes", "no", "maybe"])));
        assert_eq!(c.target, Target::column("D"));
    }

    #[test]
    fn named_range_reads_name_and_range() {
        let c = run(named_range, "name the range a1:b10 as totals").unwrap();
        assert_eq!(c.param_str("name"), Some("totals"));
        assert_eq!(c.param_str("range"), Some("A1:B10"));
    }

    #[test]
    fn formatting_variants() {
        let money = run(smart_format, "format column b as currency").unwrap();
        assert_eq!(money.param_str("format"), Some("currency"));
        assert_eq!(money.target, Target::column("B"));
        let pct = run(smart_format, "show column c as percentages").unwrap();
        assert_eq!(pct.param_str("format"), Some("percent"));
        let bold = run(smart_format, "bold the header row").unwrap();
        assert_eq!(bold.target, Target::row("1"));
        assert_eq!(run(smart_format, "make it look professional").unwrap().action, "auto_format");
    }

    #[test]
    fn analysis_catch_all_labels_kind() {
        let c = run(analysis, "compare sales versus last year").unwrap();
        assert_eq!(c.param_str("analysis_type"), Some("comparison"));
        assert_eq!(c.confidence, 0.75);
        assert!(run(analysis, "purple monkey dishwasher").is_none());
    }
}
