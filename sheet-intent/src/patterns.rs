//! Pattern library
//!
//! Named, reusable regular sub-expressions for actions, subjects, connectors,
//! comparison operators, locations and value literals. Every fragment is a
//! non-capturing, unanchored group so fragments can be concatenated freely;
//! captures and anchors are added only at composition time through
//! [`PatternBuilder`]. Compiled patterns are always case-insensitive.

use regex::Regex;

// ============================================================================
// Actions
// ============================================================================

pub const ACTION_HIGHLIGHT: &str = r"(?:highlight|colou?r|mark|shade|flag)";
pub const ACTION_SHOW: &str = r"(?:show|display|find|list|get)";
pub const ACTION_FILTER: &str =
    r"(?:filter|show\s+only|only\s+show|display\s+only|keep\s+only|limit\s+to)";
pub const ACTION_SORT: &str = r"(?:sort|order|arrange|rank)";
pub const ACTION_MODIFY: &str = r"(?:change|update|modify|set|edit)";
pub const ACTION_CREATE: &str = r"(?:create|make|add|insert|build)";
pub const ACTION_REMOVE: &str = r"(?:delete|remove|drop|erase|get\s+rid\s+of)";
pub const ACTION_FORMAT: &str = r"(?:format|bold|italici[sz]e|underline|style)";

// ============================================================================
// Subjects
// ============================================================================

pub const SUBJECT_CELLS: &str = r"(?:cells?|entries|entry|items?)";
pub const SUBJECT_ROWS: &str = r"(?:rows?|records?|lines?)";
pub const SUBJECT_COLUMNS: &str = r"(?:columns?|cols?)";
pub const SUBJECT_NUMBERS: &str = r"(?:numbers?|values?|amounts?|scores?|figures?)";
pub const SUBJECT_ANY: &str =
    r"(?:cells?|entries|entry|items?|rows?|records?|numbers?|values?|amounts?|scores?|data)";

// ============================================================================
// Connectors
// ============================================================================

pub const ARTICLE: &str = r"(?:the|a|an|all|all\s+the|any)";
pub const CONNECTOR: &str = r"(?:that\s+are|which\s+are|that\s+is|which\s+is|where\s+the\s+value\s+is|where|with\s+values?|with|having|whose\s+value\s+is|that|which|is|are)";
pub const SEQUENCE_CONNECTOR: &str =
    r"(?:and\s+then|,\s*then|then|after\s+that|afterwards|followed\s+by|and\s+also)";

// ============================================================================
// Comparison operators
// ============================================================================

pub const CMP_GREATER: &str = r"(?:greater\s+than|more\s+than|larger\s+than|bigger\s+than|higher\s+than|above|over|exceeding|>)";
pub const CMP_LESS: &str =
    r"(?:less\s+than|fewer\s+than|smaller\s+than|lower\s+than|below|under|<)";
pub const CMP_EQUAL: &str = r"(?:equal\s+to|equals?|exactly|=)";
pub const CMP_BETWEEN: &str = r"(?:between|from)";
pub const CMP_CONTAINS: &str =
    r"(?:contains?|containing|includes?|including|with\s+the\s+(?:word|text))";

// ============================================================================
// Locations
// ============================================================================

pub const COLUMN_LETTER: &str = r"[a-z]{1,2}";
pub const CELL_REF: &str = r"[a-z]{1,2}[0-9]+";
pub const RANGE_REF: &str = r"[a-z]{1,2}[0-9]+\s*:\s*[a-z]{1,2}[0-9]+";
pub const ROW_NUMBER: &str = r"[0-9]+";
pub const LOC_COLUMN_PREFIX: &str = r"(?:(?:in|of|on|for|from)\s+)?(?:the\s+)?column\s+";

// ============================================================================
// Value literals
// ============================================================================

pub const VALUE_NUMBER: &str = r"-?\$?\d[\d,]*(?:\.\d+)?%?";
pub const VALUE_QUOTED: &str = r#"(?:"[^"]*"|'[^']*')"#;
pub const VALUE_TEXT: &str = r"[a-z0-9][a-z0-9 _\-\./]*";
pub const VALUE_WORD: &str = r"[a-z0-9][a-z0-9_\-\.]*";

// ============================================================================
// Composition
// ============================================================================

/// Wrap a fragment in a named capture group.
pub fn capture(name: &str, fragment: &str) -> String {
    format!("(?P<{}>{})", name, fragment)
}

/// Make a fragment optional.
pub fn optional(fragment: &str) -> String {
    format!("(?:{})?", fragment)
}

/// Alternation of several fragments.
pub fn any_of(fragments: &[&str]) -> String {
    format!("(?:{})", fragments.join("|"))
}

/// Incrementally composes fragments into a case-insensitive regex.
///
/// `word` joins with mandatory whitespace, `then` with optional whitespace.
#[derive(Debug, Clone, Default)]
pub struct PatternBuilder {
    source: String,
    anchored: bool,
}

impl PatternBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment separated by at least one whitespace character.
    pub fn word(mut self, fragment: &str) -> Self {
        if !self.source.is_empty() {
            self.source.push_str(r"\s+");
        }
        self.source.push_str(fragment);
        self
    }

    /// Append a fragment separated by optional whitespace.
    pub fn then(mut self, fragment: &str) -> Self {
        if !self.source.is_empty() {
            self.source.push_str(r"\s*");
        }
        self.source.push_str(fragment);
        self
    }

    /// Append an optional fragment, including its leading whitespace.
    pub fn maybe(mut self, fragment: &str) -> Self {
        if self.source.is_empty() {
            self.source.push_str(&optional(&format!(r"{}\s+", fragment)));
        } else {
            self.source.push_str(&optional(&format!(r"\s+{}", fragment)));
        }
        self
    }

    pub fn capture(self, name: &str, fragment: &str) -> Self {
        self.word(&capture(name, fragment))
    }

    /// Anchor the whole pattern to the start and end of the input.
    pub fn anchored(mut self) -> Self {
        self.anchored = true;
        self
    }

    pub fn source(&self) -> String {
        if self.anchored {
            format!(r"(?i)^\s*{}\s*[.!?]*\s*$", self.source)
        } else {
            format!("(?i){}", self.source)
        }
    }

    pub fn build(&self) -> Result<Regex, regex::Error> {
        Regex::new(&self.source())
    }
}

/// Parse a matched numeric literal (`$1,200.50`, `15%`, `-3`).
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%'))
        .collect();
    cleaned.trim().parse::<f64>().ok()
}

/// Strip surrounding quotes from a matched literal.
pub fn unquote(raw: &str) -> &str {
    let raw = raw.trim();
    let quoted = raw.len() >= 2
        && ((raw.starts_with('"') && raw.ends_with('"'))
            || (raw.starts_with('\'') && raw.ends_with('\'')));
    if quoted {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAGMENTS: &[&str] = &[
        ACTION_HIGHLIGHT,
        ACTION_SHOW,
        ACTION_FILTER,
        ACTION_SORT,
        ACTION_MODIFY,
        ACTION_CREATE,
        ACTION_REMOVE,
        ACTION_FORMAT,
        SUBJECT_CELLS,
        SUBJECT_ROWS,
        SUBJECT_COLUMNS,
        SUBJECT_NUMBERS,
        SUBJECT_ANY,
        ARTICLE,
        CONNECTOR,
        SEQUENCE_CONNECTOR,
        CMP_GREATER,
        CMP_LESS,
        CMP_EQUAL,
        CMP_BETWEEN,
        CMP_CONTAINS,
        COLUMN_LETTER,
        CELL_REF,
        RANGE_REF,
        ROW_NUMBER,
        LOC_COLUMN_PREFIX,
        VALUE_NUMBER,
        VALUE_QUOTED,
        VALUE_TEXT,
        VALUE_WORD,
    ];

    #[test]
    fn every_fragment_compiles_alone_without_anchors_or_captures() {
        for fragment in FRAGMENTS {
            let re = Regex::new(&format!("(?i){}", fragment)).unwrap();
            assert_eq!(re.captures_len(), 1, "fragment has a capture: {}", fragment);
            assert!(!fragment.starts_with('^') && !fragment.ends_with('$'));
        }
    }

    #[test]
    fn composed_pattern_captures_named_parts() {
        let re = PatternBuilder::new()
            .word(ACTION_HIGHLIGHT)
            .maybe(SUBJECT_ANY)
            .maybe(CONNECTOR)
            .word(CMP_GREATER)
            .capture("value", VALUE_NUMBER)
            .anchored()
            .build()
            .unwrap();
        let caps = re.captures("Highlight values that are greater than 1,200").unwrap();
        assert_eq!(&caps["value"], "1,200");
        assert!(re.is_match("mark over 5"));
        assert!(!re.is_match("please highlight over 5 now"));
    }

    #[test]
    fn numbers_and_quotes_are_normalised() {
        assert_eq!(parse_number("$1,200.50"), Some(1200.5));
        assert_eq!(parse_number("15%"), Some(15.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(unquote("\"done\""), "done");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("plain"), "plain");
    }
}
