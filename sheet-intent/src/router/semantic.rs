//! Semantic pre-pass: entities, operations, complexity and confidence.

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::columns::ColumnMapping;
use crate::extract::{self, Operation};

/// How involved a query is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Analytical,
    Compound,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticAnalysis {
    /// Column names, column letters, quoted phrases and domain nouns.
    pub entities: Vec<String>,
    /// Verb keywords, UI operations first.
    pub operations: Vec<String>,
    pub complexity: Complexity,
}

static COLUMN_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcol(?:umn)?s?\s+(?P<letter>[a-z])\b").unwrap());

static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).unwrap());

static DOMAIN_NOUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:sales|revenue|price|prices|cost|costs|profit|margin|playtime|rating|ratings|score|scores|region|category|categories|date|year|month|quarter|customer|customers|product|products|games?|genre|quantity|age|salary|salaries|orders?|units|employees?|department)\b").unwrap()
});

static ANALYTIC_VERB: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("compare", r"\bcompar\w*"),
        ("average", r"\b(?:average|mean)\b"),
        ("median", r"\bmedian\b"),
        ("sum", r"\b(?:sum|total)\b"),
        ("count", r"\b(?:count|how\s+many)\b"),
        ("correlate", r"\bcorrelat\w*"),
        ("trend", r"\btrends?\b"),
        ("predict", r"\b(?:predict\w*|forecast\w*)"),
        ("summarize", r"\bsummar\w*"),
        ("analyze", r"\banaly[sz]\w*"),
        ("chart", r"\b(?:chart|graph|plot|visuali[sz]e|histogram|dashboard)\b"),
    ]
    .into_iter()
    .map(|(name, src)| (name, Regex::new(&format!("(?i){}", src)).unwrap()))
    .collect()
});

fn operation_name(op: Operation) -> &'static str {
    match op {
        Operation::Delete => "delete",
        Operation::Insert => "insert",
        Operation::Hide => "hide",
        Operation::Merge => "merge",
        Operation::Freeze => "freeze",
        Operation::Format => "format",
        Operation::Sort => "sort",
        Operation::Filter => "filter",
        Operation::Replace => "replace",
        Operation::Analyze => "analyze",
        Operation::Visualize => "visualize",
    }
}

impl SemanticAnalysis {
    /// `0.4 + 0.15 * min(entities, 2) + 0.1 * min(operations, 2)`, plus 0.15
    /// when the query matched a known category; clamped to `[0, 1]`.
    pub fn confidence(&self, category_matched: bool) -> f64 {
        // Summed in hundredths so thresholds like 0.8 compare exactly.
        let entities = self.entities.len().min(2) as u32;
        let operations = self.operations.len().min(2) as u32;
        let bonus = if category_matched { 15 } else { 0 };
        let hundredths = 40 + 15 * entities + 10 * operations + bonus;
        (f64::from(hundredths) / 100.0).clamp(0.0, 1.0)
    }
}

/// Scan a query for entities and operations and grade its complexity.
pub fn analyze(query: &str, columns: &ColumnMapping) -> SemanticAnalysis {
    let text = query.trim().to_lowercase();

    let mut entities: IndexSet<String> = IndexSet::new();
    for header in columns.headers() {
        let lowered = header.trim().to_lowercase();
        if !lowered.is_empty() && text.contains(&lowered) {
            entities.insert(header.trim().to_string());
        }
    }
    for caps in COLUMN_REF.captures_iter(&text) {
        entities.insert(caps["letter"].to_uppercase());
    }
    for caps in QUOTED.captures_iter(query) {
        if let Some(m) = caps.get(1).or_else(|| caps.get(2)) {
            entities.insert(m.as_str().to_string());
        }
    }
    for m in DOMAIN_NOUN.find_iter(&text) {
        let noun = m.as_str();
        if !entities.iter().any(|e| e.eq_ignore_ascii_case(noun)) {
            entities.insert(noun.to_string());
        }
    }

    let ui_ops: Vec<Operation> = extract::extract_operations(&text)
        .into_iter()
        .filter(|op| op.is_ui())
        .collect();
    let mut operations: IndexSet<String> = ui_ops
        .iter()
        .map(|op| operation_name(*op).to_string())
        .collect();
    let mut analytic = false;
    for (name, re) in ANALYTIC_VERB.iter() {
        if re.is_match(&text) {
            analytic = true;
            operations.insert((*name).to_string());
        }
    }

    let complexity = if extract::has_sequence_conjunction(&text)
        && extract::split_sub_commands(&text).len() >= 2
    {
        Complexity::Compound
    } else if analytic && !ui_ops.is_empty() {
        Complexity::Mixed
    } else if analytic {
        Complexity::Analytical
    } else {
        Complexity::Simple
    };

    SemanticAnalysis {
        entities: entities.into_iter().collect(),
        operations: operations.into_iter().collect(),
        complexity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn simple_ui_query() {
        let analysis = analyze("Sort column A descending", &ColumnMapping::new());
        assert_eq!(analysis.entities, vec!["A".to_string()]);
        assert_eq!(analysis.operations, vec!["sort".to_string()]);
        assert_eq!(analysis.complexity, Complexity::Simple);
        assert_eq!(analysis.confidence(true), 0.8);
    }

    #[test]
    fn analytical_query_uses_headers_and_nouns() {
        let mapping = ColumnMapping::build(&["Title", "Playtime", "Mode"]);
        let analysis = analyze(
            "Compare average playtime between single-player and multiplayer games",
            &mapping,
        );
        assert_eq!(analysis.entities[0], "Playtime");
        assert!(analysis.entities.contains(&"games".to_string()));
        assert_eq!(analysis.complexity, Complexity::Analytical);
        assert!(analysis.operations.contains(&"compare".to_string()));
        assert_eq!(analysis.confidence(true), 1.0);
    }

    #[test]
    fn mixed_and_compound() {
        let mixed = analyze("highlight rows with the highest average", &ColumnMapping::new());
        assert_eq!(mixed.complexity, Complexity::Mixed);
        let compound = analyze("delete column b and then freeze the top row", &ColumnMapping::new());
        assert_eq!(compound.complexity, Complexity::Compound);
    }

    #[test]
    fn empty_analysis_has_base_confidence() {
        let analysis = analyze("blorp", &ColumnMapping::new());
        assert!(analysis.entities.is_empty());
        assert_eq!(analysis.confidence(false), 0.4);
    }
}
