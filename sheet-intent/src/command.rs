//! Translation of classifications into executor commands.

use serde::{Deserialize, Serialize};

use crate::types::{Classification, Intent, Parameters, Target, TargetType};

/// `{action, params, target?, success_message?}` command for the spreadsheet executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetCommand {
    pub action: String,
    #[serde(default)]
    pub params: Parameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
}

impl SpreadsheetCommand {
    /// Spreadsheet intents become commands; analysis, general queries,
    /// compound and unknown commands belong to the router and yield `None`.
    pub fn from_classification(classification: &Classification) -> Option<Self> {
        match classification.intent {
            Intent::IntelligentAnalysis
            | Intent::GeneralQuery
            | Intent::CompoundOperation
            | Intent::Unknown => return None,
            _ => {}
        }
        if classification.action.is_empty() || classification.action == "unknown" {
            return None;
        }

        let target = match classification.target.target_type {
            TargetType::AllData => None,
            _ => Some(classification.target.clone()),
        };
        Some(Self {
            action: classification.action.clone(),
            params: classification.parameters.clone(),
            success_message: Some(success_message(classification)),
            target,
        })
    }
}

fn scope(target: &Target) -> String {
    match target.target_type {
        TargetType::AllData => "the data".to_string(),
        TargetType::Column => format!("column {}", target.identifier),
        TargetType::Row => format!("row {}", target.identifier),
        TargetType::Cell => format!("cell {}", target.identifier),
        TargetType::Range => format!("range {}", target.identifier),
        _ => target.identifier.clone(),
    }
}

fn success_message(c: &Classification) -> String {
    let scope = scope(&c.target);
    match c.action.as_str() {
        "highlight_duplicates" => format!("Highlighted duplicates in {}", scope),
        "highlight_cells" => format!("Highlighted matching cells in {}", scope),
        "remove_duplicates" => format!("Removed duplicates from {}", scope),
        "sort_column" | "sort_data" => {
            let order = if c.param_str("direction") == Some("desc") {
                "descending"
            } else {
                "ascending"
            };
            format!("Sorted {} {}", scope, order)
        }
        "delete_column" => match c.parameters.get("count").and_then(|v| v.as_u64()) {
            Some(n) if n > 1 => format!("Deleted {} columns starting at {}", n, scope),
            _ => format!("Deleted {}", scope),
        },
        "delete_columns_multiple" => format!("Deleted columns {}", c.target.identifier),
        "freeze_rows" | "freeze_columns" => "Froze panes".to_string(),
        "unfreeze" => "Unfroze panes".to_string(),
        "create_table" => format!("Created a table over {}", scope),
        "replace_all" => "Replaced all matches".to_string(),
        "clear_filters" => "Cleared filters".to_string(),
        action => {
            let words = action.replace('_', " ");
            let mut chars = words.chars();
            let sentence = match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => words,
            };
            format!("{} applied to {}", sentence, scope)
        }
    }
}
