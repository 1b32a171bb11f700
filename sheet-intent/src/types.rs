//! Core classification types shared by every stage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Confidence used when a source provides a non-finite value.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Confidence of the battery's terminal `unknown` result.
pub const UNKNOWN_CONFIDENCE: f64 = 0.3;

/// Action-specific key/value bag carried by a [`Classification`].
pub type Parameters = Map<String, Value>;

/// Closed set of things a user command can be trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ConditionalFormat,
    DataModification,
    FindReplace,
    Filter,
    Sort,
    ColumnOperation,
    RowOperation,
    CellOperation,
    RangeOperation,
    FreezeOperation,
    TableOperation,
    HyperlinkOperation,
    DataValidation,
    CommentOperation,
    ImageOperation,
    NamedRangeOperation,
    IntelligentAnalysis,
    SmartFormat,
    DataEntry,
    GeneralQuery,
    CompoundOperation,
    Unknown,
}

impl Intent {
    pub const ALL: [Intent; 22] = [
        Intent::ConditionalFormat,
        Intent::DataModification,
        Intent::FindReplace,
        Intent::Filter,
        Intent::Sort,
        Intent::ColumnOperation,
        Intent::RowOperation,
        Intent::CellOperation,
        Intent::RangeOperation,
        Intent::FreezeOperation,
        Intent::TableOperation,
        Intent::HyperlinkOperation,
        Intent::DataValidation,
        Intent::CommentOperation,
        Intent::ImageOperation,
        Intent::NamedRangeOperation,
        Intent::IntelligentAnalysis,
        Intent::SmartFormat,
        Intent::DataEntry,
        Intent::GeneralQuery,
        Intent::CompoundOperation,
        Intent::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::ConditionalFormat => "conditional_format",
            Intent::DataModification => "data_modification",
            Intent::FindReplace => "find_replace",
            Intent::Filter => "filter",
            Intent::Sort => "sort",
            Intent::ColumnOperation => "column_operation",
            Intent::RowOperation => "row_operation",
            Intent::CellOperation => "cell_operation",
            Intent::RangeOperation => "range_operation",
            Intent::FreezeOperation => "freeze_operation",
            Intent::TableOperation => "table_operation",
            Intent::HyperlinkOperation => "hyperlink_operation",
            Intent::DataValidation => "data_validation",
            Intent::CommentOperation => "comment_operation",
            Intent::ImageOperation => "image_operation",
            Intent::NamedRangeOperation => "named_range_operation",
            Intent::IntelligentAnalysis => "intelligent_analysis",
            Intent::SmartFormat => "smart_format",
            Intent::DataEntry => "data_entry",
            Intent::GeneralQuery => "general_query",
            Intent::CompoundOperation => "compound_operation",
            Intent::Unknown => "unknown",
        }
    }

    /// Parse a snake_case intent name. Unrecognised names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let needle = s.trim().to_lowercase();
        Intent::ALL.iter().copied().find(|i| i.as_str() == needle)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of data scope an action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Cell,
    Column,
    Row,
    Range,
    AllData,
    SpecificValue,
    Table,
    Compound,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Cell => "cell",
            TargetType::Column => "column",
            TargetType::Row => "row",
            TargetType::Range => "range",
            TargetType::AllData => "all_data",
            TargetType::SpecificValue => "specific_value",
            TargetType::Table => "table",
            TargetType::Compound => "compound",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cell" => Some(TargetType::Cell),
            "column" => Some(TargetType::Column),
            "row" => Some(TargetType::Row),
            "range" => Some(TargetType::Range),
            "all_data" => Some(TargetType::AllData),
            "specific_value" => Some(TargetType::SpecificValue),
            "table" => Some(TargetType::Table),
            "compound" => Some(TargetType::Compound),
            _ => None,
        }
    }
}

/// What an action applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "type")]
    pub target_type: TargetType,
    /// Cell reference, column letter/name, `*`, or a range string.
    pub identifier: String,
}

impl Target {
    pub fn new(target_type: TargetType, identifier: impl Into<String>) -> Self {
        Self {
            target_type,
            identifier: identifier.into(),
        }
    }

    pub fn all_data() -> Self {
        Self::new(TargetType::AllData, "*")
    }

    pub fn column(identifier: impl Into<String>) -> Self {
        Self::new(TargetType::Column, identifier)
    }

    pub fn row(identifier: impl Into<String>) -> Self {
        Self::new(TargetType::Row, identifier)
    }

    pub fn cell(identifier: impl Into<String>) -> Self {
        Self::new(TargetType::Cell, identifier)
    }

    pub fn range(identifier: impl Into<String>) -> Self {
        Self::new(TargetType::Range, identifier)
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::all_data()
    }
}

/// The canonical output of the first-stage classifier.
///
/// Immutable once returned; `confidence` is always within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    pub action: String,
    pub target: Target,
    #[serde(default)]
    pub parameters: Parameters,
    pub confidence: f64,
    pub reasoning: String,
}

impl Classification {
    pub fn new(
        intent: Intent,
        action: impl Into<String>,
        target: Target,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            intent,
            action: action.into(),
            target,
            parameters: Parameters::new(),
            confidence: clamp_confidence(confidence),
            reasoning: reasoning.into(),
        }
    }

    /// The battery's terminal result when nothing matched.
    pub fn unknown(reasoning: impl Into<String>) -> Self {
        Self::new(
            Intent::Unknown,
            "unknown",
            Target::all_data(),
            UNKNOWN_CONFIDENCE,
            reasoning,
        )
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }
}

/// Clamp a confidence into `[0, 1]`; non-finite values become [`DEFAULT_CONFIDENCE`].
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        DEFAULT_CONFIDENCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_names_round_trip_through_parse() {
        for intent in Intent::ALL {
            assert_eq!(Intent::parse(intent.as_str()), Some(intent));
        }
        assert_eq!(Intent::parse("  Conditional_Format "), Some(Intent::ConditionalFormat));
        assert_eq!(Intent::parse("make_coffee"), None);
    }

    #[test]
    fn confidence_is_clamped_on_construction() {
        let high = Classification::new(Intent::Sort, "sort_column", Target::all_data(), 3.2, "");
        let low = Classification::new(Intent::Sort, "sort_column", Target::all_data(), -1.0, "");
        let nan = Classification::new(Intent::Sort, "sort_column", Target::all_data(), f64::NAN, "");
        assert_eq!(high.confidence, 1.0);
        assert_eq!(low.confidence, 0.0);
        assert_eq!(nan.confidence, DEFAULT_CONFIDENCE);
    }

    #[test]
    fn target_serializes_with_type_key() {
        let json = serde_json::to_value(Target::column("B")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "column", "identifier": "B"}));
    }
}
