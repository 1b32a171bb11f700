//! Defensive parsing of LLM replies into a [`Classification`].

use serde_json::{Map, Value};

use crate::error::ClassifierError;
use crate::types::{
    clamp_confidence, Classification, Intent, Parameters, Target, TargetType, DEFAULT_CONFIDENCE,
};

const PREVIEW_CHARS: usize = 200;

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Find the first balanced `{...}` substring, ignoring braces inside strings.
pub fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + idx + 1;
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Direct JSON parse first, then the first balanced object in the text.
pub fn extract_json_object(raw: &str) -> Result<Map<String, Value>, ClassifierError> {
    let trimmed = raw.trim();
    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value,
        Err(_) => {
            let candidate = first_balanced_object(trimmed)
                .ok_or_else(|| ClassifierError::Parse(preview(trimmed)))?;
            serde_json::from_str::<Value>(candidate)
                .map_err(|e| ClassifierError::Parse(format!("{}: {}", e, preview(candidate))))?
        }
    };
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ClassifierError::InvalidReply(preview(&other.to_string()))),
    }
}

/// Numbers and numeric strings coerce; anything else is non-finite.
fn coerce_confidence(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    };
    if raw.is_finite() {
        clamp_confidence(raw)
    } else {
        DEFAULT_CONFIDENCE
    }
}

fn non_empty_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_target(value: Option<&Value>) -> Target {
    let Some(Value::Object(obj)) = value else {
        return Target::all_data();
    };
    let target_type = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(TargetType::parse);
    let identifier = match obj.get("identifier") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    match (target_type, identifier) {
        (Some(target_type), Some(identifier)) => Target::new(target_type, identifier),
        _ => Target::all_data(),
    }
}

/// Normalise a reply object; missing fields get their documented defaults.
pub fn normalize(map: &Map<String, Value>) -> Classification {
    let intent = non_empty_str(map, "intent")
        .and_then(Intent::parse)
        .unwrap_or(Intent::Unknown);
    let action = non_empty_str(map, "action").unwrap_or("unknown");
    let parameters: Parameters = match map.get("parameters") {
        Some(Value::Object(params)) => params.clone(),
        _ => Parameters::new(),
    };
    let reasoning = non_empty_str(map, "reasoning").unwrap_or("LLM classification");

    let mut classification = Classification::new(
        intent,
        action,
        parse_target(map.get("target")),
        coerce_confidence(map.get("confidence")),
        reasoning,
    );
    classification.parameters = parameters;
    classification
}

/// Parse a raw reply; parse failures are errors, never an `unknown` result.
pub fn parse_classification(raw: &str) -> Result<Classification, ClassifierError> {
    extract_json_object(raw).map(|map| normalize(&map))
}
