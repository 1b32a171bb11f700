//! Classification prompt: intent enumeration, disambiguation rules, reply
//! schema and worked examples.

use crate::columns::{column_letter, ColumnMapping};
use crate::llm::provider::ChatMessage;
use crate::types::Intent;

/// Disambiguation rules shared with the heuristic battery.
pub const DISAMBIGUATION_RULES: &[&str] = &[
    "\"highlight\" always means conditional_format, even if a destructive verb like \"remove\" appears elsewhere.",
    "Deleting, removing, inserting, hiding or showing COLUMNS is column_operation.",
    "Deleting duplicates or deleting rows of data by condition is data_modification; deleting numbered rows is row_operation.",
    "\"greater than\", \"above\", \"over\" and \">\" all map to condition \"greater_than\"; likewise \"less_than\", \"equals\", \"between\" (needs two numbers, use min and max) and \"contains\" (text).",
    "\"values that are X\" means condition \"equals\" with value X; use \"contains\" only when the user says contain/include.",
    "\"delete columns X and Y\" with adjacent letters is action delete_column with count 2; otherwise delete_columns_multiple with parameters.columns listing the upper-cased letters in input order.",
    "Two or more different kinds of operation joined by \"and\"/\"then\" are compound_operation with parameters.operations holding each sub-command in order.",
    "Questions about the data (averages, comparisons, trends, charts) are intelligent_analysis.",
    "Prefer a column letter as target identifier; use \"*\" with type all_data when the whole sheet is meant.",
];

pub const REPLY_SCHEMA: &str = r#"{
  "intent": "<one of the intents above>",
  "action": "<snake_case verb identifier>",
  "target": { "type": "cell|column|row|range|all_data|specific_value|table|compound", "identifier": "<A1, B, 3, A1:C5 or *>" },
  "parameters": { "<key>": "<value>" },
  "confidence": <number between 0 and 1>,
  "reasoning": "<one short sentence>"
}"#;

/// Worked input/output pairs; together they cover every intent.
pub const EXAMPLES: &[(&str, &str)] = &[
    (
        "highlight duplicates in column A",
        r#"{"intent":"conditional_format","action":"highlight_duplicates","target":{"type":"column","identifier":"A"},"parameters":{"column":"A"},"confidence":0.95,"reasoning":"Highlight duplicate values"}"#,
    ),
    (
        "highlight values greater than 100",
        r#"{"intent":"conditional_format","action":"highlight_cells","target":{"type":"all_data","identifier":"*"},"parameters":{"condition":"greater_than","value":100},"confidence":0.9,"reasoning":"Comparison highlight"}"#,
    ),
    (
        "remove duplicates",
        r#"{"intent":"data_modification","action":"remove_duplicates","target":{"type":"all_data","identifier":"*"},"parameters":{},"confidence":0.9,"reasoning":"Deleting duplicate rows changes data"}"#,
    ),
    (
        "replace N/A with 0",
        r#"{"intent":"find_replace","action":"replace_all","target":{"type":"all_data","identifier":"*"},"parameters":{"find":"N/A","replace":"0"},"confidence":0.9,"reasoning":"Find and replace"}"#,
    ),
    (
        "show only rows where status is done",
        r#"{"intent":"filter","action":"filter_by_value","target":{"type":"all_data","identifier":"*"},"parameters":{"condition":"equals","value":"done"},"confidence":0.85,"reasoning":"Filter by value"}"#,
    ),
    (
        "sort column B descending",
        r#"{"intent":"sort","action":"sort_column","target":{"type":"column","identifier":"B"},"parameters":{"column":"B","direction":"desc"},"confidence":0.9,"reasoning":"Sort one column"}"#,
    ),
    (
        "delete columns D and E",
        r#"{"intent":"column_operation","action":"delete_column","target":{"type":"column","identifier":"D"},"parameters":{"column":"D","count":2},"confidence":0.95,"reasoning":"Adjacent columns"}"#,
    ),
    (
        "delete columns A and C",
        r#"{"intent":"column_operation","action":"delete_columns_multiple","target":{"type":"column","identifier":"A,C"},"parameters":{"columns":["A","C"]},"confidence":0.95,"reasoning":"Non-adjacent columns"}"#,
    ),
    (
        "insert a row above row 3",
        r#"{"intent":"row_operation","action":"insert_row","target":{"type":"row","identifier":"3"},"parameters":{"position":"above","row":3,"count":1},"confidence":0.9,"reasoning":"Row insertion"}"#,
    ),
    (
        "set B2 to 42",
        r#"{"intent":"cell_operation","action":"set_value","target":{"type":"cell","identifier":"B2"},"parameters":{"value":42},"confidence":0.9,"reasoning":"Single cell value"}"#,
    ),
    (
        "merge A1:C1",
        r#"{"intent":"range_operation","action":"merge_cells","target":{"type":"range","identifier":"A1:C1"},"parameters":{},"confidence":0.9,"reasoning":"Merge a range"}"#,
    ),
    (
        "freeze the top row",
        r#"{"intent":"freeze_operation","action":"freeze_rows","target":{"type":"row","identifier":"1"},"parameters":{"rows":1},"confidence":0.9,"reasoning":"Freeze header"}"#,
    ),
    (
        "create a table",
        r#"{"intent":"table_operation","action":"create_table","target":{"type":"all_data","identifier":"*"},"parameters":{},"confidence":0.95,"reasoning":"Create a table over the data"}"#,
    ),
    (
        "add a link to https://example.com in A1",
        r#"{"intent":"hyperlink_operation","action":"add_hyperlink","target":{"type":"cell","identifier":"A1"},"parameters":{"url":"https://example.com"},"confidence":0.9,"reasoning":"Attach a hyperlink"}"#,
    ),
    (
        "add a dropdown to column D with options yes, no",
        r#"{"intent":"data_validation","action":"add_dropdown","target":{"type":"column","identifier":"D"},"parameters":{"column":"D","options":["yes","no"]},"confidence":0.9,"reasoning":"Dropdown validation"}"#,
    ),
    (
        "add a comment to B3 saying check this",
        r#"{"intent":"comment_operation","action":"add_comment","target":{"type":"cell","identifier":"B3"},"parameters":{"text":"check this"},"confidence":0.9,"reasoning":"Attach a comment"}"#,
    ),
    (
        "insert an image in C2",
        r#"{"intent":"image_operation","action":"insert_image","target":{"type":"cell","identifier":"C2"},"parameters":{},"confidence":0.9,"reasoning":"Insert an image"}"#,
    ),
    (
        "name the range A1:B10 as totals",
        r#"{"intent":"named_range_operation","action":"create_named_range","target":{"type":"range","identifier":"A1:B10"},"parameters":{"name":"totals","range":"A1:B10"},"confidence":0.9,"reasoning":"Define a named range"}"#,
    ),
    (
        "compare average playtime between single-player and multiplayer games",
        r#"{"intent":"intelligent_analysis","action":"analyze_data","target":{"type":"all_data","identifier":"*"},"parameters":{"analysis_type":"comparison"},"confidence":0.9,"reasoning":"Comparative question about the data"}"#,
    ),
    (
        "format column C as currency",
        r#"{"intent":"smart_format","action":"apply_number_format","target":{"type":"column","identifier":"C"},"parameters":{"column":"C","format":"currency"},"confidence":0.85,"reasoning":"Number format"}"#,
    ),
    (
        "add a new entry for John with salary 5000",
        r#"{"intent":"data_entry","action":"add_entry","target":{"type":"all_data","identifier":"*"},"parameters":{"details":"john with salary 5000"},"confidence":0.85,"reasoning":"Append a record"}"#,
    ),
    (
        "what can you do",
        r#"{"intent":"general_query","action":"answer_question","target":{"type":"all_data","identifier":"*"},"parameters":{},"confidence":0.8,"reasoning":"Help request"}"#,
    ),
    (
        "delete column B and then freeze the top row",
        r#"{"intent":"compound_operation","action":"execute_sequence","target":{"type":"compound","identifier":"2"},"parameters":{"operations":["delete column b","freeze the top row"]},"confidence":0.9,"reasoning":"Two different operations in sequence"}"#,
    ),
    (
        "make it pop",
        r#"{"intent":"unknown","action":"unknown","target":{"type":"all_data","identifier":"*"},"parameters":{},"confidence":0.3,"reasoning":"Too vague to act on"}"#,
    ),
];

/// System prompt with the closed intent list, rules, schema and examples.
pub fn system_prompt() -> String {
    let mut prompt = String::from(
        "You classify spreadsheet commands. Reply with exactly one JSON object and nothing else.\n\n",
    );

    prompt.push_str("Intents:\n");
    for intent in Intent::ALL {
        prompt.push_str("- ");
        prompt.push_str(intent.as_str());
        prompt.push('\n');
    }

    prompt.push_str("\nRules:\n");
    for (i, rule) in DISAMBIGUATION_RULES.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, rule));
    }

    prompt.push_str("\nReply schema:\n");
    prompt.push_str(REPLY_SCHEMA);
    prompt.push_str("\n\nExamples:\n");
    for (input, output) in EXAMPLES {
        prompt.push_str(&format!("Input: {}\nOutput: {}\n", input, output));
    }
    prompt
}

/// User message: the command plus the current header row, if any.
pub fn user_prompt(text: &str, columns: &ColumnMapping) -> String {
    if columns.headers().is_empty() {
        return format!("Command: {}", text);
    }
    let headers: Vec<String> = columns
        .headers()
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{}={}", column_letter(i), h))
        .collect();
    format!("Columns: {}\nCommand: {}", headers.join(", "), text)
}

pub fn build_messages(text: &str, columns: &ColumnMapping) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt()),
        ChatMessage::user(user_prompt(text, columns)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn examples_cover_every_intent() {
        let covered: HashSet<Intent> = EXAMPLES
            .iter()
            .map(|(_, output)| {
                let value: serde_json::Value = serde_json::from_str(output).unwrap();
                Intent::parse(value["intent"].as_str().unwrap()).unwrap()
            })
            .collect();
        for intent in Intent::ALL {
            assert!(covered.contains(&intent), "no example for {}", intent);
        }
    }

    #[test]
    fn system_prompt_lists_intents_and_schema() {
        let prompt = system_prompt();
        assert!(prompt.contains("- named_range_operation"));
        assert!(prompt.contains("\"confidence\""));
        assert!(prompt.contains("Input: create a table"));
    }

    #[test]
    fn user_prompt_includes_headers() {
        let mapping = ColumnMapping::build(&["Name", "Score"]);
        assert_eq!(
            user_prompt("sort by score", &mapping),
            "Columns: A=Name, B=Score\nCommand: sort by score"
        );
        assert_eq!(user_prompt("x", &ColumnMapping::new()), "Command: x");
    }
}
