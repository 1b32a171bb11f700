//! Column letters and the alias → index column mapping.

use indexmap::IndexMap;

/// Minimum length of a header word to be used as an alias on its own.
const MIN_WORD_ALIAS_LEN: usize = 3;

/// Convert a zero-based column index to spreadsheet letters (0 → A, 26 → AA).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Convert spreadsheet letters (case-insensitive) to a zero-based index.
pub fn column_index(letters: &str) -> Option<usize> {
    let letters = letters.trim();
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut n = 0usize;
    for c in letters.chars() {
        let v = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n = n.checked_mul(26)?.checked_add(v)?;
    }
    Some(n - 1)
}

/// True when `second` is the column immediately after `first` (A→B, Z→AA).
pub fn are_adjacent(first: &str, second: &str) -> bool {
    match (column_index(first), column_index(second)) {
        (Some(a), Some(b)) => b == a + 1,
        _ => false,
    }
}

/// Maps normalised header aliases to zero-based column indices.
///
/// Rebuilt whenever the underlying table changes. Aliases keep insertion
/// order so substring lookups are deterministic.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    headers: Vec<String>,
    aliases: IndexMap<String, usize>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a header row.
    pub fn build<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut aliases = IndexMap::new();
        for (idx, header) in headers.iter().enumerate() {
            let lower = header.as_ref().trim().to_lowercase();
            if lower.is_empty() {
                continue;
            }
            aliases.entry(lower.clone()).or_insert(idx);

            let stripped = strip_non_alphanumeric(&lower);
            if !stripped.is_empty() {
                aliases.entry(stripped).or_insert(idx);
            }

            for word in lower.split(|c: char| !c.is_alphanumeric()) {
                if word.chars().count() >= MIN_WORD_ALIAS_LEN {
                    aliases.entry(word.to_string()).or_insert(idx);
                }
            }
        }
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            aliases,
        }
    }

    /// Build from tabular data whose first row is the header row.
    pub fn from_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Self {
        match rows.first() {
            Some(header_row) => Self::build(header_row),
            None => Self::new(),
        }
    }

    /// Resolve a natural-language column name.
    ///
    /// Tries an exact alias match, then substring containment in both
    /// directions, returning the first index found.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        if let Some(idx) = self.aliases.get(&needle) {
            return Some(*idx);
        }
        let stripped = strip_non_alphanumeric(&needle);
        if let Some(idx) = self.aliases.get(&stripped) {
            return Some(*idx);
        }
        self.aliases
            .iter()
            .find(|(alias, _)| alias.contains(needle.as_str()) || needle.contains(alias.as_str()))
            .map(|(_, idx)| *idx)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn header(&self, index: usize) -> Option<&str> {
        self.headers.get(index).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

fn strip_non_alphanumeric(s: &str) -> String {
    s.chars().filter(|c| c.is_alphanumeric()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_indices_convert_both_ways() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_index("a"), Some(0));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("A1"), None);
        assert_eq!(column_index(""), None);
    }

    #[test]
    fn adjacency_follows_alphabet() {
        assert!(are_adjacent("A", "B"));
        assert!(are_adjacent("d", "E"));
        assert!(are_adjacent("Z", "AA"));
        assert!(!are_adjacent("A", "C"));
        assert!(!are_adjacent("B", "A"));
    }

    #[test]
    fn lookup_tries_exact_then_containment() {
        let mapping = ColumnMapping::build(&["Game Title", "Avg. Playtime (hrs)", "Genre"]);
        assert_eq!(mapping.lookup("genre"), Some(2));
        assert_eq!(mapping.lookup("Game Title"), Some(0));
        assert_eq!(mapping.lookup("gametitle"), Some(0));
        assert_eq!(mapping.lookup("playtime"), Some(1));
        // needle contains an alias
        assert_eq!(mapping.lookup("total playtime hours"), Some(1));
        // alias contains needle
        assert_eq!(mapping.lookup("genr"), Some(2));
        assert_eq!(mapping.lookup("price"), None);
        assert_eq!(mapping.lookup("   "), None);
    }

    #[test]
    fn first_header_wins_shared_word_alias() {
        let mapping = ColumnMapping::build(&["Sales Region", "Sales Total"]);
        assert_eq!(mapping.lookup("sales"), Some(0));
        assert_eq!(mapping.lookup("sales total"), Some(1));
    }

    #[test]
    fn from_rows_uses_header_row() {
        let rows = vec![
            vec!["Name".to_string(), "Score".to_string()],
            vec!["a".to_string(), "1".to_string()],
        ];
        let mapping = ColumnMapping::from_rows(&rows);
        assert_eq!(mapping.lookup("score"), Some(1));
        assert_eq!(mapping.header(0), Some("Name"));
        assert!(ColumnMapping::from_rows::<String>(&[]).is_empty());
    }
}
