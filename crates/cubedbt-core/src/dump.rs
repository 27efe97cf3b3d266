//! Block-style YAML rendering for embedding into Cube templates

use serde::Serialize;

/// YAML rendering errors
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("Failed to serialize YAML: {0}")]
    SerializeError(String),
}

/// Indent every line after the first by `indent` spaces
///
/// The first line is expected to continue a line the template already started.
pub fn indent_string(text: &str, indent: usize) -> String {
    let padding = " ".repeat(indent);
    text.split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i > 0 {
                format!("{}{}", padding, line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize `data` as block YAML, keys in declaration order, then indent it
pub fn dump<T: Serialize + ?Sized>(data: &T, indent: usize) -> Result<String, DumpError> {
    let yaml = serde_yaml::to_string(data).map_err(|e| DumpError::SerializeError(e.to_string()))?;
    Ok(indent_string(&yaml, indent))
}

/// Like [`dump`], but an empty sequence renders as nothing at all
pub fn dump_seq<T: Serialize>(items: &[T], indent: usize) -> Result<String, DumpError> {
    if items.is_empty() {
        return Ok(String::new());
    }
    dump(items, indent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    #[test]
    fn single_line_is_not_indented() {
        assert_eq!(indent_string("abc", 2), "abc");
    }

    #[test]
    fn following_lines_are_indented() {
        assert_eq!(indent_string("abc\ndef\nghi", 2), "abc\n  def\n  ghi");
    }

    #[test]
    fn dump_mapping() {
        let mut data = BTreeMap::new();
        data.insert("name", "users");
        data.insert("sql_table", "analytics.users");

        assert_eq!(dump(&data, 4).unwrap(), "name: users\n    sql_table: analytics.users\n    ");
    }

    #[test]
    fn empty_sequence_is_empty_string() {
        let items: Vec<BTreeMap<String, String>> = Vec::new();
        assert_eq!(dump_seq(&items, 6).unwrap(), "");
    }
}
