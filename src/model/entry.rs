use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type Metadata = Map<String, Value>;

pub const KEY_COMMENT: &str = "comment";
pub const KEY_PREVIOUS_MSGCTXT: &str = "previous_msgctxt";
pub const KEY_ENCODING: &str = "encoding";
pub const KEY_OBSOLETE: &str = "obsolete";
pub const KEY_MSGID_PLURAL: &str = "msgid_plural";
pub const KEY_MSGSTR_PLURAL: &str = "msgstr_plural";
pub const KEY_OCCURRENCES: &str = "occurrences";
pub const KEY_MSGCTXT: &str = "msgctxt";
pub const KEY_FLAGS: &str = "flags";
pub const KEY_PREVIOUS_MSGID: &str = "previous_msgid";
pub const KEY_PREVIOUS_MSGID_PLURAL: &str = "previous_msgid_plural";
pub const KEY_UNKNOWN_COMMENTS: &str = "unknown_comments";

pub fn empty_metadata() -> Metadata {
    let mut m = Map::new();
    m.insert(KEY_COMMENT.into(), Value::String(String::new()));
    m.insert(KEY_PREVIOUS_MSGCTXT.into(), Value::Null);
    m.insert(KEY_ENCODING.into(), Value::String("utf-8".into()));
    m.insert(KEY_OBSOLETE.into(), Value::Bool(false));
    m.insert(KEY_MSGID_PLURAL.into(), Value::String(String::new()));
    m.insert(KEY_MSGSTR_PLURAL.into(), Value::Object(Map::new()));
    m.insert(KEY_OCCURRENCES.into(), Value::Array(Vec::new()));
    m.insert(KEY_MSGCTXT.into(), Value::Null);
    m.insert(KEY_FLAGS.into(), Value::Array(Vec::new()));
    m.insert(KEY_PREVIOUS_MSGID.into(), Value::Null);
    m.insert(KEY_PREVIOUS_MSGID_PLURAL.into(), Value::Null);
    m
}

pub fn empty_metadata_record() -> String {
    Value::Object(empty_metadata()).to_string()
}

pub fn parse_metadata_record(record: &str) -> Result<Metadata, String> {
    match serde_json::from_str::<Value>(record.trim()) {
        Ok(Value::Object(m)) => Ok(m),
        Ok(other) => Err(format!("expected an object, found {}", type_name(&other))),
        Err(e) => Err(e.to_string()),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CatalogEntry {
    pub msgid: String,

    #[serde(default)]
    pub msgstr: String,

    #[serde(default)]
    pub comment: String,

    #[serde(default = "empty_metadata")]
    pub metadata: Metadata,
}

impl CatalogEntry {
    pub fn new(msgid: impl Into<String>, msgstr: impl Into<String>) -> Self {
        CatalogEntry {
            msgid: msgid.into(),
            msgstr: msgstr.into(),
            comment: String::new(),
            metadata: empty_metadata(),
        }
    }

    pub fn metadata_record(&self) -> String {
        Value::Object(self.metadata.clone()).to_string()
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    fn str_list(&self, key: &str) -> Vec<&str> {
        match self.metadata.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn extracted_comment(&self) -> &str {
        self.str_field(KEY_COMMENT).unwrap_or("")
    }

    pub fn msgctxt(&self) -> Option<&str> {
        self.str_field(KEY_MSGCTXT)
    }

    pub fn msgid_plural(&self) -> &str {
        self.str_field(KEY_MSGID_PLURAL).unwrap_or("")
    }

    pub fn previous_msgctxt(&self) -> Option<&str> {
        self.str_field(KEY_PREVIOUS_MSGCTXT)
    }

    pub fn previous_msgid(&self) -> Option<&str> {
        self.str_field(KEY_PREVIOUS_MSGID)
    }

    pub fn previous_msgid_plural(&self) -> Option<&str> {
        self.str_field(KEY_PREVIOUS_MSGID_PLURAL)
    }

    pub fn flags(&self) -> Vec<&str> {
        self.str_list(KEY_FLAGS)
    }

    pub fn unknown_comments(&self) -> Vec<&str> {
        self.str_list(KEY_UNKNOWN_COMMENTS)
    }

    /// Older tables stored the flag as 0/1.
    pub fn is_obsolete(&self) -> bool {
        match self.metadata.get(KEY_OBSOLETE) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
            _ => false,
        }
    }

    /// Source references as `(file, line)`; line is empty when the reference had none.
    pub fn occurrences(&self) -> Vec<(String, String)> {
        let Some(Value::Array(items)) = self.metadata.get(KEY_OCCURRENCES) else {
            return Vec::new();
        };

        items
            .iter()
            .filter_map(|item| match item {
                Value::Array(pair) => {
                    let file = pair.first().map(value_text)?;
                    let line = pair.get(1).map(value_text).unwrap_or_default();
                    Some((file, line))
                }
                Value::String(s) => Some((s.clone(), String::new())),
                _ => None,
            })
            .collect()
    }

    pub fn msgstr_plural(&self) -> Vec<(usize, String)> {
        let Some(Value::Object(forms)) = self.metadata.get(KEY_MSGSTR_PLURAL) else {
            return Vec::new();
        };

        let mut out: Vec<(usize, String)> = forms
            .iter()
            .filter_map(|(k, v)| Some((k.parse::<usize>().ok()?, value_text(v))))
            .collect();
        out.sort_by_key(|(i, _)| *i);
        out
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_record_keeps_key_order() {
        let record = empty_metadata_record();
        assert!(record.starts_with(r#"{"comment":"","previous_msgctxt":null,"encoding":"utf-8""#));
        assert_eq!(parse_metadata_record(&record).unwrap(), empty_metadata());
    }

    #[test]
    fn rejects_non_object_records() {
        assert!(parse_metadata_record("[1,2]").is_err());
        assert!(parse_metadata_record("{'comment': ''}").is_err());
        assert!(parse_metadata_record("").is_err());
    }

    #[test]
    fn unknown_keys_survive_a_record_round_trip() {
        let mut entry = CatalogEntry::new("Hello", "");
        entry.metadata.insert("x-custom".into(), json!({"a": [1, 2]}));

        let back = parse_metadata_record(&entry.metadata_record()).unwrap();
        assert_eq!(back.get("x-custom"), Some(&json!({"a": [1, 2]})));
    }

    #[test]
    fn typed_accessors_read_metadata() {
        let mut entry = CatalogEntry::new("%d file", "");
        entry.metadata.insert(KEY_OBSOLETE.into(), json!(1));
        entry.metadata.insert(KEY_MSGSTR_PLURAL.into(), json!({"1": "b", "0": "a"}));
        entry
            .metadata
            .insert(KEY_OCCURRENCES.into(), json!([["src/app.py", "12"], ["README"]]));

        assert!(entry.is_obsolete());
        assert_eq!(entry.msgstr_plural(), vec![(0, "a".into()), (1, "b".into())]);
        assert_eq!(
            entry.occurrences(),
            vec![
                ("src/app.py".to_string(), "12".to_string()),
                ("README".to_string(), String::new())
            ]
        );
    }
}
