use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const MSGSTR_SUFFIX: &str = ":msgstr";
pub const TRANSLATION_FIXED_COLUMNS: [&str; 3] = ["file", "comment", "msgid"];
pub const METADATA_COLUMNS: [&str; 3] = ["file", "key", "metadata"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct TranslationRow {
    pub file: String,
    pub comment: String,
    pub msgid: String,
    pub msgstrs: Vec<String>,
}

impl TranslationRow {
    pub fn key(&self) -> String {
        row_key(&self.file, &self.msgid)
    }

    pub fn msgstr(&self, column: usize) -> &str {
        self.msgstrs.get(column).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct TranslationTable {
    pub languages: Vec<String>,
    pub rows: Vec<TranslationRow>,
}

impl TranslationTable {
    pub fn new(languages: &[String]) -> Self {
        TranslationTable {
            languages: languages.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn from_header(header: &[String]) -> Self {
        let languages = header
            .iter()
            .skip(TRANSLATION_FIXED_COLUMNS.len())
            .map(|col| language_from_column(col))
            .collect();

        TranslationTable {
            languages,
            rows: Vec::new(),
        }
    }

    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = TRANSLATION_FIXED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect();
        header.extend(self.languages.iter().map(|l| format!("{l}{MSGSTR_SUFFIX}")));
        header
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn language_from_column(column: &str) -> String {
    let col = column.trim();
    col.strip_suffix(MSGSTR_SUFFIX)
        .unwrap_or_else(|| col.split(':').next().unwrap_or(col))
        .to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct MetadataRow {
    pub file: String,
    /// Join key of the translation row this record belongs to. Absent in legacy exports.
    pub key: Option<String>,
    pub record: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct MetadataTable {
    pub rows: Vec<MetadataRow>,
}

impl MetadataTable {
    pub fn header() -> Vec<String> {
        METADATA_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    pub fn push(&mut self, file: &str, msgid: &str, record: String) {
        self.rows.push(MetadataRow {
            file: file.to_string(),
            key: Some(row_key(file, msgid)),
            record,
        });
    }
}

pub fn row_key(file: &str, msgid: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file.as_bytes());
    hasher.update([0u8]);
    hasher.update(msgid.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

/// A metadata row at the same position is used when its key matches (or it has
/// none, as in legacy exports); otherwise the record is looked up by key. `None`
/// means the metadata sheet has nothing for that row.
pub fn aligned_records<'a>(
    translations: &TranslationTable,
    metadata: &'a MetadataTable,
) -> Vec<Option<&'a str>> {
    let by_key: HashMap<&str, usize> = metadata
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.key.as_deref().map(|k| (k, i)))
        .collect();

    translations
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let key = row.key();
            match metadata.rows.get(i) {
                Some(m) if m.key.as_deref().map_or(true, |k| k == key) => Some(m.record.as_str()),
                _ => by_key
                    .get(key.as_str())
                    .map(|&j| metadata.rows[j].record.as_str()),
            }
        })
        .collect()
}
