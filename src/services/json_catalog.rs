use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

use crate::error::{C3poError, C3poResult};
use crate::model::entry::empty_metadata_record;
use crate::model::settings::JsonLayout;
use crate::model::table::{MetadataTable, TranslationRow, TranslationTable};
use crate::services::staging::{write_atomic, StagedTree};

pub type JsonCatalog = Map<String, Value>;

fn read_object(path: &Path) -> C3poResult<JsonCatalog> {
    let text = fs::read_to_string(path).map_err(|e| C3poError::io(path, e))?;
    match serde_json::from_str::<Value>(&text)? {
        Value::Object(map) => Ok(map),
        _ => Err(C3poError::parse(path, 1, "expected a JSON object")),
    }
}

fn read_object_or_empty(path: &Path) -> C3poResult<JsonCatalog> {
    if path.exists() {
        read_object(path)
    } else {
        Ok(JsonCatalog::new())
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn encode(catalog: &JsonCatalog) -> C3poResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    catalog.serialize(&mut ser)?;
    out.push(b'\n');
    Ok(out)
}

pub fn json_to_table(layout: &JsonLayout<'_>) -> C3poResult<(TranslationTable, MetadataTable)> {
    let reference = layout
        .reference_language()
        .ok_or_else(|| C3poError::Config("no languages configured".into()))?;

    let base = read_object(&layout.catalog_path(reference))?;
    let mut others = Vec::with_capacity(layout.languages.len());
    for lang in &layout.languages[1..] {
        others.push(read_object_or_empty(&layout.catalog_path(lang))?);
    }

    let mut table = TranslationTable::new(layout.languages);
    let mut metadata = MetadataTable::default();

    for (msgid, msgstr) in &base {
        let mut msgstrs = vec![as_text(msgstr)];
        msgstrs.extend(
            others
                .iter()
                .map(|c| c.get(msgid).map(as_text).unwrap_or_default()),
        );
        table.rows.push(TranslationRow {
            file: String::new(),
            comment: String::new(),
            msgid: msgid.clone(),
            msgstrs,
        });
        metadata.push("", msgid, empty_metadata_record());
    }

    tracing::info!(rows = table.len(), "read json catalogs");
    Ok((table, metadata))
}

pub fn table_to_json(
    table: Option<&TranslationTable>,
    layout: &JsonLayout<'_>,
) -> C3poResult<usize> {
    let staged = StagedTree::new(layout.locale_root)?;
    let staged_layout = JsonLayout {
        locale_root: staged.path(),
        ..*layout
    };

    let mut written = 0;
    if let Some(table) = table {
        for (i, lang) in table.languages.iter().enumerate() {
            let catalog: JsonCatalog = table
                .rows
                .iter()
                .map(|row| (row.msgid.clone(), Value::String(row.msgstr(i).to_string())))
                .collect();
            let path = staged_layout.catalog_path(lang);
            fs::write(&path, encode(&catalog)?).map_err(|e| C3poError::io(&path, e))?;
            written += 1;
        }
    }

    staged.commit()?;
    tracing::info!(root = %layout.locale_root.display(), files = written, "rebuilt json catalogs");
    Ok(written)
}

/// Remote values overwrite local ones for every msgid the table carries.
/// Returns `true` when the local reference catalog has msgids the table lacks.
pub fn json_merge(table: Option<&TranslationTable>, layout: &JsonLayout<'_>) -> C3poResult<bool> {
    let mut catalogs: Vec<(String, JsonCatalog)> = Vec::with_capacity(layout.languages.len());
    for lang in layout.languages {
        catalogs.push((lang.clone(), read_object_or_empty(&layout.catalog_path(lang))?));
    }

    let known: HashSet<&str> = table
        .map(|t| t.rows.iter().map(|r| r.msgid.as_str()).collect())
        .unwrap_or_default();
    let has_new = catalogs
        .first()
        .is_some_and(|(_, reference)| reference.keys().any(|msgid| !known.contains(msgid.as_str())));

    if let Some(table) = table {
        for (col, lang) in table.languages.iter().enumerate() {
            let pos = match catalogs.iter().position(|(l, _)| l == lang) {
                Some(pos) => pos,
                None => {
                    catalogs.push((lang.clone(), JsonCatalog::new()));
                    catalogs.len() - 1
                }
            };
            let catalog = &mut catalogs[pos].1;
            for row in &table.rows {
                catalog.insert(row.msgid.clone(), Value::String(row.msgstr(col).to_string()));
            }
        }
    }

    for (lang, catalog) in &catalogs {
        write_atomic(&layout.catalog_path(lang), &encode(catalog)?)?;
    }

    tracing::info!(languages = catalogs.len(), new = has_new, "merged json catalogs");
    Ok(has_new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs() -> Vec<String> {
        vec!["en".to_string(), "fr".to_string()]
    }

    fn layout<'a>(languages: &'a [String], root: &'a Path) -> JsonLayout<'a> {
        JsonLayout {
            languages,
            locale_root: root,
            prefix: "lang_",
            suffix: ".js",
        }
    }

    #[test]
    fn table_follows_reference_order() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("lang_en.js"), r#"{"b": "B", "a": "A"}"#).unwrap();
        fs::write(root.path().join("lang_fr.js"), r#"{"a": "Ah"}"#).unwrap();
        let languages = langs();

        let (table, metadata) = json_to_table(&layout(&languages, root.path())).unwrap();

        let rows: Vec<_> = table.rows.iter().map(|r| (r.msgid.as_str(), r.msgstrs.clone())).collect();
        assert_eq!(rows[0], ("b", vec!["B".to_string(), String::new()]));
        assert_eq!(rows[1], ("a", vec!["A".to_string(), "Ah".to_string()]));
        assert_eq!(metadata.rows.len(), 2);
    }

    #[test]
    fn rebuild_writes_one_object_per_language() {
        let root = tempfile::tempdir().unwrap();
        let locale = root.path().join("locale");
        fs::create_dir_all(&locale).unwrap();
        fs::write(locale.join("lang_de.js"), "{}").unwrap();
        let languages = langs();

        let mut table = TranslationTable::new(&languages);
        table.rows.push(TranslationRow {
            msgid: "Hello".into(),
            msgstrs: vec![String::new(), "Bonjour".into()],
            ..Default::default()
        });

        let written = table_to_json(Some(&table), &layout(&languages, &locale)).unwrap();
        assert_eq!(written, 2);
        assert!(!locale.join("lang_de.js").exists());

        let fr = read_object(&locale.join("lang_fr.js")).unwrap();
        assert_eq!(fr.get("Hello"), Some(&Value::String("Bonjour".into())));
        let raw = fs::read_to_string(locale.join("lang_fr.js")).unwrap();
        assert!(raw.contains("\n    \"Hello\""));
    }

    #[test]
    fn merge_prefers_remote_and_reports_local_only_msgids() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("lang_en.js"), r#"{"Hello": "", "Bye": ""}"#).unwrap();
        fs::write(root.path().join("lang_fr.js"), r#"{"Hello": "Bonjour"}"#).unwrap();
        let languages = langs();
        let layout = layout(&languages, root.path());

        let mut table = TranslationTable::new(&languages);
        table.rows.push(TranslationRow {
            msgid: "Hello".into(),
            msgstrs: vec![String::new(), "Salut".into()],
            ..Default::default()
        });

        assert!(json_merge(Some(&table), &layout).unwrap());
        let fr = read_object(&root.path().join("lang_fr.js")).unwrap();
        assert_eq!(fr.get("Hello"), Some(&Value::String("Salut".into())));

        table.rows.push(TranslationRow {
            msgid: "Bye".into(),
            msgstrs: vec![String::new(), "Au revoir".into()],
            ..Default::default()
        });
        assert!(!json_merge(Some(&table), &layout).unwrap());
    }
}
