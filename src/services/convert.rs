use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{C3poError, C3poResult};
use crate::model::entry::{empty_metadata, parse_metadata_record, CatalogEntry};
use crate::model::settings::{catalog_dir_in, CatalogLayout, HeaderBlock};
use crate::model::table::{
    aligned_records, MetadataTable, TranslationRow, TranslationTable,
};
use crate::parsers::po;
use crate::services::staging::StagedTree;

const CATALOG_EXTENSION: &str = ".po";

/// Catalog filenames of one language, sorted so every run enumerates them identically.
pub fn list_catalog_files(layout: &CatalogLayout<'_>, lang: &str) -> C3poResult<Vec<String>> {
    let dir = layout.catalog_dir(lang);
    let read = fs::read_dir(&dir).map_err(|e| C3poError::io(&dir, e))?;

    let mut names = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| C3poError::io(&dir, e))?;
        let is_file = entry
            .file_type()
            .map_err(|e| C3poError::io(entry.path(), e))?
            .is_file();
        if !is_file {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(CATALOG_EXTENSION) {
                names.push(name.to_string());
            }
        }
    }

    names.sort();
    Ok(names)
}

pub fn to_table(layout: &CatalogLayout<'_>) -> C3poResult<(TranslationTable, MetadataTable)> {
    let reference = layout
        .reference_language()
        .ok_or_else(|| C3poError::Config("no languages configured".into()))?;

    let mut table = TranslationTable::new(layout.languages);
    let mut metadata = MetadataTable::default();

    for filename in list_catalog_files(layout, reference)? {
        let base = po::read_catalog(&layout.catalog_path(reference, &filename))?;

        let others = layout.languages[1..]
            .iter()
            .map(|lang| po::read_catalog_or_empty(&layout.catalog_path(lang, &filename)))
            .collect::<C3poResult<Vec<_>>>()?;
        let lookups: Vec<HashMap<&str, &str>> = others
            .iter()
            .map(|c| {
                c.entries
                    .iter()
                    .map(|e| (e.msgid.as_str(), e.msgstr.as_str()))
                    .collect()
            })
            .collect();

        for entry in &base.entries {
            let mut msgstrs = Vec::with_capacity(layout.languages.len());
            msgstrs.push(entry.msgstr.clone());
            for lookup in &lookups {
                msgstrs.push(lookup.get(entry.msgid.as_str()).unwrap_or(&"").to_string());
            }

            table.rows.push(TranslationRow {
                file: filename.clone(),
                comment: entry.comment.clone(),
                msgid: entry.msgid.clone(),
                msgstrs,
            });
            metadata.push(&filename, &entry.msgid, entry.metadata_record());
        }

        tracing::debug!(file = %filename, entries = base.entries.len(), "catalog tabulated");
    }

    tracing::info!(rows = table.len(), languages = table.languages.len(), "built translation table");
    Ok((table, metadata))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogFile {
    pub filename: String,
    pub catalogs: Vec<Vec<CatalogEntry>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogSet {
    pub languages: Vec<String>,
    pub files: Vec<CatalogFile>,
}

impl CatalogSet {
    pub fn entries(&self, lang: &str, filename: &str) -> Option<&[CatalogEntry]> {
        let li = self.languages.iter().position(|l| l == lang)?;
        self.files
            .iter()
            .find(|f| f.filename == filename)
            .and_then(|f| f.catalogs.get(li))
            .map(Vec::as_slice)
    }

    pub fn entry_count(&self) -> usize {
        self.files
            .iter()
            .map(|f| f.catalogs.first().map_or(0, Vec::len))
            .sum()
    }
}

fn leading_ws() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s+").expect("leading whitespace pattern is valid"))
}

fn trailing_ws() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+$").expect("trailing whitespace pattern is valid"))
}

/// Re-applies the msgid's surrounding whitespace to a non-empty translation.
pub fn apply_whitespace(msgid: &str, msgstr: &str) -> String {
    if msgstr.is_empty() {
        return String::new();
    }
    let start = leading_ws().find(msgid).map_or("", |m| m.as_str());
    let end = trailing_ws().find(msgid).map_or("", |m| m.as_str());
    format!("{start}{}{end}", msgstr.trim())
}

pub fn build_catalog_set(
    translations: &TranslationTable,
    metadata: &MetadataTable,
) -> C3poResult<CatalogSet> {
    let languages = translations.languages.clone();
    let mut set = CatalogSet {
        languages: languages.clone(),
        files: Vec::new(),
    };
    let mut file_index: HashMap<String, usize> = HashMap::new();

    if metadata.rows.len() < translations.rows.len() {
        tracing::warn!(
            rows = translations.rows.len(),
            metadata_rows = metadata.rows.len(),
            "metadata sheet is shorter than translations; backfilling empty records"
        );
    }

    let records = aligned_records(translations, metadata);

    for (i, (row, record)) in translations.rows.iter().zip(records).enumerate() {
        let meta = match record {
            Some(r) if !r.trim().is_empty() => {
                parse_metadata_record(r).map_err(|message| C3poError::Metadata {
                    file: row.file.clone(),
                    // header is row 1
                    row: i + 2,
                    message,
                })?
            }
            _ => empty_metadata(),
        };

        let idx = *file_index.entry(row.file.clone()).or_insert_with(|| {
            set.files.push(CatalogFile {
                filename: row.file.clone(),
                catalogs: vec![Vec::new(); languages.len()],
            });
            set.files.len() - 1
        });

        for (li, catalog) in set.files[idx].catalogs.iter_mut().enumerate() {
            catalog.push(CatalogEntry {
                msgid: row.msgid.clone(),
                msgstr: apply_whitespace(&row.msgid, row.msgstr(li)),
                comment: row.comment.clone(),
                metadata: meta.clone(),
            });
        }
    }

    Ok(set)
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    pub languages: Vec<String>,
    pub files: Vec<String>,
    pub entries: usize,
}

pub fn write_catalog_set(
    set: &CatalogSet,
    locale_root: &Path,
    po_files_path: &str,
    header: Option<HeaderBlock<'_>>,
) -> C3poResult<RebuildReport> {
    let staged = StagedTree::new(locale_root)?;

    for lang in &set.languages {
        let dir = catalog_dir_in(staged.path(), lang, po_files_path);
        fs::create_dir_all(&dir).map_err(|e| C3poError::io(&dir, e))?;
    }

    for file in &set.files {
        for (lang, entries) in set.languages.iter().zip(&file.catalogs) {
            let path = catalog_dir_in(staged.path(), lang, po_files_path).join(&file.filename);
            po::write_catalog(&path, entries, lang, header)?;
        }
    }

    staged.commit()?;

    let report = RebuildReport {
        languages: set.languages.clone(),
        files: set.files.iter().map(|f| f.filename.clone()).collect(),
        entries: set.entry_count(),
    };
    tracing::info!(
        root = %locale_root.display(),
        files = report.files.len(),
        entries = report.entries,
        "rebuilt catalog tree"
    );
    Ok(report)
}

pub fn to_catalog_set(
    translations: &TranslationTable,
    metadata: &MetadataTable,
    locale_root: &Path,
    po_files_path: &str,
    header: Option<HeaderBlock<'_>>,
) -> C3poResult<RebuildReport> {
    let set = build_catalog_set(translations, metadata)?;
    write_catalog_set(&set, locale_root, po_files_path, header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::settings::CatalogMetadata;
    use crate::model::table::MetadataRow;
    use std::path::PathBuf;

    fn write(root: &Path, lang: &str, name: &str, body: &str) {
        let dir = root.join(lang).join("LC_MESSAGES");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), body).unwrap();
    }

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn layout<'a>(languages: &'a [String], root: &'a Path) -> CatalogLayout<'a> {
        CatalogLayout {
            languages,
            locale_root: root,
            po_files_path: "LC_MESSAGES",
        }
    }

    #[test]
    fn whitespace_is_reapplied_only_to_translations() {
        assert_eq!(apply_whitespace("  Hello  ", "Bonjour"), "  Bonjour  ");
        assert_eq!(apply_whitespace("\nHello\n", " Bonjour "), "\nBonjour\n");
        assert_eq!(apply_whitespace("  Hello  ", ""), "");
        assert_eq!(apply_whitespace("Hello", "Bonjour"), "Bonjour");
    }

    #[test]
    fn to_table_joins_languages_by_msgid() {
        let root = tempfile::tempdir().unwrap();
        write(
            root.path(),
            "en",
            "app.po",
            "msgid \"Hello\"\nmsgstr \"\"\n\nmsgid \"Bye\"\nmsgstr \"\"\n",
        );
        write(root.path(), "fr", "app.po", "msgid \"Hello\"\nmsgstr \"Bonjour\"\n");
        write(root.path(), "en", "notes.txt", "ignored");

        let languages = langs(&["en", "fr", "de"]);
        let (table, meta) = to_table(&layout(&languages, root.path())).unwrap();

        assert_eq!(table.languages, languages);
        let rows: Vec<(&str, &str, Vec<String>)> = table
            .rows
            .iter()
            .map(|r| (r.comment.as_str(), r.msgid.as_str(), r.msgstrs.clone()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("", "Hello", langs(&["", "Bonjour", ""])),
                ("", "Bye", langs(&["", "", ""])),
            ]
        );
        assert_eq!(meta.rows.len(), 2);
        assert_eq!(meta.rows[1].key.as_deref(), Some(table.rows[1].key().as_str()));
    }

    #[test]
    fn files_are_enumerated_in_sorted_order() {
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "en", "zeta.po", "msgid \"z\"\nmsgstr \"\"\n");
        write(root.path(), "en", "alpha.po", "msgid \"a\"\nmsgstr \"\"\n");

        let languages = langs(&["en"]);
        let files = list_catalog_files(&layout(&languages, root.path()), "en").unwrap();
        assert_eq!(files, vec!["alpha.po", "zeta.po"]);
    }

    #[test]
    fn missing_metadata_rows_are_backfilled_but_bad_ones_abort() {
        let mut table = TranslationTable::new(&langs(&["en", "fr"]));
        for msgid in ["a", "b"] {
            table.rows.push(TranslationRow {
                file: "app.po".into(),
                msgid: msgid.into(),
                msgstrs: langs(&["", "x"]),
                ..Default::default()
            });
        }

        let mut meta = MetadataTable::default();
        meta.push("app.po", "a", "{\"flags\":[\"fuzzy\"]}".into());
        let set = build_catalog_set(&table, &meta).unwrap();
        let fr = set.entries("fr", "app.po").unwrap();
        assert_eq!(fr[0].flags(), vec!["fuzzy"]);
        assert_eq!(fr[1].metadata, empty_metadata());

        meta.rows.push(MetadataRow {
            file: "app.po".into(),
            key: None,
            record: "{'flags': []}".into(),
        });
        match build_catalog_set(&table, &meta).unwrap_err() {
            C3poError::Metadata { file, row, .. } => {
                assert_eq!(file, "app.po");
                assert_eq!(row, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rebuild_replaces_the_whole_tree() {
        let root = tempfile::tempdir().unwrap();
        let locale: PathBuf = root.path().join("locale");
        write(&locale, "en", "stale.po", "msgid \"old\"\nmsgstr \"\"\n");

        let mut table = TranslationTable::new(&langs(&["en", "fr"]));
        table.rows.push(TranslationRow {
            file: "app.po".into(),
            comment: "greeting".into(),
            msgid: "  Hello  ".into(),
            msgstrs: langs(&["", "Bonjour"]),
        });

        let metadata = CatalogMetadata::default();
        let header = HeaderBlock {
            text: "# translated with c3po",
            metadata: &metadata,
        };
        let report = to_catalog_set(
            &table,
            &MetadataTable::default(),
            &locale,
            "LC_MESSAGES",
            Some(header),
        )
        .unwrap();

        assert_eq!(report.files, vec!["app.po"]);
        assert_eq!(report.entries, 1);
        assert!(!locale.join("en").join("LC_MESSAGES").join("stale.po").exists());

        let fr = po::read_catalog(&locale.join("fr").join("LC_MESSAGES").join("app.po")).unwrap();
        assert!(fr.header.unwrap().contains("Language: fr"));
        assert_eq!(fr.entries[0].msgstr, "  Bonjour  ");
        assert_eq!(fr.entries[0].comment, "greeting");

        let en = po::read_catalog(&locale.join("en").join("LC_MESSAGES").join("app.po")).unwrap();
        assert_eq!(en.entries[0].msgstr, "");
    }

    #[test]
    fn headerless_table_rebuilds_an_empty_tree() {
        let root = tempfile::tempdir().unwrap();
        let locale = root.path().join("locale");
        write(&locale, "en", "app.po", "msgid \"a\"\nmsgstr \"\"\n");

        let report = to_catalog_set(
            &TranslationTable::default(),
            &MetadataTable::default(),
            &locale,
            "LC_MESSAGES",
            None,
        )
        .unwrap();

        assert_eq!(report.entries, 0);
        assert!(locale.exists());
        assert_eq!(fs::read_dir(&locale).unwrap().count(), 0);
    }

    #[test]
    fn table_round_trip_restores_catalogs() {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("source");
        write(
            &source,
            "en",
            "app.po",
            "#: app.py:1\n#, python-format\nmsgid \"Hi %s\"\nmsgstr \"\"\n\n# note\nmsgid \"Bye\"\nmsgstr \"\"\n",
        );
        write(&source, "fr", "app.po", "msgid \"Hi %s\"\nmsgstr \"Salut %s\"\n\nmsgid \"Bye\"\nmsgstr \"Au revoir\"\n");

        let languages = langs(&["en", "fr"]);
        let (table, meta) = to_table(&layout(&languages, &source)).unwrap();

        let target = root.path().join("target");
        to_catalog_set(&table, &meta, &target, "LC_MESSAGES", None).unwrap();

        let before = po::read_catalog(&source.join("en/LC_MESSAGES/app.po")).unwrap();
        let after = po::read_catalog(&target.join("en/LC_MESSAGES/app.po")).unwrap();
        assert_eq!(before.entries, after.entries);

        let fr = po::read_catalog(&target.join("fr/LC_MESSAGES/app.po")).unwrap();
        assert_eq!(fr.entries[0].msgstr, "Salut %s");
        assert_eq!(fr.entries[0].flags(), vec!["python-format"]);
        assert_eq!(fr.entries[1].comment, "note");
    }
}
