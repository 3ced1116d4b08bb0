use std::collections::{HashMap, HashSet};

use crate::error::C3poResult;
use crate::model::entry::empty_metadata_record;
use crate::model::settings::CatalogLayout;
use crate::model::table::{aligned_records, MetadataTable, TranslationRow, TranslationTable};
use crate::parsers::po;
use crate::services::convert::list_catalog_files;

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub translations: TranslationTable,
    pub metadata: MetadataTable,
    pub new_rows: usize,
}

impl MergeOutcome {
    pub fn has_new_entries(&self) -> bool {
        self.new_rows > 0
    }
}

/// Remote rows are copied verbatim and win over local edits. A reference entry
/// is new only when its msgid appears nowhere in the table, whatever the file.
pub fn merge(
    remote: Option<TranslationTable>,
    remote_metadata: &MetadataTable,
    layout: &CatalogLayout<'_>,
) -> C3poResult<MergeOutcome> {
    let remote = remote.unwrap_or_else(|| {
        tracing::info!("remote table is empty; starting from configured languages");
        TranslationTable::new(layout.languages)
    });

    let mut translations = TranslationTable::new(&remote.languages);
    let mut metadata = MetadataTable::default();
    let mut known: HashSet<String> = HashSet::new();

    for (row, record) in remote.rows.iter().zip(aligned_records(&remote, remote_metadata)) {
        let record = match record {
            Some(r) if !r.trim().is_empty() => r.to_string(),
            _ => empty_metadata_record(),
        };
        metadata.push(&row.file, &row.msgid, record);
        known.insert(row.msgid.clone());
    }
    translations.rows = remote.rows;

    let Some(reference) = layout.reference_language() else {
        return Ok(MergeOutcome {
            translations,
            metadata,
            new_rows: 0,
        });
    };

    let mut new_rows = 0usize;

    for filename in list_catalog_files(layout, reference)? {
        let base = po::read_catalog(&layout.catalog_path(reference, &filename))?;

        let fresh: Vec<_> = base
            .entries
            .iter()
            .filter(|e| !known.contains(&e.msgid))
            .collect();
        if fresh.is_empty() {
            continue;
        }

        // Translators may have filled in a string locally before it reached the table.
        let mut local: HashMap<&str, po::Catalog> = HashMap::new();
        for lang in &translations.languages {
            if lang != reference && !local.contains_key(lang.as_str()) {
                let catalog = po::read_catalog_or_empty(&layout.catalog_path(lang, &filename))?;
                local.insert(lang.as_str(), catalog);
            }
        }

        for entry in fresh {
            if !known.insert(entry.msgid.clone()) {
                continue;
            }
            let msgstrs = translations
                .languages
                .iter()
                .map(|lang| {
                    if lang == reference {
                        entry.msgstr.clone()
                    } else {
                        local
                            .get(lang.as_str())
                            .and_then(|c| c.find(&entry.msgid))
                            .map(|e| e.msgstr.clone())
                            .unwrap_or_default()
                    }
                })
                .collect();

            translations.rows.push(TranslationRow {
                file: filename.clone(),
                comment: entry.comment.clone(),
                msgid: entry.msgid.clone(),
                msgstrs,
            });
            metadata.push(&filename, &entry.msgid, entry.metadata_record());
            new_rows += 1;
        }

        tracing::info!(file = %filename, "found new entries");
    }

    tracing::info!(
        existing = translations.rows.len() - new_rows,
        new = new_rows,
        "merged local catalogs into remote table"
    );

    Ok(MergeOutcome {
        translations,
        metadata,
        new_rows,
    })
}
