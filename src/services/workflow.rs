use std::path::Path;

use serde::Serialize;

use crate::error::C3poResult;
use crate::model::settings::{Settings, SourceType};
use crate::model::table::{MetadataTable, TranslationTable};
use crate::parsers::rows;
use crate::services::convert::{self, RebuildReport};
use crate::services::document::TabularDocument;
use crate::services::json_catalog;
use crate::services::merge;
use crate::services::remote::{remote_from_settings, RemoteDocument, RemoteExport};

#[derive(Debug, Serialize, Clone, PartialEq, Eq, Default)]
pub struct WorkflowReport {
    pub rows: usize,
    pub new_rows: usize,
    pub remote_empty: bool,
    pub published: bool,
    pub files: usize,
}

fn decode_export(export: &RemoteExport) -> C3poResult<(Option<TranslationTable>, MetadataTable)> {
    Ok((
        rows::read_translations(&export.translations)?,
        rows::read_metadata(&export.metadata)?,
    ))
}

fn rebuilt_files(report: &RebuildReport) -> usize {
    report.files.len() * report.languages.len()
}

pub struct Communicator {
    settings: Settings,
    remote: Box<dyn RemoteDocument>,
}

impl Communicator {
    pub fn new(settings: Settings, remote: Box<dyn RemoteDocument>) -> Self {
        Communicator { settings, remote }
    }

    pub fn from_settings(settings: Settings) -> C3poResult<Self> {
        let remote = remote_from_settings(&settings)?;
        Ok(Communicator::new(settings, remote))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn local_tables(&self) -> C3poResult<(TranslationTable, MetadataTable)> {
        match self.settings.source_type {
            SourceType::Po => convert::to_table(&self.settings.layout()),
            SourceType::Json => json_catalog::json_to_table(&self.settings.json_layout()),
        }
    }

    fn publish(&self, translations: &TranslationTable, metadata: &MetadataTable) -> C3poResult<()> {
        let document = TabularDocument::from_tables(translations, metadata);
        self.remote.publish(&document, &self.settings.formatting)
    }

    /// Rebuilds the local tree. A missing header yields an empty tree.
    fn rebuild(
        &self,
        translations: Option<&TranslationTable>,
        metadata: &MetadataTable,
    ) -> C3poResult<usize> {
        match self.settings.source_type {
            SourceType::Po => {
                let empty = TranslationTable::default();
                let report = convert::to_catalog_set(
                    translations.unwrap_or(&empty),
                    metadata,
                    Path::new(&self.settings.locale_root),
                    &self.settings.po_files_path,
                    self.settings.header_block(),
                )?;
                Ok(rebuilt_files(&report))
            }
            SourceType::Json => {
                json_catalog::table_to_json(translations, &self.settings.json_layout())
            }
        }
    }

    pub fn upload(&self) -> C3poResult<WorkflowReport> {
        let (translations, metadata) = self.local_tables()?;
        self.publish(&translations, &metadata)?;

        tracing::info!(rows = translations.len(), "uploaded local catalogs");
        Ok(WorkflowReport {
            rows: translations.len(),
            published: true,
            ..WorkflowReport::default()
        })
    }

    /// Rebuilds the local tree from the document. A document without data
    /// leaves the tree untouched.
    pub fn download(&self) -> C3poResult<WorkflowReport> {
        let Some(export) = self.remote.download()? else {
            tracing::info!("remote document is empty; local catalogs left as they are");
            return Ok(WorkflowReport {
                remote_empty: true,
                ..WorkflowReport::default()
            });
        };

        let (translations, metadata) = decode_export(&export)?;
        let files = self.rebuild(translations.as_ref(), &metadata)?;

        Ok(WorkflowReport {
            rows: translations.as_ref().map_or(0, TranslationTable::len),
            files,
            ..WorkflowReport::default()
        })
    }

    /// Merges local catalogs into the document, republishes it when new
    /// strings were found, then rebuilds the local tree from the merged table.
    pub fn synchronize(&self) -> C3poResult<WorkflowReport> {
        let export = self.remote.download()?;
        let remote_empty = export.is_none();
        let (remote_translations, remote_metadata) = match &export {
            Some(export) => decode_export(export)?,
            None => (None, MetadataTable::default()),
        };

        match self.settings.source_type {
            SourceType::Po => {
                let outcome = merge::merge(
                    remote_translations,
                    &remote_metadata,
                    &self.settings.layout(),
                )?;

                let published = outcome.has_new_entries();
                if published {
                    self.publish(&outcome.translations, &outcome.metadata)?;
                }
                let files = self.rebuild(Some(&outcome.translations), &outcome.metadata)?;

                Ok(WorkflowReport {
                    rows: outcome.translations.len(),
                    new_rows: outcome.new_rows,
                    remote_empty,
                    published,
                    files,
                })
            }
            SourceType::Json => {
                let layout = self.settings.json_layout();
                let has_new = json_catalog::json_merge(remote_translations.as_ref(), &layout)?;

                let (translations, metadata) = json_catalog::json_to_table(&layout)?;
                let known = remote_translations.as_ref().map_or(0, TranslationTable::len);
                if has_new {
                    self.publish(&translations, &metadata)?;
                }

                Ok(WorkflowReport {
                    rows: translations.len(),
                    new_rows: translations.len().saturating_sub(known),
                    remote_empty,
                    published: has_new,
                    files: layout.languages.len(),
                })
            }
        }
    }

    pub fn clear(&self) -> C3poResult<()> {
        self.remote.clear()?;
        tracing::info!("cleared remote document");
        Ok(())
    }

    pub fn export_table(&self, dir: &Path) -> C3poResult<WorkflowReport> {
        let (translations, metadata) = self.local_tables()?;
        rows::write_file(
            &dir.join(rows::TRANSLATIONS_FILE),
            &rows::write_translations(&translations)?,
        )?;
        rows::write_file(&dir.join(rows::METADATA_FILE), &rows::write_metadata(&metadata)?)?;

        tracing::info!(dir = %dir.display(), rows = translations.len(), "exported interchange files");
        Ok(WorkflowReport {
            rows: translations.len(),
            ..WorkflowReport::default()
        })
    }

    pub fn import_table(&self, dir: &Path) -> C3poResult<WorkflowReport> {
        let translations = rows::read_translations_file(&dir.join(rows::TRANSLATIONS_FILE))?;
        let metadata = rows::read_metadata_file(&dir.join(rows::METADATA_FILE))?;
        let files = self.rebuild(translations.as_ref(), &metadata)?;

        Ok(WorkflowReport {
            rows: translations.as_ref().map_or(0, TranslationTable::len),
            files,
            ..WorkflowReport::default()
        })
    }
}
