use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::error::{C3poError, C3poResult};
use crate::model::table::{MetadataRow, MetadataTable, TranslationRow, TranslationTable};
use crate::services::encoding;

pub const TRANSLATIONS_FILE: &str = "translations.csv";
pub const METADATA_FILE: &str = "metadata.csv";

fn records(bytes: &[u8]) -> C3poResult<Vec<StringRecord>> {
    let text = encoding::decode(bytes).text;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut out = Vec::new();
    for record in reader.records() {
        out.push(record?);
    }
    Ok(out)
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

fn field(record: &StringRecord, i: usize) -> String {
    record.get(i).unwrap_or("").to_string()
}

/// Parses a translations export. `None` means there was no header row at all,
/// which is how a brand-new or cleared document exports.
pub fn read_translations(bytes: &[u8]) -> C3poResult<Option<TranslationTable>> {
    let mut rows = records(bytes)?.into_iter();

    let header = match rows.next() {
        Some(h) if !is_blank(&h) => h,
        _ => return Ok(None),
    };
    let header: Vec<String> = header.iter().map(str::to_string).collect();
    let mut table = TranslationTable::from_header(&header);
    let width = table.languages.len();

    for record in rows {
        if is_blank(&record) {
            continue;
        }
        let mut msgstrs: Vec<String> = record.iter().skip(3).map(str::to_string).collect();
        msgstrs.resize(width, String::new());

        table.rows.push(TranslationRow {
            file: record.get(0).unwrap_or("").trim_end().to_string(),
            comment: field(&record, 1),
            msgid: field(&record, 2),
            msgstrs,
        });
    }

    Ok(Some(table))
}

/// Column positions come from the header names, so legacy single-column
/// exports read the same way as current ones. Blank records stay as
/// placeholders; legacy files join by position.
pub fn read_metadata(bytes: &[u8]) -> C3poResult<MetadataTable> {
    let mut rows = records(bytes)?.into_iter();

    let header = match rows.next() {
        Some(h) if !is_blank(&h) => h,
        _ => return Ok(MetadataTable::default()),
    };
    let position = |name: &str| header.iter().position(|c| c.trim().eq_ignore_ascii_case(name));
    let record_col = position("metadata").unwrap_or(header.len().saturating_sub(1));
    let key_col = position("key");
    let file_col = position("file");

    let mut table = MetadataTable::default();
    for record in rows {
        if is_blank(&record) {
            table.rows.push(MetadataRow::default());
            continue;
        }
        table.rows.push(MetadataRow {
            file: file_col
                .map(|i| record.get(i).unwrap_or("").trim_end().to_string())
                .unwrap_or_default(),
            key: key_col
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            record: record.get(record_col).unwrap_or("").trim_end().to_string(),
        });
    }

    Ok(table)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> C3poResult<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| C3poError::io("<delimited text buffer>", e.into_error()))
}

pub fn write_translations(table: &TranslationTable) -> C3poResult<Vec<u8>> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    writer.write_record(table.header())?;

    for row in &table.rows {
        let mut record = vec![row.file.as_str(), row.comment.as_str(), row.msgid.as_str()];
        record.extend((0..table.languages.len()).map(|i| row.msgstr(i)));
        writer.write_record(&record)?;
    }

    finish(writer)
}

pub fn write_metadata(table: &MetadataTable) -> C3poResult<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(MetadataTable::header())?;

    for row in &table.rows {
        writer.write_record([
            row.file.as_str(),
            row.key.as_deref().unwrap_or(""),
            row.record.as_str(),
        ])?;
    }

    finish(writer)
}

fn read_bytes(path: &Path) -> C3poResult<Option<Vec<u8>>> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read(path).map(Some).map_err(|e| C3poError::io(path, e))
}

pub fn read_translations_file(path: &Path) -> C3poResult<Option<TranslationTable>> {
    match read_bytes(path)? {
        Some(bytes) => read_translations(&bytes),
        None => Ok(None),
    }
}

pub fn read_metadata_file(path: &Path) -> C3poResult<MetadataTable> {
    match read_bytes(path)? {
        Some(bytes) => read_metadata(&bytes),
        None => Ok(MetadataTable::default()),
    }
}

pub fn write_file(path: &Path, bytes: &[u8]) -> C3poResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| C3poError::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| C3poError::io(path, e))
}
