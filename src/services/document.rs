use std::fmt::Display;
use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{C3poError, C3poResult};
use crate::model::settings::Formatting;
use crate::model::table::{MetadataRow, MetadataTable, TranslationRow, TranslationTable};

pub const TRANSLATIONS_SHEET: &str = "Translations";
pub const METADATA_SHEET: &str = "Meta options";
pub const ODS_CONTENT_TYPE: &str = "application/x-vnd.oasis.opendocument.spreadsheet";
const ODS_MIMETYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularDocument {
    pub translations: Sheet,
    pub metadata: Sheet,
}

/// A leading apostrophe would be swallowed as the spreadsheet's text marker.
pub fn escape_cell(value: &str) -> String {
    if value.starts_with('\'') {
        format!("'{value}")
    } else {
        value.to_string()
    }
}

pub fn unescape_cell(value: &str) -> &str {
    match value.strip_prefix('\'') {
        Some(rest) if rest.starts_with('\'') => rest,
        _ => value,
    }
}

fn escaped_row<'a>(cells: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    cells.into_iter().map(escape_cell).collect()
}

impl TabularDocument {
    pub fn from_tables(translations: &TranslationTable, metadata: &MetadataTable) -> Self {
        let mut trans_rows = vec![translations.header()];
        for row in &translations.rows {
            let mut cells = escaped_row([row.file.as_str(), row.comment.as_str(), row.msgid.as_str()]);
            cells.extend((0..translations.languages.len()).map(|i| escape_cell(row.msgstr(i))));
            trans_rows.push(cells);
        }

        let mut meta_rows = vec![MetadataTable::header()];
        for row in &metadata.rows {
            meta_rows.push(escaped_row([
                row.file.as_str(),
                row.key.as_deref().unwrap_or(""),
                row.record.as_str(),
            ]));
        }

        TabularDocument {
            translations: Sheet {
                name: TRANSLATIONS_SHEET.to_string(),
                rows: trans_rows,
            },
            metadata: Sheet {
                name: METADATA_SHEET.to_string(),
                rows: meta_rows,
            },
        }
    }

    /// Reads the grids back into tables. A translations sheet without a
    /// header row yields `None`, like an empty export.
    pub fn to_tables(&self) -> (Option<TranslationTable>, MetadataTable) {
        let cell = |row: &[String], i: usize| -> String {
            row.get(i).map(|c| unescape_cell(c).to_string()).unwrap_or_default()
        };

        let translations = match self.translations.rows.split_first() {
            Some((header, rows)) if header.iter().any(|c| !c.trim().is_empty()) => {
                let mut table = TranslationTable::from_header(header);
                let width = table.languages.len();
                for row in rows {
                    table.rows.push(TranslationRow {
                        file: cell(row, 0),
                        comment: cell(row, 1),
                        msgid: cell(row, 2),
                        msgstrs: (0..width).map(|i| cell(row, 3 + i)).collect(),
                    });
                }
                Some(table)
            }
            _ => None,
        };

        let mut metadata = MetadataTable::default();
        for row in self.metadata.rows.iter().skip(1) {
            let key = cell(row, 1);
            metadata.rows.push(MetadataRow {
                file: cell(row, 0),
                key: (!key.is_empty()).then_some(key),
                record: cell(row, 2),
            });
        }

        (translations, metadata)
    }

    pub fn to_ods(&self, formatting: &Formatting) -> C3poResult<Vec<u8>> {
        let content = self.content_xml(formatting)?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        // The mimetype entry must come first and be stored uncompressed.
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts: [(&str, &[u8], SimpleFileOptions); 4] = [
            ("mimetype", ODS_MIMETYPE.as_bytes(), stored),
            ("META-INF/manifest.xml", MANIFEST_XML.as_bytes(), deflated),
            ("styles.xml", STYLES_XML.as_bytes(), deflated),
            ("content.xml", &content, deflated),
        ];

        for (name, data, options) in parts {
            zip.start_file(name, options)
                .map_err(|e| doc_err(format!("failed to add {name}: {e}")))?;
            zip.write_all(data)
                .map_err(|e| doc_err(format!("failed to write {name}: {e}")))?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| doc_err(format!("failed to finalize document: {e}")))?;

        Ok(cursor.into_inner())
    }

    fn content_xml(&self, formatting: &Formatting) -> C3poResult<Vec<u8>> {
        let mut w = Writer::new(Vec::new());

        w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(doc_err)?;
        w.write_event(Event::Start(BytesStart::new("office:document-content").with_attributes([
            ("xmlns:office", "urn:oasis:names:tc:opendocument:xmlns:office:1.0"),
            ("xmlns:style", "urn:oasis:names:tc:opendocument:xmlns:style:1.0"),
            ("xmlns:text", "urn:oasis:names:tc:opendocument:xmlns:text:1.0"),
            ("xmlns:table", "urn:oasis:names:tc:opendocument:xmlns:table:1.0"),
            ("xmlns:fo", "urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0"),
            ("office:version", "1.2"),
        ])))
        .map_err(doc_err)?;

        write_automatic_styles(&mut w, formatting)?;

        start(&mut w, BytesStart::new("office:body"))?;
        start(&mut w, BytesStart::new("office:spreadsheet"))?;

        // file and comment/key columns are narrow, text columns wide
        write_sheet(&mut w, &self.translations, |i| if i < 2 { "co-notes" } else { "co-msgstr" })?;
        write_sheet(&mut w, &self.metadata, |i| if i < 2 { "co-notes" } else { "co-metadata" })?;

        end(&mut w, "office:spreadsheet")?;
        end(&mut w, "office:body")?;
        end(&mut w, "office:document-content")?;

        Ok(w.into_inner())
    }
}

fn doc_err<E: Display>(e: E) -> C3poError {
    C3poError::Document(e.to_string())
}

fn start(w: &mut Writer<Vec<u8>>, el: BytesStart<'_>) -> C3poResult<()> {
    w.write_event(Event::Start(el)).map_err(doc_err)
}

fn empty(w: &mut Writer<Vec<u8>>, el: BytesStart<'_>) -> C3poResult<()> {
    w.write_event(Event::Empty(el)).map_err(doc_err)
}

fn end(w: &mut Writer<Vec<u8>>, name: &str) -> C3poResult<()> {
    w.write_event(Event::End(BytesEnd::new(name))).map_err(doc_err)
}

fn text(w: &mut Writer<Vec<u8>>, s: &str) -> C3poResult<()> {
    w.write_event(Event::Text(BytesText::new(s))).map_err(doc_err)
}

fn write_automatic_styles(w: &mut Writer<Vec<u8>>, f: &Formatting) -> C3poResult<()> {
    start(w, BytesStart::new("office:automatic-styles"))?;

    for (name, width) in [
        ("co-notes", f.notes_column_width.as_str()),
        ("co-msgstr", f.msgstr_column_width.as_str()),
        ("co-metadata", f.metadata_column_width.as_str()),
    ] {
        start(
            w,
            BytesStart::new("style:style")
                .with_attributes([("style:name", name), ("style:family", "table-column")]),
        )?;
        empty(
            w,
            BytesStart::new("style:table-column-properties")
                .with_attributes([("style:column-width", width)]),
        )?;
        end(w, "style:style")?;
    }

    for (name, bg, title) in [
        ("ce-title", f.title_row_bg_color.as_str(), true),
        ("ce-even", f.even_column_bg_color.as_str(), false),
        ("ce-odd", f.odd_column_bg_color.as_str(), false),
    ] {
        start(
            w,
            BytesStart::new("style:style")
                .with_attributes([("style:name", name), ("style:family", "table-cell")]),
        )?;
        empty(
            w,
            BytesStart::new("style:table-cell-properties")
                .with_attributes([("fo:background-color", bg), ("fo:wrap-option", "wrap")]),
        )?;
        if title {
            empty(
                w,
                BytesStart::new("style:text-properties").with_attributes([
                    ("fo:font-weight", "bold"),
                    ("fo:color", f.title_row_font_color.as_str()),
                ]),
            )?;
        }
        end(w, "style:style")?;
    }

    end(w, "office:automatic-styles")
}

fn write_sheet(
    w: &mut Writer<Vec<u8>>,
    sheet: &Sheet,
    column_style: impl Fn(usize) -> &'static str,
) -> C3poResult<()> {
    start(
        w,
        BytesStart::new("table:table").with_attributes([("table:name", sheet.name.as_str())]),
    )?;

    let width = sheet.rows.iter().map(Vec::len).max().unwrap_or(0);
    for i in 0..width {
        empty(
            w,
            BytesStart::new("table:table-column")
                .with_attributes([("table:style-name", column_style(i))]),
        )?;
    }

    for (r, row) in sheet.rows.iter().enumerate() {
        start(w, BytesStart::new("table:table-row"))?;
        for c in 0..width {
            let style = match (r, c % 2) {
                (0, _) => "ce-title",
                (_, 0) => "ce-even",
                _ => "ce-odd",
            };
            let value = row.get(c).map(String::as_str).unwrap_or("");
            write_cell(w, value, style)?;
        }
        end(w, "table:table-row")?;
    }

    end(w, "table:table")
}

fn write_cell(w: &mut Writer<Vec<u8>>, value: &str, style: &str) -> C3poResult<()> {
    let el = BytesStart::new("table:table-cell").with_attributes([("table:style-name", style)]);
    if value.is_empty() {
        return empty(w, el);
    }

    start(w, el.with_attributes([("office:value-type", "string")]))?;
    for line in value.split('\n') {
        start(w, BytesStart::new("text:p"))?;
        write_spaced(w, line)?;
        end(w, "text:p")?;
    }
    end(w, "table:table-cell")
}

/// Writes paragraph text so that leading, trailing and repeated spaces and
/// tabs survive; ODF collapses plain whitespace.
fn write_spaced(w: &mut Writer<Vec<u8>>, line: &str) -> C3poResult<()> {
    let chars: Vec<char> = line.chars().collect();
    let mut plain = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            ' ' => {
                let run = chars[i..].iter().take_while(|&&c| c == ' ').count();
                let at_edge = i == 0 || i + run == chars.len();
                if run == 1 && !at_edge {
                    plain.push(' ');
                } else {
                    flush_plain(w, &mut plain)?;
                    let count = run.to_string();
                    empty(
                        w,
                        BytesStart::new("text:s").with_attributes([("text:c", count.as_str())]),
                    )?;
                }
                i += run;
            }
            '\t' => {
                flush_plain(w, &mut plain)?;
                empty(w, BytesStart::new("text:tab"))?;
                i += 1;
            }
            c => {
                plain.push(c);
                i += 1;
            }
        }
    }

    flush_plain(w, &mut plain)
}

fn flush_plain(w: &mut Writer<Vec<u8>>, plain: &mut String) -> C3poResult<()> {
    if !plain.is_empty() {
        text(w, plain)?;
        plain.clear();
    }
    Ok(())
}

const MANIFEST_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.2">
 <manifest:file-entry manifest:full-path="/" manifest:version="1.2" manifest:media-type="application/vnd.oasis.opendocument.spreadsheet"/>
 <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
 <manifest:file-entry manifest:full-path="styles.xml" manifest:media-type="text/xml"/>
</manifest:manifest>
"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-styles xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" office:version="1.2">
 <office:styles>
  <style:default-style style:family="table-cell">
   <style:text-properties fo:font-size="10pt"/>
  </style:default-style>
 </office:styles>
</office:document-styles>
"#;
