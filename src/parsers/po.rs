//! Gettext catalog codec.
//!
//! Decoding keeps every attribute of a unit that is not msgid/msgstr/translator
//! comment in the entry's metadata map, so a catalog survives a trip through
//! the table without loss. Encoding writes a fixed header block followed by the
//! entries in the order given.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{C3poError, C3poResult};
use crate::model::entry::{
    CatalogEntry, Metadata, KEY_COMMENT, KEY_ENCODING, KEY_FLAGS, KEY_MSGCTXT, KEY_MSGID_PLURAL,
    KEY_MSGSTR_PLURAL, KEY_OBSOLETE, KEY_OCCURRENCES, KEY_PREVIOUS_MSGCTXT, KEY_PREVIOUS_MSGID,
    KEY_PREVIOUS_MSGID_PLURAL, KEY_UNKNOWN_COMMENTS,
};
use crate::model::settings::HeaderBlock;
use crate::services::encoding;

const OCCURRENCE_WRAP: usize = 78;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Catalog {
    /// msgstr of the header unit (`msgid ""`), when the file has one.
    pub header: Option<String>,
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn find(&self, msgid: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.msgid == msgid)
    }
}

pub fn read_catalog(path: &Path) -> C3poResult<Catalog> {
    let bytes = fs::read(path).map_err(|e| C3poError::io(path, e))?;
    let decoded = encoding::decode(&bytes);
    if decoded.had_errors {
        tracing::warn!(path = %path.display(), encoding = %decoded.encoding, "catalog decoded with replacement characters");
    }
    parse(&decoded.text, path)
}

pub fn read_catalog_or_empty(path: &Path) -> C3poResult<Catalog> {
    if path.exists() {
        read_catalog(path)
    } else {
        Ok(Catalog::default())
    }
}

pub fn write_catalog(
    path: &Path,
    entries: &[CatalogEntry],
    lang: &str,
    header: Option<HeaderBlock<'_>>,
) -> C3poResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| C3poError::io(parent, e))?;
    }
    fs::write(path, render(entries, lang, header)).map_err(|e| C3poError::io(path, e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Msgctxt,
    Msgid,
    MsgidPlural,
    Msgstr,
    MsgstrPlural(usize),
    PrevMsgctxt,
    PrevMsgid,
    PrevMsgidPlural,
}

#[derive(Debug, Default)]
struct Pending {
    start_line: usize,
    translator: Vec<String>,
    extracted: Vec<String>,
    occurrences: Vec<Value>,
    flags: Vec<String>,
    unknown: Vec<String>,
    previous_msgctxt: Option<String>,
    previous_msgid: Option<String>,
    previous_msgid_plural: Option<String>,
    msgctxt: Option<String>,
    msgid: Option<String>,
    msgid_plural: Option<String>,
    msgstr: Option<String>,
    msgstr_plural: Vec<(usize, String)>,
    obsolete: bool,
}

impl Pending {
    fn has_msgstr(&self) -> bool {
        self.msgstr.is_some() || !self.msgstr_plural.is_empty()
    }

    fn is_blank(&self) -> bool {
        self.msgid.is_none() && self.msgctxt.is_none()
    }

    fn slot(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::None => None,
            Field::Msgctxt => self.msgctxt.as_mut(),
            Field::Msgid => self.msgid.as_mut(),
            Field::MsgidPlural => self.msgid_plural.as_mut(),
            Field::Msgstr => self.msgstr.as_mut(),
            Field::MsgstrPlural(n) => self
                .msgstr_plural
                .iter_mut()
                .rev()
                .find(|(i, _)| *i == n)
                .map(|(_, s)| s),
            Field::PrevMsgctxt => self.previous_msgctxt.as_mut(),
            Field::PrevMsgid => self.previous_msgid.as_mut(),
            Field::PrevMsgidPlural => self.previous_msgid_plural.as_mut(),
        }
    }

    fn into_entry(self) -> CatalogEntry {
        let mut metadata: Metadata = Map::new();
        metadata.insert(KEY_COMMENT.into(), Value::String(self.extracted.join("\n")));
        metadata.insert(KEY_PREVIOUS_MSGCTXT.into(), opt_string(self.previous_msgctxt));
        metadata.insert(KEY_ENCODING.into(), Value::String("utf-8".into()));
        metadata.insert(KEY_OBSOLETE.into(), Value::Bool(self.obsolete));
        metadata.insert(
            KEY_MSGID_PLURAL.into(),
            Value::String(self.msgid_plural.unwrap_or_default()),
        );

        let plural: Map<String, Value> = self
            .msgstr_plural
            .into_iter()
            .map(|(i, s)| (i.to_string(), Value::String(s)))
            .collect();
        metadata.insert(KEY_MSGSTR_PLURAL.into(), Value::Object(plural));
        metadata.insert(KEY_OCCURRENCES.into(), Value::Array(self.occurrences));
        metadata.insert(KEY_MSGCTXT.into(), opt_string(self.msgctxt));
        metadata.insert(
            KEY_FLAGS.into(),
            Value::Array(self.flags.into_iter().map(Value::String).collect()),
        );
        metadata.insert(KEY_PREVIOUS_MSGID.into(), opt_string(self.previous_msgid));
        metadata.insert(
            KEY_PREVIOUS_MSGID_PLURAL.into(),
            opt_string(self.previous_msgid_plural),
        );
        if !self.unknown.is_empty() {
            metadata.insert(
                KEY_UNKNOWN_COMMENTS.into(),
                Value::Array(self.unknown.into_iter().map(Value::String).collect()),
            );
        }

        CatalogEntry {
            msgid: self.msgid.unwrap_or_default(),
            msgstr: self.msgstr.unwrap_or_default(),
            comment: self.translator.join("\n"),
            metadata,
        }
    }
}

fn opt_string(v: Option<String>) -> Value {
    v.map(Value::String).unwrap_or(Value::Null)
}

struct Parser<'a> {
    path: &'a Path,
    catalog: Catalog,
    pending: Pending,
    field: Field,
    seen_header: bool,
}

impl<'a> Parser<'a> {
    fn err(&self, line: usize, message: impl Into<String>) -> C3poError {
        C3poError::parse(self.path, line, message)
    }

    fn flush(&mut self, line: usize) -> C3poResult<()> {
        let pending = std::mem::take(&mut self.pending);
        self.field = Field::None;

        if pending.is_blank() {
            // Comments not attached to any unit (e.g. file-level notes) are dropped.
            return Ok(());
        }
        if pending.msgid.is_none() {
            return Err(self.err(pending.start_line, "msgctxt without msgid"));
        }
        if !pending.has_msgstr() {
            return Err(self.err(line, "entry has no msgstr"));
        }

        let is_header = !self.seen_header
            && pending.msgid.as_deref() == Some("")
            && pending.msgctxt.is_none()
            && !pending.obsolete;

        if is_header {
            self.seen_header = true;
            self.catalog.header = Some(pending.msgstr.unwrap_or_default());
        } else {
            self.catalog.entries.push(pending.into_entry());
        }
        Ok(())
    }

    fn comment(&mut self, ln: usize, body: &str) -> C3poResult<()> {
        if self.pending.has_msgstr() {
            self.flush(ln)?;
        }
        if self.pending.is_blank() && self.pending.start_line == 0 {
            self.pending.start_line = ln;
        }

        let rest = &body[1..];
        if let Some(text) = rest.strip_prefix('.') {
            self.pending.extracted.push(strip_one_space(text).to_string());
        } else if let Some(text) = rest.strip_prefix(':') {
            self.pending
                .occurrences
                .extend(text.split_whitespace().map(occurrence));
        } else if let Some(text) = rest.strip_prefix(',') {
            self.pending.flags.extend(
                text.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(str::to_string),
            );
        } else if let Some(text) = rest.strip_prefix('|') {
            self.previous(ln, text.trim())?;
        } else if rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t') {
            self.pending.translator.push(strip_one_space(rest).to_string());
        } else {
            self.pending.unknown.push(body.trim_end().to_string());
        }
        Ok(())
    }

    fn previous(&mut self, ln: usize, text: &str) -> C3poResult<()> {
        if let Some(v) = text.strip_prefix("msgctxt") {
            self.pending.previous_msgctxt = Some(self.quoted(ln, v)?);
            self.field = Field::PrevMsgctxt;
        } else if let Some(v) = text.strip_prefix("msgid_plural") {
            self.pending.previous_msgid_plural = Some(self.quoted(ln, v)?);
            self.field = Field::PrevMsgidPlural;
        } else if let Some(v) = text.strip_prefix("msgid") {
            self.pending.previous_msgid = Some(self.quoted(ln, v)?);
            self.field = Field::PrevMsgid;
        } else if text.starts_with('"') {
            let value = self.quoted(ln, text)?;
            match self.field {
                Field::PrevMsgctxt | Field::PrevMsgid | Field::PrevMsgidPlural => {
                    if let Some(slot) = self.pending.slot(self.field) {
                        slot.push_str(&value);
                    }
                }
                _ => return Err(self.err(ln, "continuation of a previous field without a field")),
            }
        } else {
            return Err(self.err(ln, format!("malformed previous-value comment: #|{text}")));
        }
        Ok(())
    }

    fn keyword(&mut self, ln: usize, body: &str, obsolete: bool) -> C3poResult<()> {
        if let Some(v) = body.strip_prefix("msgctxt") {
            if self.pending.has_msgstr() || self.pending.msgid.is_some() {
                self.flush(ln)?;
            }
            if self.pending.start_line == 0 {
                self.pending.start_line = ln;
            }
            self.pending.msgctxt = Some(self.quoted(ln, v)?);
            self.field = Field::Msgctxt;
        } else if let Some(v) = body.strip_prefix("msgid_plural") {
            if self.pending.msgid.is_none() {
                return Err(self.err(ln, "msgid_plural before msgid"));
            }
            self.pending.msgid_plural = Some(self.quoted(ln, v)?);
            self.field = Field::MsgidPlural;
        } else if let Some(v) = body.strip_prefix("msgid") {
            if self.pending.has_msgstr() {
                self.flush(ln)?;
            } else if self.pending.msgid.is_some() {
                return Err(self.err(ln, "msgid follows a msgid without msgstr"));
            }
            if self.pending.start_line == 0 {
                self.pending.start_line = ln;
            }
            self.pending.msgid = Some(self.quoted(ln, v)?);
            self.field = Field::Msgid;
        } else if let Some(v) = body.strip_prefix("msgstr[") {
            if self.pending.msgid.is_none() {
                return Err(self.err(ln, "msgstr before msgid"));
            }
            let (index, value) = v
                .split_once(']')
                .ok_or_else(|| self.err(ln, "unterminated msgstr index"))?;
            let index: usize = index
                .trim()
                .parse()
                .map_err(|_| self.err(ln, format!("invalid msgstr index: {index}")))?;
            let value = self.quoted(ln, value)?;
            self.pending.msgstr_plural.push((index, value));
            self.field = Field::MsgstrPlural(index);
        } else if let Some(v) = body.strip_prefix("msgstr") {
            if self.pending.msgid.is_none() {
                return Err(self.err(ln, "msgstr before msgid"));
            }
            self.pending.msgstr = Some(self.quoted(ln, v)?);
            self.field = Field::Msgstr;
        } else if body.starts_with('"') {
            if self.field == Field::None {
                return Err(self.err(ln, "string continuation outside of a field"));
            }
            let value = self.quoted(ln, body)?;
            let field = self.field;
            if let Some(slot) = self.pending.slot(field) {
                slot.push_str(&value);
            }
        } else {
            return Err(self.err(ln, format!("unexpected line: {body}")));
        }

        self.pending.obsolete |= obsolete;
        Ok(())
    }

    fn quoted(&self, ln: usize, s: &str) -> C3poResult<String> {
        unquote(s.trim()).map_err(|m| self.err(ln, m))
    }
}

fn strip_one_space(s: &str) -> &str {
    s.strip_prefix(' ').unwrap_or(s)
}

/// `path:line` references become `[path, line]`; anything else keeps an empty line.
fn occurrence(token: &str) -> Value {
    let (file, line) = match token.rsplit_once(':') {
        Some((file, line)) if !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit()) => {
            (file, line)
        }
        _ => (token, ""),
    };
    Value::Array(vec![Value::String(file.into()), Value::String(line.into())])
}

fn unquote(s: &str) -> Result<String, String> {
    let inner = s
        .strip_prefix('"')
        .ok_or_else(|| format!("expected quoted string, found: {s}"))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    loop {
        match chars.next() {
            None => return Err("unterminated string".into()),
            Some('"') => break,
            Some('\\') => match chars.next() {
                None => return Err("unterminated string".into()),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('a') => out.push('\u{7}'),
                Some('b') => out.push('\u{8}'),
                Some('f') => out.push('\u{c}'),
                Some('v') => out.push('\u{b}'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
            },
            Some(c) => out.push(c),
        }
    }

    let trailing: String = chars.collect();
    if !trailing.trim().is_empty() {
        return Err(format!("unexpected text after closing quote: {}", trailing.trim()));
    }
    Ok(out)
}

pub fn parse(text: &str, path: &Path) -> C3poResult<Catalog> {
    let mut parser = Parser {
        path,
        catalog: Catalog::default(),
        pending: Pending::default(),
        field: Field::None,
        seen_header: false,
    };

    let mut last = 0;
    for (i, raw) in text.lines().enumerate() {
        let ln = i + 1;
        last = ln;
        let line = raw.trim_end_matches('\r').trim_start();

        if line.trim().is_empty() {
            parser.flush(ln)?;
            continue;
        }

        if let Some(rest) = line.strip_prefix("#~") {
            let rest = rest.trim_start();
            if rest.is_empty() {
                continue;
            }
            if let Some(prev) = rest.strip_prefix('|') {
                parser.pending.obsolete = true;
                parser.previous(ln, prev.trim())?;
            } else {
                parser.keyword(ln, rest, true)?;
            }
        } else if line.starts_with('#') {
            parser.comment(ln, line)?;
        } else {
            parser.keyword(ln, line, false)?;
        }
    }
    parser.flush(last + 1)?;

    Ok(parser.catalog)
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            c => out.push(c),
        }
    }
    out
}

fn push_field(out: &mut String, prefix: &str, keyword: &str, value: &str) {
    let multiline = value.trim_end_matches('\n').contains('\n');
    if !multiline {
        out.push_str(&format!("{prefix}{keyword} \"{}\"\n", escape(value)));
        return;
    }

    out.push_str(&format!("{prefix}{keyword} \"\"\n"));
    for segment in value.split_inclusive('\n') {
        out.push_str(&format!("{prefix}\"{}\"\n", escape(segment)));
    }
}

fn push_comment_lines(out: &mut String, marker: &str, text: &str) {
    for line in text.split('\n') {
        if line.is_empty() {
            out.push_str(marker);
            out.push('\n');
        } else {
            out.push_str(&format!("{marker} {line}\n"));
        }
    }
}

fn push_occurrences(out: &mut String, occurrences: &[(String, String)]) {
    let mut line = String::from("#:");
    for (file, ln) in occurrences {
        let token = if ln.is_empty() {
            file.clone()
        } else {
            format!("{file}:{ln}")
        };
        if line.len() > 2 && line.len() + 1 + token.len() > OCCURRENCE_WRAP {
            out.push_str(&line);
            out.push('\n');
            line = String::from("#:");
        }
        line.push(' ');
        line.push_str(&token);
    }
    if line.len() > 2 {
        out.push_str(&line);
        out.push('\n');
    }
}

fn render_entry(out: &mut String, entry: &CatalogEntry) {
    if !entry.comment.is_empty() {
        push_comment_lines(out, "#", &entry.comment);
    }
    if !entry.extracted_comment().is_empty() {
        push_comment_lines(out, "#.", entry.extracted_comment());
    }
    push_occurrences(out, &entry.occurrences());

    let flags = entry.flags();
    if !flags.is_empty() {
        out.push_str(&format!("#, {}\n", flags.join(", ")));
    }
    for unknown in entry.unknown_comments() {
        out.push_str(unknown);
        out.push('\n');
    }

    let (prefix, previous_prefix) = if entry.is_obsolete() {
        ("#~ ", "#~| ")
    } else {
        ("", "#| ")
    };

    if let Some(v) = entry.previous_msgctxt() {
        push_field(out, previous_prefix, "msgctxt", v);
    }
    if let Some(v) = entry.previous_msgid() {
        push_field(out, previous_prefix, "msgid", v);
    }
    if let Some(v) = entry.previous_msgid_plural() {
        push_field(out, previous_prefix, "msgid_plural", v);
    }
    if let Some(v) = entry.msgctxt() {
        push_field(out, prefix, "msgctxt", v);
    }
    push_field(out, prefix, "msgid", &entry.msgid);

    let plural = entry.msgid_plural();
    if plural.is_empty() {
        push_field(out, prefix, "msgstr", &entry.msgstr);
        return;
    }

    push_field(out, prefix, "msgid_plural", plural);
    let mut forms = entry.msgstr_plural();
    if forms.is_empty() {
        forms = vec![(0, String::new()), (1, String::new())];
    }
    for (i, form) in forms {
        push_field(out, prefix, &format!("msgstr[{i}]"), &form);
    }
}

fn render_header(out: &mut String, lang: &str, header: HeaderBlock<'_>) {
    for line in header.text.lines() {
        if line.starts_with('#') {
            out.push_str(line);
        } else {
            out.push_str("# ");
            out.push_str(line);
        }
        out.push('\n');
    }

    let md = header.metadata;
    out.push_str("msgid \"\"\n");
    out.push_str("msgstr \"\"\n");
    out.push_str(&format!("\"MIME-Version: {}\\n\"\n", escape(&md.mime_version)));
    out.push_str(&format!("\"Content-Type: {}\\n\"\n", escape(&md.content_type)));
    out.push_str(&format!(
        "\"Content-Transfer-Encoding: {}\\n\"\n",
        escape(&md.content_transfer_encoding)
    ));
    out.push_str(&format!("\"Language: {}\\n\"\n", escape(lang)));
}

pub fn render(entries: &[CatalogEntry], lang: &str, header: Option<HeaderBlock<'_>>) -> String {
    let mut out = String::new();
    let mut first = true;

    if let Some(header) = header {
        render_header(&mut out, lang, header);
        first = false;
    }

    for entry in entries {
        if !first {
            out.push('\n');
        }
        first = false;
        render_entry(&mut out, entry);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::settings::CatalogMetadata;

    const SAMPLE: &str = r#"# translated with c3po
msgid ""
msgstr ""
"MIME-Version: 1.0\n"
"Content-Type: text/plain; charset=UTF-8\n"
"Language: fr\n"

# Greeting on the landing page
#. shown once
#: templates/index.html:12 app/views.py:3
#, python-format
#@ custom-tool-note
msgctxt "home"
msgid "Hello %(name)s"
msgstr "Bonjour %(name)s"

#: app/models.py:40
msgid "One file"
msgid_plural "%d files"
msgstr[0] "Un fichier"
msgstr[1] "%d fichiers"

#| msgid "Old text"
msgid ""
"Line one\n"
"Line two"
msgstr ""

#~ msgid "Gone"
#~ msgstr "Parti"
"#;

    fn parse_str(text: &str) -> C3poResult<Catalog> {
        parse(text, Path::new("fr/LC_MESSAGES/app.po"))
    }

    #[test]
    fn parses_all_unit_kinds() {
        let catalog = parse_str(SAMPLE).unwrap();

        assert!(catalog.header.as_deref().unwrap().contains("Language: fr"));
        assert_eq!(catalog.entries.len(), 4);

        let hello = &catalog.entries[0];
        assert_eq!(hello.msgid, "Hello %(name)s");
        assert_eq!(hello.msgstr, "Bonjour %(name)s");
        assert_eq!(hello.comment, "Greeting on the landing page");
        assert_eq!(hello.extracted_comment(), "shown once");
        assert_eq!(hello.msgctxt(), Some("home"));
        assert_eq!(hello.flags(), vec!["python-format"]);
        assert_eq!(hello.unknown_comments(), vec!["#@ custom-tool-note"]);
        assert_eq!(
            hello.occurrences(),
            vec![
                ("templates/index.html".to_string(), "12".to_string()),
                ("app/views.py".to_string(), "3".to_string())
            ]
        );

        let plural = &catalog.entries[1];
        assert_eq!(plural.msgid_plural(), "%d files");
        assert_eq!(plural.msgstr_plural()[1].1, "%d fichiers");

        let multi = &catalog.entries[2];
        assert_eq!(multi.msgid, "Line one\nLine two");
        assert_eq!(multi.previous_msgid(), Some("Old text"));
        assert_eq!(multi.msgstr, "");

        assert!(catalog.entries[3].is_obsolete());
        assert_eq!(catalog.find("Gone").unwrap().msgstr, "Parti");
    }

    #[test]
    fn render_then_parse_preserves_entries() {
        let catalog = parse_str(SAMPLE).unwrap();
        let metadata = CatalogMetadata::default();
        let header = HeaderBlock {
            text: "# translated with c3po",
            metadata: &metadata,
        };

        let text = render(&catalog.entries, "fr", Some(header));
        assert!(text.starts_with("# translated with c3po\nmsgid \"\"\n"));
        assert!(text.contains("\"Language: fr\\n\""));
        assert!(text.contains("#~ msgid \"Gone\""));

        let again = parse_str(&text).unwrap();
        assert_eq!(again.entries, catalog.entries);
    }

    #[test]
    fn entries_without_blank_separators_are_split() {
        let catalog = parse_str("msgid \"a\"\nmsgstr \"A\"\nmsgid \"b\"\nmsgstr \"B\"\n").unwrap();
        assert_eq!(catalog.entries.len(), 2);
        assert_eq!(catalog.entries[1].msgstr, "B");
    }

    #[test]
    fn malformed_units_report_the_line() {
        let err = parse_str("msgid \"a\"\nmsgstr \"open\n").unwrap_err();
        match err {
            C3poError::Parse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("unterminated"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(parse_str("msgstr \"orphan\"\n").is_err());
        assert!(parse_str("msgid \"no translation\"\n\n").is_err());
        assert!(parse_str("msgid \"a\"\nmsgstr \"A\"\nbogus\n").is_err());
    }

    #[test]
    fn render_without_header_writes_only_entries() {
        let entries = vec![CatalogEntry::new("Hello", ""), CatalogEntry::new("Bye", "Salut")];
        let text = render(&entries, "fr", None);
        assert_eq!(text, "msgid \"Hello\"\nmsgstr \"\"\n\nmsgid \"Bye\"\nmsgstr \"Salut\"\n");
    }

    #[test]
    fn escapes_round_trip() {
        let entries = vec![CatalogEntry::new("Say \"hi\"\\now", "tab\there\n")];
        let text = render(&entries, "fr", None);
        let back = parse_str(&text).unwrap();
        assert_eq!(back.entries[0].msgid, "Say \"hi\"\\now");
        assert_eq!(back.entries[0].msgstr, "tab\there\n");
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = read_catalog_or_empty(&dir.path().join("nope.po")).unwrap();
        assert!(catalog.entries.is_empty());
    }

    #[test]
    fn write_catalog_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fr").join("app.po");

        write_catalog(&path, &[CatalogEntry::new("a", "A"), CatalogEntry::new("b", "B")], "fr", None)
            .unwrap();
        write_catalog(&path, &[CatalogEntry::new("c", "C")], "fr", None).unwrap();

        let catalog = read_catalog(&path).unwrap();
        assert_eq!(catalog.entries.len(), 1);
        assert_eq!(catalog.entries[0].msgid, "c");
    }
}
