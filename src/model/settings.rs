use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

fn default_languages() -> Vec<String> {
    vec!["en".into(), "pl".into(), "jp".into()]
}

fn default_locale_root() -> String {
    "conf/locale".to_string()
}

fn default_po_files_path() -> String {
    "LC_MESSAGES".to_string()
}

fn default_header() -> Option<String> {
    Some("# translated with c3po".to_string())
}

fn default_temp_path() -> String {
    "temp".to_string()
}

fn default_json_prefix() -> String {
    "lang_".to_string()
}

fn default_json_suffix() -> String {
    ".js".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    Po,
    Json,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RemoteKind {
    #[default]
    Http,
    Directory,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogMetadata {
    #[serde(rename = "MIME-Version")]
    pub mime_version: String,

    #[serde(rename = "Content-Type")]
    pub content_type: String,

    #[serde(rename = "Content-Transfer-Encoding")]
    pub content_transfer_encoding: String,
}

impl Default for CatalogMetadata {
    fn default() -> Self {
        CatalogMetadata {
            mime_version: "1.0".into(),
            content_type: "text/plain; charset=UTF-8".into(),
            content_transfer_encoding: "8bit".into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RemoteSettings {
    pub kind: RemoteKind,

    pub document_key: String,

    pub access_token: String,

    /// `{key}` and `{gid}` are substituted; gid 0 is the translations sheet, 1 the metadata sheet.
    pub export_url: String,

    pub upload_url: String,

    pub directory: String,

    pub timeout_secs: u64,

    pub max_retries: usize,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            kind: RemoteKind::Http,
            document_key: String::new(),
            access_token: String::new(),
            export_url: "https://docs.google.com/spreadsheets/d/{key}/export?format=csv&gid={gid}"
                .into(),
            upload_url: "https://www.googleapis.com/upload/drive/v3/files/{key}?uploadType=media"
                .into(),
            directory: String::new(),
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GitSettings {
    pub repository: String,
    pub branch: String,
    pub message: String,
    pub remote_name: String,
}

impl Default for GitSettings {
    fn default() -> Self {
        GitSettings {
            repository: String::new(),
            branch: "master".into(),
            message: "Update translations".into(),
            remote_name: "po_translator".into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Formatting {
    pub odd_column_bg_color: String,
    pub even_column_bg_color: String,
    pub title_row_bg_color: String,
    pub title_row_font_color: String,
    pub msgstr_column_width: String,
    pub notes_column_width: String,
    pub metadata_column_width: String,
}

impl Default for Formatting {
    fn default() -> Self {
        Formatting {
            odd_column_bg_color: "#FFFFFF".into(),
            even_column_bg_color: "#F9F9F9".into(),
            title_row_bg_color: "#D9EDF7".into(),
            title_row_font_color: "#3A87AD".into(),
            msgstr_column_width: "2.5in".into(),
            notes_column_width: "1.5in".into(),
            metadata_column_width: "5.0in".into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    /// The first language is the reference language.
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    #[serde(default = "default_locale_root", alias = "LOCALE_ROOT")]
    pub locale_root: String,

    #[serde(default = "default_po_files_path", alias = "PO_FILES_PATH")]
    pub po_files_path: String,

    #[serde(default = "default_header")]
    pub header: Option<String>,

    #[serde(default = "default_temp_path")]
    pub temp_path: String,

    #[serde(default)]
    pub source_type: SourceType,

    #[serde(default = "default_json_prefix")]
    pub json_file_prefix: String,

    #[serde(default = "default_json_suffix")]
    pub json_file_suffix: String,

    #[serde(default)]
    pub catalog_metadata: CatalogMetadata,

    #[serde(default)]
    pub remote: RemoteSettings,

    #[serde(default)]
    pub git: GitSettings,

    #[serde(default)]
    pub formatting: Formatting,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            languages: default_languages(),
            locale_root: default_locale_root(),
            po_files_path: default_po_files_path(),
            header: default_header(),
            temp_path: default_temp_path(),
            source_type: SourceType::default(),
            json_file_prefix: default_json_prefix(),
            json_file_suffix: default_json_suffix(),
            catalog_metadata: CatalogMetadata::default(),
            remote: RemoteSettings::default(),
            git: GitSettings::default(),
            formatting: Formatting::default(),
        }
    }
}

impl Settings {
    pub fn layout(&self) -> CatalogLayout<'_> {
        CatalogLayout {
            languages: &self.languages,
            locale_root: Path::new(&self.locale_root),
            po_files_path: &self.po_files_path,
        }
    }

    pub fn json_layout(&self) -> JsonLayout<'_> {
        JsonLayout {
            languages: &self.languages,
            locale_root: Path::new(&self.locale_root),
            prefix: &self.json_file_prefix,
            suffix: &self.json_file_suffix,
        }
    }

    pub fn header_block(&self) -> Option<HeaderBlock<'_>> {
        self.header.as_deref().map(|text| HeaderBlock {
            text,
            metadata: &self.catalog_metadata,
        })
    }
}

/// Where the catalogs of every language live on disk:
/// `<locale_root>/<language>/<po_files_path>/<filename>`.
#[derive(Debug, Clone, Copy)]
pub struct CatalogLayout<'a> {
    pub languages: &'a [String],
    pub locale_root: &'a Path,
    pub po_files_path: &'a str,
}

impl<'a> CatalogLayout<'a> {
    pub fn reference_language(&self) -> Option<&'a str> {
        self.languages.first().map(String::as_str)
    }

    pub fn catalog_dir(&self, lang: &str) -> PathBuf {
        catalog_dir_in(self.locale_root, lang, self.po_files_path)
    }

    pub fn catalog_path(&self, lang: &str, filename: &str) -> PathBuf {
        self.catalog_dir(lang).join(filename)
    }
}

pub fn catalog_dir_in(root: &Path, lang: &str, po_files_path: &str) -> PathBuf {
    let dir = root.join(lang);
    if po_files_path.is_empty() {
        dir
    } else {
        dir.join(po_files_path)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct JsonLayout<'a> {
    pub languages: &'a [String],
    pub locale_root: &'a Path,
    pub prefix: &'a str,
    pub suffix: &'a str,
}

impl<'a> JsonLayout<'a> {
    pub fn reference_language(&self) -> Option<&'a str> {
        self.languages.first().map(String::as_str)
    }

    pub fn catalog_path(&self, lang: &str) -> PathBuf {
        self.locale_root
            .join(format!("{}{}{}", self.prefix, lang, self.suffix))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HeaderBlock<'a> {
    pub text: &'a str,
    pub metadata: &'a CatalogMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let s: Settings = serde_json::from_str(r#"{"languages": ["en", "fr"]}"#).unwrap();
        assert_eq!(s.languages, vec!["en", "fr"]);
        assert_eq!(s.po_files_path, "LC_MESSAGES");
        assert_eq!(s.catalog_metadata.mime_version, "1.0");
        assert_eq!(s.remote.max_retries, 3);
    }

    #[test]
    fn null_header_disables_the_header_block() {
        let s: Settings = serde_json::from_str(r#"{"header": null}"#).unwrap();
        assert!(s.header_block().is_none());
    }

    #[test]
    fn layout_builds_catalog_paths() {
        let s = Settings {
            locale_root: "locale".into(),
            ..Settings::default()
        };
        let layout = s.layout();
        assert_eq!(layout.reference_language(), Some("en"));
        assert_eq!(
            layout.catalog_path("pl", "django.po"),
            Path::new("locale").join("pl").join("LC_MESSAGES").join("django.po")
        );
        assert_eq!(
            s.json_layout().catalog_path("fr"),
            Path::new("locale").join("lang_fr.js")
        );
    }
}
