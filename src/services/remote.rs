use std::fs;
use std::path::{Path, PathBuf};
use std::{thread, time::Duration};

use rand::{thread_rng, Rng};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::error::{C3poError, C3poResult};
use crate::model::settings::{Formatting, RemoteKind, RemoteSettings, Settings};
use crate::parsers::rows;
use crate::services::document::{TabularDocument, ODS_CONTENT_TYPE};

pub const CSV_CONTENT_TYPE: &str = "text/csv";

const TRANSLATIONS_GID: u32 = 0;
const METADATA_GID: u32 = 1;
const BASE_DELAY_MS: u64 = 800;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteExport {
    pub translations: Vec<u8>,
    pub metadata: Vec<u8>,
}

pub trait RemoteDocument {
    /// `None` means the document exists but has no data yet.
    fn download(&self) -> C3poResult<Option<RemoteExport>>;

    fn upload(&self, bytes: &[u8], content_type: &str) -> C3poResult<()>;

    fn publish(&self, document: &TabularDocument, formatting: &Formatting) -> C3poResult<()> {
        let bytes = document.to_ods(formatting)?;
        self.upload(&bytes, ODS_CONTENT_TYPE)
    }

    fn clear(&self) -> C3poResult<()> {
        self.upload(b",", CSV_CONTENT_TYPE)
    }
}

pub fn remote_from_settings(settings: &Settings) -> C3poResult<Box<dyn RemoteDocument>> {
    match settings.remote.kind {
        RemoteKind::Http => Ok(Box::new(HttpRemote::new(&settings.remote)?)),
        RemoteKind::Directory => {
            if settings.remote.directory.trim().is_empty() {
                return Err(C3poError::Config("remote.directory is not set".into()));
            }
            Ok(Box::new(DirectoryRemote::new(&settings.remote.directory)))
        }
    }
}

fn backoff(attempt: usize) -> Duration {
    let jitter: u64 = thread_rng().gen_range(0..200);
    let ms = BASE_DELAY_MS * (2_u64.pow(attempt as u32)) + jitter;
    Duration::from_millis(ms)
}

fn should_retry_http(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// A missing sheet is how a brand-new document answers an export request.
fn signals_no_data(status: StatusCode, body: &str) -> bool {
    status == StatusCode::NOT_FOUND
        || (status == StatusCode::BAD_REQUEST && body.to_ascii_lowercase().contains("not found"))
}

enum Fetched {
    Body(Vec<u8>),
    NoData,
}

pub struct HttpRemote {
    client: Client,
    settings: RemoteSettings,
}

impl HttpRemote {
    pub fn new(settings: &RemoteSettings) -> C3poResult<Self> {
        if settings.document_key.trim().is_empty() {
            return Err(C3poError::Config("remote.document_key is not set".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| C3poError::Remote(e.to_string()))?;

        Ok(HttpRemote {
            client,
            settings: settings.clone(),
        })
    }

    pub fn export_url(&self, gid: u32) -> String {
        self.settings
            .export_url
            .replace("{key}", &self.settings.document_key)
            .replace("{gid}", &gid.to_string())
    }

    pub fn upload_url(&self) -> String {
        self.settings
            .upload_url
            .replace("{key}", &self.settings.document_key)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        if self.settings.access_token.is_empty() {
            req
        } else {
            req.bearer_auth(&self.settings.access_token)
        }
    }

    fn send(&self, build: impl Fn() -> RequestBuilder) -> C3poResult<Fetched> {
        let attempts = self.settings.max_retries.max(1);
        let mut last_err = String::from("no attempt made");

        for attempt in 0..attempts {
            let resp = match self.authorized(build()).send() {
                Ok(resp) => resp,
                Err(err) => {
                    last_err = err.to_string();
                    if attempt + 1 < attempts {
                        thread::sleep(backoff(attempt));
                    }
                    continue;
                }
            };

            let status = resp.status();
            let body = match resp.bytes() {
                Ok(b) => b.to_vec(),
                Err(err) => {
                    last_err = err.to_string();
                    if attempt + 1 < attempts {
                        thread::sleep(backoff(attempt));
                    }
                    continue;
                }
            };

            if status.is_success() {
                return Ok(Fetched::Body(body));
            }

            let text = String::from_utf8_lossy(&body);
            if signals_no_data(status, &text) {
                return Ok(Fetched::NoData);
            }

            last_err = format!("HTTP {}: {}", status.as_u16(), text.trim());
            if should_retry_http(status) && attempt + 1 < attempts {
                tracing::warn!(status = status.as_u16(), attempt, "remote request failed; retrying");
                thread::sleep(backoff(attempt));
                continue;
            }
            break;
        }

        Err(C3poError::Remote(last_err))
    }
}

impl RemoteDocument for HttpRemote {
    fn download(&self) -> C3poResult<Option<RemoteExport>> {
        let mut sheets = Vec::with_capacity(2);
        for gid in [TRANSLATIONS_GID, METADATA_GID] {
            let url = self.export_url(gid);
            match self.send(|| self.client.get(&url))? {
                Fetched::Body(body) => sheets.push(body),
                Fetched::NoData => {
                    tracing::info!(gid, "remote document has no data yet");
                    return Ok(None);
                }
            }
        }

        let metadata = sheets.pop().unwrap_or_default();
        let translations = sheets.pop().unwrap_or_default();
        tracing::debug!(
            translations = translations.len(),
            metadata = metadata.len(),
            "downloaded remote exports"
        );
        Ok(Some(RemoteExport {
            translations,
            metadata,
        }))
    }

    fn upload(&self, bytes: &[u8], content_type: &str) -> C3poResult<()> {
        let url = self.upload_url();
        let fetched = self.send(|| {
            self.client
                .patch(&url)
                .header(CONTENT_TYPE, content_type)
                .body(bytes.to_vec())
        })?;

        match fetched {
            Fetched::Body(_) => {
                tracing::info!(bytes = bytes.len(), content_type, "uploaded document");
                Ok(())
            }
            Fetched::NoData => Err(C3poError::Remote(format!(
                "document {} not found",
                self.settings.document_key
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryRemote {
    root: PathBuf,
}

impl DirectoryRemote {
    pub const TRANSLATIONS: &'static str = rows::TRANSLATIONS_FILE;
    pub const METADATA: &'static str = rows::METADATA_FILE;
    pub const DOCUMENT: &'static str = "document.ods";

    pub fn new(root: impl AsRef<Path>) -> Self {
        DirectoryRemote {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn read(&self, name: &str) -> C3poResult<Option<Vec<u8>>> {
        let path = self.root.join(name);
        if !path.exists() {
            return Ok(None);
        }
        fs::read(&path).map(Some).map_err(|e| C3poError::io(&path, e))
    }

    fn remove(&self, name: &str) -> C3poResult<()> {
        let path = self.root.join(name);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| C3poError::io(&path, e))?;
        }
        Ok(())
    }
}

impl RemoteDocument for DirectoryRemote {
    fn download(&self) -> C3poResult<Option<RemoteExport>> {
        let Some(translations) = self.read(Self::TRANSLATIONS)? else {
            return Ok(None);
        };
        let metadata = self.read(Self::METADATA)?.unwrap_or_default();
        Ok(Some(RemoteExport {
            translations,
            metadata,
        }))
    }

    /// A csv upload replaces the translations sheet and drops the rest; any
    /// other content is stored as the document itself.
    fn upload(&self, bytes: &[u8], content_type: &str) -> C3poResult<()> {
        if content_type == CSV_CONTENT_TYPE {
            rows::write_file(&self.root.join(Self::TRANSLATIONS), bytes)?;
            self.remove(Self::METADATA)?;
            self.remove(Self::DOCUMENT)
        } else {
            rows::write_file(&self.root.join(Self::DOCUMENT), bytes)
        }
    }

    fn publish(&self, document: &TabularDocument, formatting: &Formatting) -> C3poResult<()> {
        let (translations, metadata) = document.to_tables();
        let trans_bytes = match translations {
            Some(table) => rows::write_translations(&table)?,
            None => Vec::new(),
        };

        rows::write_file(&self.root.join(Self::TRANSLATIONS), &trans_bytes)?;
        rows::write_file(&self.root.join(Self::METADATA), &rows::write_metadata(&metadata)?)?;
        rows::write_file(&self.root.join(Self::DOCUMENT), &document.to_ods(formatting)?)?;

        tracing::info!(root = %self.root.display(), "published document to directory");
        Ok(())
    }
}
