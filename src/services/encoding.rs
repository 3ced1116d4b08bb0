use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;

use crate::error::{C3poError, C3poResult};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug)]
pub struct DecodedText {
    pub text: String,
    /// Lowercased encoding label that was used.
    pub encoding: String,
    pub had_errors: bool,
}

/// Decodes catalog or interchange bytes.
///
/// Order of preference: UTF-8 (BOM stripped), the charset declared inside the
/// bytes (`charset=...` of a catalog header), then a `chardetng` guess.
pub fn decode(bytes: &[u8]) -> DecodedText {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(bytes) {
        return DecodedText {
            text: text.to_string(),
            encoding: "utf-8".into(),
            had_errors: false,
        };
    }

    let encoding = declared_charset(bytes)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .filter(|enc| *enc != UTF_8)
        .unwrap_or_else(|| guess(bytes));

    let (text, _, had_errors) = encoding.decode(bytes);

    DecodedText {
        text: text.into_owned(),
        encoding: encoding.name().to_lowercase(),
        had_errors,
    }
}

pub fn detect_from_file(path: &Path) -> C3poResult<DecodedText> {
    let bytes = fs::read(path).map_err(|e| C3poError::io(path, e))?;
    Ok(decode(&bytes))
}

fn guess(bytes: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

fn charset_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)charset=([A-Za-z0-9_.:-]+)").expect("charset pattern is valid")
    })
}

fn declared_charset(bytes: &[u8]) -> Option<String> {
    let caps = charset_re().captures(bytes)?;
    let label = caps.get(1)?.as_bytes();
    Some(String::from_utf8_lossy(label).into_owned())
}
