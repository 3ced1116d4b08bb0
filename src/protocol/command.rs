#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    DetectEncoding,
    SettingsLoad,
    SettingsSave,
    Upload,
    Download,
    Synchronize,
    Clear,
    Push,
    Checkout,
    TableExport,
    TableImport,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "encoding.detect" | "detect_encoding" => Command::DetectEncoding,
            "settings.load" => Command::SettingsLoad,
            "settings.save" => Command::SettingsSave,
            "upload" => Command::Upload,
            "download" => Command::Download,
            "synchronize" | "sync" => Command::Synchronize,
            "clear" => Command::Clear,
            "push" | "git.push" => Command::Push,
            "checkout" | "git.checkout" => Command::Checkout,
            "table.export" => Command::TableExport,
            "table.import" => Command::TableImport,
            _ => Command::Unknown,
        }
    }
}
