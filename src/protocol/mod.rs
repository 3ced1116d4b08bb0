use std::path::PathBuf;

use serde_json::{json, Value};

use crate::error::{C3poError, C3poResult};
use crate::services::workflow::Communicator;
use crate::services::{encoding, vcs};

mod command;
mod settings;

use command::Command;

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn get_str<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "message": message.into()
    })
    .to_string()
}

fn communicator(payload: &Value) -> C3poResult<Communicator> {
    Communicator::from_settings(settings::resolve(payload)?)
}

/// Directory for `table.export`/`table.import`; the configured temp path by default.
fn table_dir(payload: &Value, communicator: &Communicator) -> PathBuf {
    get_str(payload, "dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&communicator.settings().temp_path))
}

fn dispatch(cmd: Command, payload: &Value) -> C3poResult<Value> {
    match cmd {
        Command::Ping => Ok(json!({ "message": "c3po-core alive" })),

        Command::DetectEncoding => {
            let path = get_str(payload, "path")
                .ok_or_else(|| C3poError::Config("payload.path is required".into()))?;
            let decoded = encoding::detect_from_file(&PathBuf::from(path))?;
            Ok(json!({
                "encoding": decoded.encoding,
                "had_errors": decoded.had_errors
            }))
        }

        Command::Upload => Ok(json!({ "report": communicator(payload)?.upload()? })),
        Command::Download => Ok(json!({ "report": communicator(payload)?.download()? })),
        Command::Synchronize => Ok(json!({ "report": communicator(payload)?.synchronize()? })),

        Command::Clear => {
            communicator(payload)?.clear()?;
            Ok(json!({}))
        }

        Command::Push => {
            let settings = settings::resolve(payload)?;
            let output = vcs::git_push(&settings, get_str(payload, "message"))?;
            Ok(serde_json::to_value(output)?)
        }

        Command::Checkout => {
            let settings = settings::resolve(payload)?;
            Ok(serde_json::to_value(vcs::git_checkout(&settings)?)?)
        }

        Command::TableExport => {
            let c = communicator(payload)?;
            let dir = table_dir(payload, &c);
            let report = c.export_table(&dir)?;
            Ok(json!({ "dir": dir.display().to_string(), "report": report }))
        }

        Command::TableImport => {
            let c = communicator(payload)?;
            let dir = table_dir(payload, &c);
            let report = c.import_table(&dir)?;
            Ok(json!({ "dir": dir.display().to_string(), "report": report }))
        }

        Command::SettingsLoad | Command::SettingsSave | Command::Unknown => {
            Err(C3poError::Config("unknown command".into()))
        }
    }
}

pub fn handle(input: &str) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let cmd_str = get_cmd(&req);
    let payload = get_payload(&req);

    let result = match settings::handle(cmd_str, payload) {
        Some(result) => result,
        None => match Command::from(cmd_str) {
            Command::Unknown => return err(id, "unknown command"),
            cmd => dispatch(cmd, payload),
        },
    };

    match result {
        Ok(payload) => ok(id, payload),
        Err(e) => {
            tracing::warn!(cmd = cmd_str, error = %e, "command failed");
            err(id, e.to_string())
        }
    }
}
