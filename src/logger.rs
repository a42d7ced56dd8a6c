use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::warn;

/// How much of each poll body ends up in the wire log.
pub enum MessageLogMode {
    /// Every listing in full.
    Full,
    /// First listing in full, then leaf-level changes only.
    Diffed,
}

/// NDJSON trace of outbound commands and polled listings. The access
/// token never passes through here.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous: Option<Value>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous: None,
        })
    }

    pub fn log_command(&mut self, action: &str, fields: &[(&str, &str)]) {
        let mut body = Map::new();
        for (key, value) in fields {
            body.insert((*key).to_string(), json!(value));
        }
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "cmd",
            "action": action,
            "fields": body,
        });
        self.write_line(&entry);
    }

    pub fn log_listing(&mut self, status: u16, body: &Value) {
        match self.mode {
            MessageLogMode::Full => {
                let entry = json!({
                    "ts": Utc::now().to_rfc3339(),
                    "dir": "poll",
                    "status": status,
                    "body": body,
                });
                self.write_line(&entry);
            }
            MessageLogMode::Diffed => {
                let entry = match self.previous.take() {
                    None => json!({
                        "ts": Utc::now().to_rfc3339(),
                        "dir": "poll",
                        "status": status,
                        "full": true,
                        "body": body,
                    }),
                    Some(previous) => {
                        let mut changes = Vec::new();
                        collect_changes(&previous, body, "", &mut changes);
                        json!({
                            "ts": Utc::now().to_rfc3339(),
                            "dir": "poll",
                            "status": status,
                            "changes": changes,
                        })
                    }
                };
                self.write_line(&entry);
                self.previous = Some(body.clone());
            }
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}

/// Leaf-level differences between two JSON documents, as dotted/indexed
/// paths. Missing previous branches show up as one change for the whole
/// new subtree.
fn collect_changes(previous: &Value, current: &Value, prefix: &str, out: &mut Vec<Value>) {
    match (previous, current) {
        (Value::Object(prev), Value::Object(curr)) => {
            for (key, value) in curr {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_changes(prev.get(key).unwrap_or(&Value::Null), value, &path, out);
            }
        }
        (Value::Array(prev), Value::Array(curr)) => {
            for (idx, value) in curr.iter().enumerate() {
                let path = format!("{prefix}[{idx}]");
                collect_changes(prev.get(idx).unwrap_or(&Value::Null), value, &path, out);
            }
        }
        (prev, curr) if prev != curr => {
            out.push(json!({"path": prefix, "old": prev, "new": curr}));
        }
        _ => {}
    }
}
