//! Evidence attachments
//!
//! Timing lines, failure messages and screenshots are handed to an
//! [`EvidenceSink`]. The sink decides where they go; the timing core never
//! looks at them again.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const MIME_TEXT: &str = "text/plain";
pub const MIME_PNG: &str = "image/png";
pub const MIME_JSON: &str = "application/json";

/// Destination for report attachments
pub trait EvidenceSink: Send + Sync {
    fn attach_bytes(&self, name: &str, mime: &str, bytes: &[u8]) -> Result<()>;

    fn attach_text(&self, name: &str, body: &str) -> Result<()> {
        self.attach_bytes(name, MIME_TEXT, body.as_bytes())
    }
}

/// Attach `"→ msg"` lines under one title
pub fn attach_lines(sink: &dyn EvidenceSink, title: &str, messages: &[String]) -> Result<()> {
    let mut body = String::new();
    for message in messages {
        body.push_str("→ ");
        body.push_str(message);
        body.push('\n');
    }
    sink.attach_text(title, &body)
}

/// Attach, logging instead of failing. Evidence must never mask the real
/// test result.
pub fn attach_or_warn(sink: &dyn EvidenceSink, name: &str, body: &str) {
    if let Err(e) = sink.attach_text(name, body) {
        warn!("Failed to attach '{}': {}", name, e);
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EvidenceSink for NoopSink {
    fn attach_bytes(&self, _name: &str, _mime: &str, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }
}

/// A recorded attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Body as text, for text attachments
    pub fn text(&self) -> Option<&str> {
        if self.mime.starts_with("text/") || self.mime == MIME_JSON {
            std::str::from_utf8(&self.bytes).ok()
        } else {
            None
        }
    }
}

/// Keeps attachments in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    attachments: Mutex<Vec<Attachment>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachments.lock().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.attachments
            .lock()
            .iter()
            .map(|a| a.name.clone())
            .collect()
    }

    /// Text of the most recent attachment called `name`
    pub fn text_of(&self, name: &str) -> Option<String> {
        self.attachments
            .lock()
            .iter()
            .rev()
            .find(|a| a.name == name)
            .and_then(|a| a.text().map(str::to_string))
    }

    /// Take everything recorded so far
    pub fn drain(&self) -> Vec<Attachment> {
        std::mem::take(&mut *self.attachments.lock())
    }
}

impl EvidenceSink for MemorySink {
    fn attach_bytes(&self, name: &str, mime: &str, bytes: &[u8]) -> Result<()> {
        self.attachments.lock().push(Attachment {
            name: name.to_string(),
            mime: mime.to_string(),
            bytes: bytes.to_vec(),
        });
        Ok(())
    }
}

/// Writes each attachment to `<dir>/<name>_<YYYYmmdd_HHMMSS>.<ext>`
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    // Serialises name selection so same-second attachments do not collide
    lock: Mutex<()>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remove every file in the directory (once-per-run cleanup)
    pub fn clear(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn target_path(&self, name: &str, mime: &str) -> PathBuf {
        let stem = format!(
            "{}_{}",
            sanitize_name(name),
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );
        let ext = extension_for(mime);

        let mut path = self.dir.join(format!("{}.{}", stem, ext));
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("{}_{}.{}", stem, n, ext));
            n += 1;
        }
        path
    }
}

impl EvidenceSink for DirectorySink {
    fn attach_bytes(&self, name: &str, mime: &str, bytes: &[u8]) -> Result<()> {
        let _guard = self.lock.lock();
        let path = self.target_path(name, mime);
        std::fs::write(&path, bytes)
            .map_err(|e| Error::Evidence(format!("{}: {}", path.display(), e)))?;
        debug!("Attachment '{}' written to {}", name, path.display());
        Ok(())
    }
}

/// Whitespace to `_`, path-hostile characters dropped
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_underscore = false;
    for c in name.trim().chars() {
        if c.is_whitespace() {
            if !last_underscore {
                out.push('_');
            }
            last_underscore = true;
        } else if c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '(' | ')') {
            out.push(c);
            last_underscore = c == '_';
        }
    }
    if out.is_empty() {
        out.push_str("attachment");
    }
    out
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        MIME_PNG => "png",
        MIME_JSON => "json",
        m if m.starts_with("text/") => "txt",
        _ => "bin",
    }
}
