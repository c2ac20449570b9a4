//! Wire-level diagnostic log.
//!
//! Every lookup that reaches the network produces an [`Exchange`]. With debug
//! logging enabled the client stamps it into a [`DebugEntry`] and appends the
//! rendered block to a plain text file that is never rotated or truncated.

use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;

const EOL: &str = "\n";

/// Raw request and response of one remote call.
///
/// Response parts stay empty when the call failed before an answer arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exchange {
    pub request_line: String,
    pub request_headers: String,
    pub request_body: String,
    pub response_status_line: String,
    pub response_headers: String,
    pub response_body: String,
}

impl Exchange {
    /// Request line followed by one `name: value` line per header.
    pub fn request_head(&self) -> String {
        join_head(&self.request_line, &self.request_headers)
    }

    /// Status line followed by one `name: value` line per header.
    pub fn response_head(&self) -> String {
        join_head(&self.response_status_line, &self.response_headers)
    }
}

fn join_head(first_line: &str, headers: &str) -> String {
    match (first_line.is_empty(), headers.is_empty()) {
        (true, _) => headers.to_string(),
        (false, true) => first_line.to_string(),
        (false, false) => format!("{}{}{}", first_line, EOL, headers),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugEntry {
    pub timestamp: DateTime<Local>,
    pub exchange: Exchange,
}

impl DebugEntry {
    pub fn new(exchange: Exchange) -> Self {
        Self {
            timestamp: Local::now(),
            exchange,
        }
    }

    /// Renders the human-readable block appended to the log file.
    pub fn render(&self) -> String {
        let mut block = String::new();

        block.push_str(&format!(
            "Date: {}{}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            EOL
        ));
        push_section(
            &mut block,
            "Last Request: ",
            "=============",
            &self.exchange.request_body,
        );
        push_section(
            &mut block,
            "Last Request Headers: ",
            "=====================",
            &self.exchange.request_head(),
        );
        push_section(
            &mut block,
            "Last Response: ",
            "=====================",
            &self.exchange.response_body,
        );
        push_section(
            &mut block,
            "Last Response Headers: ",
            "=====================",
            &self.exchange.response_head(),
        );

        block
    }
}

fn push_section(block: &mut String, title: &str, rule: &str, content: &str) {
    block.push_str(title);
    block.push_str(EOL);
    block.push_str(rule);
    block.push_str(EOL);
    block.push_str(content);
    block.push_str(EOL);
    block.push_str(EOL);
}

type FileLocks = std::sync::Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

/// One lock per log file for the whole process.
fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<FileLocks> = OnceLock::new();

    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    locks.entry(key).or_default().clone()
}

/// Appends debug entries to a single file.
///
/// Every logger in the process that targets the same path shares one lock,
/// so concurrent lookups never lose each other's entries, even across
/// separately constructed clients. Separate processes writing the same file
/// are not coordinated.
#[derive(Debug, Clone)]
pub struct DebugLogger {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl DebugLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock = lock_for(&path);
        Self { path, lock }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current log, appends the rendered entry and writes it back.
    ///
    /// A missing file is treated as empty. Existing bytes are preserved as-is.
    pub async fn append(&self, entry: &DebugEntry) -> std::io::Result<()> {
        let _guard = self.lock.lock().await;

        let mut log = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e),
        };
        log.extend_from_slice(entry.render().as_bytes());

        tokio::fs::write(&self.path, log).await?;
        tracing::debug!("Appended wire debug entry to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_exchange() -> Exchange {
        Exchange {
            request_line: "POST https://example.com/ws".to_string(),
            request_headers: "content-type: text/xml; charset=utf-8".to_string(),
            request_body: "<request/>".to_string(),
            response_status_line: "HTTP/1.1 200 OK".to_string(),
            response_headers: "content-length: 11".to_string(),
            response_body: "<response/>".to_string(),
        }
    }

    fn temp_log() -> PathBuf {
        std::env::temp_dir().join(format!("subscription-debug-{}.log", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_render_block_layout() {
        let entry = DebugEntry {
            timestamp: Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap(),
            exchange: sample_exchange(),
        };

        let expected = "Date: 2024-03-05 14:07:09\n\
Last Request: \n\
=============\n\
<request/>\n\
\n\
Last Request Headers: \n\
=====================\n\
POST https://example.com/ws\n\
content-type: text/xml; charset=utf-8\n\
\n\
Last Response: \n\
=====================\n\
<response/>\n\
\n\
Last Response Headers: \n\
=====================\n\
HTTP/1.1 200 OK\n\
content-length: 11\n\
\n";

        assert_eq!(entry.render(), expected);
    }

    #[test]
    fn test_render_without_response() {
        let exchange = Exchange {
            response_status_line: String::new(),
            response_headers: String::new(),
            response_body: String::new(),
            ..sample_exchange()
        };
        let rendered = DebugEntry::new(exchange).render();
        assert!(rendered.ends_with("Last Response Headers: \n=====================\n\n\n"));
    }

    #[tokio::test]
    async fn test_append_creates_file_and_preserves_prefix() {
        let path = temp_log();
        let logger = DebugLogger::new(&path);

        logger
            .append(&DebugEntry::new(sample_exchange()))
            .await
            .unwrap();
        let first = tokio::fs::read(&path).await.unwrap();

        logger
            .append(&DebugEntry::new(sample_exchange()))
            .await
            .unwrap();
        let second = tokio::fs::read(&path).await.unwrap();

        assert!(second.len() > first.len());
        assert_eq!(&second[..first.len()], first.as_slice());

        let text = String::from_utf8(second).unwrap();
        assert_eq!(text.matches("Date: ").count(), 2);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let path = temp_log();
        let logger = DebugLogger::new(&path);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let logger = logger.clone();
            handles.push(tokio::spawn(async move {
                logger
                    .append(&DebugEntry::new(sample_exchange()))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(text.matches("Date: ").count(), 8);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_loggers_for_same_path_share_a_lock() {
        let path = temp_log();

        let mut handles = Vec::new();
        for _ in 0..8 {
            // A fresh logger per task, as two independently built clients would have.
            let logger = DebugLogger::new(&path);
            handles.push(tokio::spawn(async move {
                logger
                    .append(&DebugEntry::new(sample_exchange()))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(text.matches("Date: ").count(), 8);
        assert!(Arc::ptr_eq(
            &DebugLogger::new(&path).lock,
            &DebugLogger::new(&path).lock
        ));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_append_into_missing_directory_fails() {
        let path = std::env::temp_dir()
            .join(uuid::Uuid::new_v4().to_string())
            .join("debug.log");
        let logger = DebugLogger::new(path);
        assert!(logger
            .append(&DebugEntry::new(sample_exchange()))
            .await
            .is_err());
    }
}
