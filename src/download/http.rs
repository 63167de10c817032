// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! HTTP download subsystem.
//!
//! Each accepted request gets a row in a shared table and a tokio task that
//! streams the response body into the target directory. Rows move
//! `Pending → Running → Succeeded | Failed`; observers are fired on every
//! status change and, while running, at most every
//! [`PROGRESS_NOTIFY_INTERVAL`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::subsystem::{ChangeCallback, DownloadSubsystem};
use super::types::{DownloadRequest, DownloadStatus, ObserverHandle, RequestId};
use crate::sync::{resilient_read, resilient_write};

/// Minimum spacing of progress notifications while bytes arrive.
pub const PROGRESS_NOTIFY_INTERVAL: Duration = Duration::from_millis(250);

/// Directory downloads land in when none is configured.
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .map(|d| d.join("loadapp"))
        .unwrap_or_else(|| PathBuf::from("downloads"))
}

#[derive(Debug)]
struct Row {
    status: DownloadStatus,
    bytes_downloaded: u64,
    bytes_total: Option<u64>,
    path: PathBuf,
    error: Option<String>,
    task: Option<JoinHandle<()>>,
}

/// Rows stay after a terminal status so `query` and `progress` keep
/// answering; only `remove` drops them.
#[derive(Default)]
struct Shared {
    rows: RwLock<HashMap<RequestId, Row>>,
    observers: RwLock<BTreeMap<u64, ChangeCallback>>,
    next_request: AtomicU64,
    next_observer: AtomicU64,
}

impl Shared {
    fn notify(&self) {
        let callbacks: Vec<ChangeCallback> = resilient_read(&self.observers).values().cloned().collect();
        for callback in callbacks {
            callback();
        }
    }

    /// Apply `update` to the row if it still exists. Returns false once the
    /// request was removed.
    fn update(&self, id: RequestId, update: impl FnOnce(&mut Row)) -> bool {
        match resilient_write(&self.rows).get_mut(&id) {
            Some(row) => {
                update(row);
                true
            }
            None => false,
        }
    }
}

/// Transfer snapshot of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    pub status: DownloadStatus,
    pub bytes_downloaded: u64,
    pub bytes_total: Option<u64>,
    pub path: PathBuf,
    pub error: Option<String>,
}

impl TransferProgress {
    /// Completion percentage, when the total size is known.
    pub fn percent(&self) -> Option<f64> {
        self.bytes_total.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.bytes_downloaded as f64 / total as f64) * 100.0
            }
        })
    }
}

pub struct HttpDownloadSubsystem {
    shared: Arc<Shared>,
    runtime: Handle,
    client: reqwest::Client,
    target_dir: PathBuf,
}

impl HttpDownloadSubsystem {
    /// Create a subsystem writing into `target_dir`. Must be called from
    /// within a tokio runtime; transfers are spawned onto it.
    pub fn new(target_dir: impl Into<PathBuf>) -> Result<Self> {
        let runtime = Handle::try_current()
            .context("HTTP download subsystem must be created inside a tokio runtime")?;
        let client = reqwest::Client::builder()
            .user_agent(concat!("loadapp/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        let shared = Shared {
            next_request: AtomicU64::new(1),
            next_observer: AtomicU64::new(1),
            ..Shared::default()
        };
        Ok(Self {
            shared: Arc::new(shared),
            runtime,
            client,
            target_dir: target_dir.into(),
        })
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Byte-level progress of a request.
    pub fn progress(&self, id: RequestId) -> Option<TransferProgress> {
        resilient_read(&self.shared.rows).get(&id).map(|row| TransferProgress {
            status: row.status,
            bytes_downloaded: row.bytes_downloaded,
            bytes_total: row.bytes_total,
            path: row.path.clone(),
            error: row.error.clone(),
        })
    }
}

impl DownloadSubsystem for HttpDownloadSubsystem {
    fn enqueue(&self, request: &DownloadRequest) -> Result<RequestId> {
        let url = reqwest::Url::parse(&request.url)
            .with_context(|| format!("Invalid download URL: {}", request.url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Unsupported URL scheme: {}", url.scheme());
        }

        let id = RequestId(self.shared.next_request.fetch_add(1, Ordering::SeqCst));
        let path = self
            .target_dir
            .join(format!("{}-{}", id, request.file_name()));
        tracing::debug!(
            request = %id,
            allow_metered = request.allow_metered,
            allow_roaming = request.allow_roaming,
            require_charging = request.require_charging,
            path = %path.display(),
            "Enqueueing download"
        );

        resilient_write(&self.shared.rows).insert(
            id,
            Row {
                status: DownloadStatus::Pending,
                bytes_downloaded: 0,
                bytes_total: None,
                path: path.clone(),
                error: None,
                task: None,
            },
        );

        let task = self.runtime.spawn(transfer(
            Arc::clone(&self.shared),
            self.client.clone(),
            id,
            url,
            path,
        ));
        if !self.shared.update(id, |row| row.task = Some(task)) {
            tracing::debug!(request = %id, "Request removed before its task was stored");
        }
        Ok(id)
    }

    fn query(&self, id: RequestId) -> Option<DownloadStatus> {
        resilient_read(&self.shared.rows).get(&id).map(|row| row.status)
    }

    fn remove(&self, id: RequestId) -> usize {
        let Some(row) = resilient_write(&self.shared.rows).remove(&id) else {
            return 0;
        };
        if let Some(task) = row.task {
            task.abort();
        }
        if !row.status.is_terminal() {
            // Partial file of an aborted transfer.
            if let Err(e) = std::fs::remove_file(&row.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(request = %id, error = %e, "Failed to delete partial download");
                }
            }
        }
        self.shared.notify();
        1
    }

    fn register_observer(&self, callback: ChangeCallback) -> ObserverHandle {
        let key = self.shared.next_observer.fetch_add(1, Ordering::SeqCst);
        resilient_write(&self.shared.observers).insert(key, callback);
        ObserverHandle(key)
    }

    fn unregister_observer(&self, handle: ObserverHandle) {
        resilient_write(&self.shared.observers).remove(&handle.0);
    }
}

async fn transfer(
    shared: Arc<Shared>,
    client: reqwest::Client,
    id: RequestId,
    url: reqwest::Url,
    path: PathBuf,
) {
    let result = stream_to_file(&shared, &client, id, url, &path).await;

    let status = match &result {
        Ok(()) => DownloadStatus::Succeeded,
        Err(e) => {
            tracing::warn!(request = %id, error = %e, "Download failed");
            if let Err(e) = tokio::fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(request = %id, error = %e, "Failed to delete partial download");
                }
            }
            DownloadStatus::Failed
        }
    };
    let error = result.err().map(|e| format!("{:#}", e));
    if shared.update(id, |row| {
        row.status = status;
        row.error = error;
    }) {
        shared.notify();
    }
}

async fn stream_to_file(
    shared: &Shared,
    client: &reqwest::Client,
    id: RequestId,
    url: reqwest::Url,
    path: &Path,
) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .context("Failed to connect")?
        .error_for_status()
        .context("Server refused the download")?;

    let total = response.content_length();
    if !shared.update(id, |row| {
        row.status = DownloadStatus::Running;
        row.bytes_total = total;
    }) {
        return Ok(());
    }
    shared.notify();

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create file: {:?}", path))?;

    let mut downloaded = 0u64;
    let mut last_notify = Instant::now();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.context("Connection interrupted")?;
        file.write_all(&chunk)
            .await
            .context("Failed to write download")?;
        downloaded += chunk.len() as u64;

        if !shared.update(id, |row| row.bytes_downloaded = downloaded) {
            return Ok(());
        }
        if last_notify.elapsed() >= PROGRESS_NOTIFY_INTERVAL {
            last_notify = Instant::now();
            shared.notify();
        }
    }

    file.flush().await.context("Failed to flush download")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response per connection.
    async fn serve(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/files/a.zip", addr)
    }

    /// Send headers for a 1000 byte body, then only `body` and hold the
    /// connection open.
    async fn serve_stalled(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let head = "HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\n";
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.write_all(body.as_bytes()).await;
                    let _ = socket.flush().await;
                    tokio::time::sleep(Duration::from_secs(30)).await;
                });
            }
        });
        format!("http://{}/files/partial.zip", addr)
    }

    async fn wait_terminal(subsystem: &HttpDownloadSubsystem, id: RequestId) -> DownloadStatus {
        for _ in 0..500 {
            if let Some(status) = subsystem.query(id) {
                if status.is_terminal() {
                    return status;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("download {} did not finish", id);
    }

    #[tokio::test]
    async fn test_rejects_invalid_urls() {
        let dir = TempDir::new().unwrap();
        let subsystem = HttpDownloadSubsystem::new(dir.path()).unwrap();
        assert!(subsystem.enqueue(&DownloadRequest::new("not a url", "t")).is_err());
        assert!(subsystem
            .enqueue(&DownloadRequest::new("ftp://example.com/a.zip", "t"))
            .is_err());
        assert_eq!(subsystem.remove(RequestId(42)), 0);
    }

    #[tokio::test]
    async fn test_successful_transfer() {
        let url = serve("HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello").await;
        let dir = TempDir::new().unwrap();
        let subsystem = HttpDownloadSubsystem::new(dir.path()).unwrap();

        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        subsystem.register_observer(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let id = subsystem.enqueue(&DownloadRequest::new(url, "t")).unwrap();
        assert_eq!(wait_terminal(&subsystem, id).await, DownloadStatus::Succeeded);

        let progress = subsystem.progress(id).unwrap();
        assert_eq!(progress.bytes_downloaded, 5);
        assert_eq!(progress.percent(), Some(100.0));
        assert_eq!(std::fs::read_to_string(&progress.path).unwrap(), "hello");
        assert!(progress.path.ends_with(format!("{}-a.zip", id)));
        assert!(notified.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_http_error_fails() {
        let url = serve("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let dir = TempDir::new().unwrap();
        let subsystem = HttpDownloadSubsystem::new(dir.path()).unwrap();

        let id = subsystem.enqueue(&DownloadRequest::new(url, "t")).unwrap();
        assert_eq!(wait_terminal(&subsystem, id).await, DownloadStatus::Failed);
        let progress = subsystem.progress(id).unwrap();
        assert!(progress.error.is_some());
        assert!(!progress.path.exists());
    }

    #[tokio::test]
    async fn test_remove_drops_row() {
        let url = serve("HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello").await;
        let dir = TempDir::new().unwrap();
        let subsystem = HttpDownloadSubsystem::new(dir.path()).unwrap();

        let id = subsystem.enqueue(&DownloadRequest::new(url, "t")).unwrap();
        assert_eq!(subsystem.remove(id), 1);
        assert_eq!(subsystem.query(id), None);
        assert_eq!(subsystem.remove(id), 0);
    }

    #[tokio::test]
    async fn test_remove_aborts_running_transfer() {
        let url = serve_stalled("hello").await;
        let dir = TempDir::new().unwrap();
        let subsystem = HttpDownloadSubsystem::new(dir.path()).unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        subsystem.register_observer(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let id = subsystem.enqueue(&DownloadRequest::new(url, "t")).unwrap();
        let mut path = None;
        for _ in 0..500 {
            match subsystem.progress(id) {
                Some(p) if p.bytes_downloaded > 0 => {
                    path = Some(p.path);
                    break;
                }
                _ => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        }
        let path = path.expect("transfer never received bytes");
        assert_eq!(subsystem.query(id), Some(DownloadStatus::Running));
        assert!(path.exists());

        assert_eq!(subsystem.remove(id), 1);
        let after_remove = hits.load(Ordering::SeqCst);
        assert_eq!(subsystem.query(id), None);
        assert!(!path.exists());

        // Longer than the progress interval: an aborted task stays silent.
        tokio::time::sleep(PROGRESS_NOTIFY_INTERVAL * 2).await;
        assert_eq!(hits.load(Ordering::SeqCst), after_remove);
        assert!(!path.exists());
    }
}
