//! Download manager for forecast plots.
//!
//! Streams the plot image behind a plot URL into the downloads directory and
//! reports progress back to the event loop over a channel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Download status for a plot URL
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadStatus {
    NotDownloaded,
    /// Fraction received, when the server sends a length.
    Downloading(Option<f32>),
    Downloaded(PathBuf),
    Failed(String),
}

/// Progress update from a download task
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    pub url: String,
    pub status: DownloadStatus,
}

pub struct DownloadManager {
    statuses: HashMap<String, DownloadStatus>,
    download_dir: PathBuf,
    http: reqwest::Client,
    progress_tx: mpsc::Sender<DownloadProgress>,
    progress_rx: mpsc::Receiver<DownloadProgress>,
}

impl DownloadManager {
    pub fn new(http: reqwest::Client, download_dir: PathBuf) -> Self {
        let (progress_tx, progress_rx) = mpsc::channel(100);
        Self {
            statuses: HashMap::new(),
            download_dir,
            http,
            progress_tx,
            progress_rx,
        }
    }

    /// Start downloading `url`. `model` only names the file.
    pub fn start_download(&mut self, url: &str, model: &str) -> Result<PathBuf, String> {
        if let Some(DownloadStatus::Downloading(_)) = self.statuses.get(url) {
            return Err("Already downloading".to_string());
        }

        let dest = self.download_dir.join(plot_file_name(model, Local::now()));
        info!("Starting plot download {} -> {:?}", url, dest);
        self.statuses
            .insert(url.to_string(), DownloadStatus::Downloading(None));

        let http = self.http.clone();
        let progress_tx = self.progress_tx.clone();
        let url = url.to_string();
        let task_dest = dest.clone();

        tokio::spawn(async move {
            let status = match do_download(&http, &url, &task_dest, &progress_tx).await {
                Ok(path) => {
                    info!("Plot saved: {:?}", path);
                    DownloadStatus::Downloaded(path)
                }
                Err(e) => {
                    error!("Plot download failed: {}", e);
                    DownloadStatus::Failed(e)
                }
            };
            let _ = progress_tx.send(DownloadProgress { url, status }).await;
        });

        Ok(dest)
    }

    /// Drain pending progress updates. Returns the ones that settled
    /// (downloaded or failed), oldest first.
    pub fn update_statuses(&mut self) -> Vec<DownloadProgress> {
        let mut settled = Vec::new();
        while let Ok(progress) = self.progress_rx.try_recv() {
            if matches!(
                progress.status,
                DownloadStatus::Downloaded(_) | DownloadStatus::Failed(_)
            ) {
                settled.push(progress.clone());
            }
            self.statuses.insert(progress.url, progress.status);
        }
        settled
    }

    pub fn get_status(&self, url: &str) -> DownloadStatus {
        self.statuses
            .get(url)
            .cloned()
            .unwrap_or(DownloadStatus::NotDownloaded)
    }
}

/// `forecast-<model>-<YYYYmmdd-HHMMSS>.png`, with the model name reduced to
/// filename-safe characters.
pub fn plot_file_name(model: &str, at: DateTime<Local>) -> String {
    let safe: String = model
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let safe = if safe.is_empty() { "plot".to_string() } else { safe };
    format!("forecast-{}-{}.png", safe, at.format("%Y%m%d-%H%M%S"))
}

async fn do_download(
    http: &reqwest::Client,
    url: &str,
    dest: &Path,
    progress_tx: &mpsc::Sender<DownloadProgress>,
) -> Result<PathBuf, String> {
    if let Some(dir) = dest.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| format!("Failed to create download directory: {}", e))?;
    }

    let resp = http.get(url).send().await.map_err(|e| e.to_string())?;
    let status = resp.status();
    if !status.is_success() {
        return Err(format!(
            "Error: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )
        .trim_end()
        .to_string());
    }
    let total = resp.content_length().filter(|n| *n > 0);

    let partial = dest.with_extension("png.part");
    let written = async {
        let mut file = tokio::fs::File::create(&partial)
            .await
            .map_err(|e| e.to_string())?;
        let mut received: u64 = 0;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            file.write_all(&chunk).await.map_err(|e| e.to_string())?;
            received += chunk.len() as u64;
            if let Some(total) = total {
                let _ = progress_tx.try_send(DownloadProgress {
                    url: url.to_string(),
                    status: DownloadStatus::Downloading(Some(received as f32 / total as f32)),
                });
            }
        }
        file.flush().await.map_err(|e| e.to_string())?;
        drop(file);

        tokio::fs::rename(&partial, dest)
            .await
            .map_err(|e| e.to_string())
    }
    .await;

    if let Err(e) = written {
        if let Err(rm) = tokio::fs::remove_file(&partial).await {
            warn!("could not remove {:?}: {}", partial, rm);
        }
        return Err(e);
    }
    Ok(dest.to_path_buf())
}
