use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use kernel::{device::FrameSource, model::detection::Frame};
use shared::error::{AppError, AppResult};
use tokio::time::{interval, Interval, MissedTickBehavior};

/// Polls a camera snapshot endpoint at a fixed rate. Ticks missed while a
/// frame is still being processed are skipped, so frames are dropped rather
/// than queued.
pub struct HttpSnapshotSource {
    client: reqwest::Client,
    url: String,
    ticker: Interval,
    sequence: u64,
}

impl HttpSnapshotSource {
    pub fn new(url: impl Into<String>, every: Duration, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::UpstreamUnavailable(format!("camera client: {e}")))?;
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Ok(Self {
            client,
            url: url.into(),
            ticker,
            sequence: 0,
        })
    }
}

#[async_trait]
impl FrameSource for HttpSnapshotSource {
    async fn next_frame(&mut self) -> AppResult<Option<Frame>> {
        self.ticker.tick().await;
        self.sequence += 1;

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("camera: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "camera answered HTTP {status}"
            )));
        }
        let jpeg = response
            .bytes()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("camera body: {e}")))?;

        Ok(Some(Frame {
            sequence: self.sequence,
            captured_at: Utc::now(),
            jpeg: jpeg.to_vec(),
        }))
    }
}

/// Replays the `.jpg` files of a directory in name order, then ends.
pub struct DirectoryReplaySource {
    files: std::vec::IntoIter<PathBuf>,
    ticker: Interval,
    sequence: u64,
}

impl DirectoryReplaySource {
    pub async fn open(dir: impl Into<PathBuf>, every: Duration) -> AppResult<Self> {
        let dir = dir.into();
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("replay directory {}: {e}", dir.display()))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))?
        {
            let path = entry.path();
            let is_jpeg = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"));
            if is_jpeg {
                files.push(path);
            }
        }
        files.sort();
        tracing::info!(dir = %dir.display(), frames = files.len(), "Replaying frames from directory");

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Ok(Self {
            files: files.into_iter(),
            ticker,
            sequence: 0,
        })
    }
}

#[async_trait]
impl FrameSource for DirectoryReplaySource {
    async fn next_frame(&mut self) -> AppResult<Option<Frame>> {
        let Some(path) = self.files.next() else {
            return Ok(None);
        };
        self.ticker.tick().await;
        self.sequence += 1;

        let jpeg = tokio::fs::read(&path).await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("frame {}: {e}", path.display()))
        })?;
        Ok(Some(Frame {
            sequence: self.sequence,
            captured_at: Utc::now(),
            jpeg,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replay_yields_jpeg_files_in_name_order_then_ends() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("replay-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join("002.jpg"), b"second").await?;
        tokio::fs::write(dir.join("001.JPG"), b"first").await?;
        tokio::fs::write(dir.join("notes.txt"), b"skip").await?;

        let mut source = DirectoryReplaySource::open(&dir, Duration::from_millis(1)).await?;
        let first = source.next_frame().await?.unwrap();
        let second = source.next_frame().await?.unwrap();
        assert_eq!(first.jpeg, b"first");
        assert_eq!(second.jpeg, b"second");
        assert_eq!(second.sequence, 2);
        assert!(source.next_frame().await?.is_none());

        tokio::fs::remove_dir_all(&dir).await?;
        Ok(())
    }
}
