//! List file retrieval

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::ListSource;
use crate::error::RefreshError;

/// Places every source's file in a destination directory.
///
/// Returned paths line up with `sources`: entry `i` is the file for
/// `sources[i]`.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn fetch(&self, dest: &Path, sources: &[ListSource]) -> Result<Vec<PathBuf>, RefreshError>;
}

/// HTTP downloader. Files already present in the destination are reused.
#[derive(Debug, Clone, Default)]
pub struct FileDownloader {
    client: reqwest::Client,
}

impl FileDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn download(&self, source: &ListSource, path: &Path) -> Result<(), RefreshError> {
        let wrap = |source_err: reqwest::Error| RefreshError::Download {
            name: source.file_name.clone(),
            url: source.url.clone(),
            source: source_err,
        };

        let body = self
            .client
            .get(&source.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(wrap)?
            .bytes()
            .await
            .map_err(wrap)?;

        tokio::fs::write(path, &body).await?;
        tracing::debug!(file = %source.file_name, bytes = body.len(), "downloaded list file");
        Ok(())
    }
}

#[async_trait]
impl Downloader for FileDownloader {
    async fn fetch(&self, dest: &Path, sources: &[ListSource]) -> Result<Vec<PathBuf>, RefreshError> {
        tokio::fs::create_dir_all(dest).await?;

        let mut paths = Vec::with_capacity(sources.len());
        for source in sources {
            let path = dest.join(&source.file_name);
            if tokio::fs::try_exists(&path).await? {
                tracing::debug!(file = %source.file_name, "using existing list file");
            } else {
                self.download(source, &path).await?;
            }
            paths.push(path);
        }
        Ok(paths)
    }
}
