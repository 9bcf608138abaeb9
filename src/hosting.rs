//! "Store bytes, return URL" uploaders.
//!
//! `StaticDriveHost` writes into `<STATIC_DRIVE_PATH>/images/` and hands out a URL
//! under `/static/images/`, which the API binary serves from the same directory.
use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Persist `bytes` on behalf of the caller at `origin` and return a public URL.
    async fn store(&self, origin: &str, bytes: Vec<u8>) -> AppResult<String>;

    /// Fail early when a later `store` for this `origin` could not produce a URL.
    fn check(&self, _origin: &str) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct StaticDriveHost {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl StaticDriveHost {
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        StaticDriveHost { root: root.into(), public_base_url }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    fn base_for(&self, origin: &str) -> AppResult<String> {
        let base = self
            .public_base_url
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .unwrap_or(origin)
            .trim()
            .trim_end_matches('/');
        if base.is_empty() {
            return Err(AppError::Upload("no PUBLIC_BASE_URL configured and caller origin is empty".to_string()));
        }
        Ok(base.to_string())
    }
}

#[async_trait]
impl ImageHost for StaticDriveHost {
    async fn store(&self, origin: &str, bytes: Vec<u8>) -> AppResult<String> {
        let base = self.base_for(origin)?;
        let ext = image::guess_format(&bytes)
            .ok()
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("jpg");
        let filename = format!("{}.{}", Uuid::new_v4(), ext);

        let dir = self.images_dir();
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(&filename);
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!("Stored {} ({} bytes)", path.display(), bytes.len());

        Ok(format!("{}/static/images/{}", base, filename))
    }

    fn check(&self, origin: &str) -> AppResult<()> {
        self.base_for(origin).map(|_| ())
    }
}
