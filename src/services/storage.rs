use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncRead;

/// Key/value blob store backing attachments and exports.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn save(&self, key: &str, data: &[u8]) -> Result<()>;
    async fn open_stream(&self, key: &str) -> Result<Box<dyn AsyncRead + Unpin + Send>>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn exists(&self, key: &str) -> Result<bool>;
}

pub struct LocalStorageService {
    root: PathBuf,
}

impl LocalStorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Keys are flat names; anything that could escape the root is refused.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let mut components = Path::new(key).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.root.join(name)),
            _ => Err(anyhow!("invalid storage key: {}", key)),
        }
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn save(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        tokio::fs::write(&path, data).await?;
        Ok(())
    }

    async fn open_stream(&self, key: &str) -> Result<Box<dyn AsyncRead + Unpin + Send>> {
        let path = self.resolve(key)?;
        let file = tokio::fs::File::open(&path).await?;
        Ok(Box::new(file))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        tokio::fs::remove_file(&path).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}
