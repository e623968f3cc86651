use crate::services::storage::LocalStorageService;
use std::sync::Arc;
use tracing::info;

/// Ensure the directory exists and wrap it in a storage backend.
pub async fn setup_storage(dir: &str) -> anyhow::Result<Arc<LocalStorageService>> {
    tokio::fs::create_dir_all(dir).await?;
    info!("🗄️  Storage directory ready: {}", dir);
    Ok(Arc::new(LocalStorageService::new(dir)))
}
