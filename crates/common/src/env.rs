//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::warn;

/// Ensure the data and QR image directories exist.
///
/// A missing data directory is created; a QR directory that cannot be created
/// is fatal since QR issuance writes PNGs into it.
pub async fn ensure_env(data_dir: &str, qr_dir: &str) -> anyhow::Result<()> {
    if tokio::fs::metadata(data_dir).await.is_err() {
        warn!(%data_dir, "data directory not found; creating it");
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    tokio::fs::create_dir_all(qr_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {qr_dir}: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ensure_env;

    #[tokio::test]
    async fn creates_nested_directories() -> anyhow::Result<()> {
        let root = std::env::temp_dir().join(format!("shelfup-env-{}", std::process::id()));
        let data = root.join("data");
        let qr = root.join("data/qrcodes");
        ensure_env(data.to_str().unwrap(), qr.to_str().unwrap()).await?;
        assert!(tokio::fs::metadata(&qr).await?.is_dir());
        tokio::fs::remove_dir_all(&root).await?;
        Ok(())
    }
}
