//! AI feature flags persisted in a local JSON file.
//!
//! The flags deliberately live outside the database so they survive a broken
//! schema and can be toggled even when the DB is down.

use tokio::fs;

use crate::{dto::ai::AiFlags, error::AppResult};

pub async fn load_flags(path: &str) -> AiFlags {
    match fs::read_to_string(path).await {
        Ok(raw) => match serde_json::from_str(&raw) {
            Ok(flags) => flags,
            Err(err) => {
                tracing::warn!(error = %err, path, "malformed flags file, using defaults");
                AiFlags::default()
            }
        },
        Err(_) => AiFlags::default(),
    }
}

pub async fn save_flags(path: &str, flags: &AiFlags) -> AppResult<()> {
    let raw = serde_json::to_string_pretty(flags)
        .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e)))?;
    // Write through a temp file so a crash mid-write cannot truncate the store.
    let tmp = format!("{path}.tmp");
    fs::write(&tmp, raw)
        .await
        .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e)))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| crate::error::AppError::Internal(anyhow::anyhow!(e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_through_the_file() {
        let path = std::env::temp_dir().join(format!("flags-{}.json", uuid::Uuid::new_v4()));
        let path = path.to_string_lossy().to_string();

        let flags = AiFlags {
            product_copy: false,
            faq: true,
            fraud_check: true,
        };
        save_flags(&path, &flags).await.unwrap();
        let loaded = load_flags(&path).await;
        assert!(!loaded.product_copy);
        assert!(loaded.faq);
        assert!(loaded.fraud_check);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let loaded = load_flags("/definitely/not/a/real/path.json").await;
        assert!(loaded.product_copy);
        assert!(!loaded.fraud_check);
    }
}
