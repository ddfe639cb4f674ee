use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::records::Snapshot;
use crate::core::error::MonitorResult;

/// Read a snapshot file. A missing or corrupt file is treated as "no prior snapshot".
pub async fn load<S: Snapshot>(path: &Path) -> S {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No snapshot at {}, starting empty", path.display());
            return S::default();
        }
        Err(e) => {
            tracing::warn!("Failed to read snapshot {}: {}", path.display(), e);
            return S::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(
                "⚠️  Snapshot {} is unparsable ({}), treating as empty",
                path.display(),
                e
            );
            S::default()
        }
    }
}

/// Write a snapshot as pretty JSON via a sibling temp file and a rename.
pub async fn save<S: Snapshot>(path: &Path, snapshot: &S) -> MonitorResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    let tmp = temp_path(path);

    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(json.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.sync_all().await?;
    drop(file);

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    tracing::debug!(
        "💾 Saved {} records to {}",
        snapshot.records().len(),
        path.display()
    );
    Ok(())
}

/// Create the data directory. Succeeds if it already exists.
pub async fn ensure_dir(dir: &Path) -> MonitorResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    path.with_file_name(name)
}
