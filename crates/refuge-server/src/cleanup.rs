use std::time::Duration;

use tracing::{info, warn};

use refuge_api::AppState;
use refuge_api::storage::PUBLIC_PREFIX;

/// Grace period before an unreferenced upload file counts as orphaned.
/// Covers the window between storing a file and inserting its report row.
const ORPHAN_GRACE: Duration = Duration::from_secs(3600);

/// Background task that prunes orphaned upload files.
///
/// Runs on an interval, finds stored files no report references that are
/// older than the grace period, and deletes them from disk.
pub async fn run_cleanup_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match sweep_orphans(&state).await {
            Ok(count) => {
                if count > 0 {
                    info!("Cleanup: removed {} orphaned upload files", count);
                }
            }
            Err(e) => {
                warn!("Cleanup error: {}", e);
            }
        }
    }
}

async fn sweep_orphans(state: &AppState) -> anyhow::Result<usize> {
    let names = state.storage.list_files().await?;

    let mut removed = 0;
    for name in names {
        let public_path = format!("{PUBLIC_PREFIX}{name}");
        if state.db.report_references_image(&public_path)? {
            continue;
        }

        // A file may vanish mid-sweep; skip rather than abort.
        let Ok(meta) = tokio::fs::metadata(state.storage.dir().join(&name)).await else {
            continue;
        };
        let age = meta
            .modified()
            .ok()
            .and_then(|m| m.elapsed().ok())
            .unwrap_or_default();
        if age < ORPHAN_GRACE {
            continue;
        }

        if state.storage.delete_image(&public_path).await.is_ok() {
            removed += 1;
        }
    }

    Ok(removed)
}
