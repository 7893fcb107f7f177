use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::engine::Engine;

const COMPACT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Background task that compacts the WAL once `threshold` appends have piled up.
/// Returns when the engine is closed.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    run_compactor_every(engine, threshold, COMPACT_CHECK_INTERVAL).await
}

pub(crate) async fn run_compactor_every(engine: Arc<Engine>, threshold: u64, period: Duration) {
    if !engine.is_durable() {
        return;
    }
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        if engine.is_closed() {
            return;
        }
        if compact_if_due(&engine, threshold).await {
            info!("compacted WAL");
        }
    }
}

/// One compaction check. Returns true if the WAL was rewritten.
pub(crate) async fn compact_if_due(engine: &Engine, threshold: u64) -> bool {
    let appends = engine.wal_appends_since_compact().await;
    if appends < threshold {
        return false;
    }
    match engine.compact_wal().await {
        Ok(()) => {
            metrics::counter!(crate::observability::WAL_COMPACTIONS_TOTAL, "status" => "ok")
                .increment(1);
            true
        }
        Err(e) => {
            metrics::counter!(crate::observability::WAL_COMPACTIONS_TOTAL, "status" => "error")
                .increment(1);
            warn!("WAL compaction after {appends} appends failed: {e}");
            false
        }
    }
}
