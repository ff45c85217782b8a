//! Worker pool: pulls crates off the courier queue and dispatches them.
//!
//! Workers run in parallel and pull one envelope at a time; ordering only
//! exists *within* a parcel (envelope N+1 is reachable only through N's
//! completion re-send). A rejected dispatch is logged and dropped here;
//! retry/backoff for rejections belongs to the host's job infrastructure.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::dispatcher::MessageDispatcher;
use crate::ports::courier::CrateQueue;

/// Worker group handle.
/// - `request_shutdown()` stops taking new deliveries
/// - `shutdown_and_join()` additionally waits for in-flight handlers
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` workers.
    pub fn spawn(
        n: usize,
        queue: Arc<dyn CrateQueue>,
        dispatcher: Arc<MessageDispatcher>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let q = Arc::clone(&queue);
            let d = Arc::clone(&dispatcher);
            let mut rx = shutdown_rx.clone();

            let join = tokio::spawn(async move {
                worker_loop(worker_id, q, d, &mut rx).await;
            });
            joins.push(join);
        }

        Self { shutdown_tx, joins }
    }

    /// Request shutdown for all workers. In-flight handler execution is not
    /// cancelled; workers just stop taking new deliveries.
    pub fn request_shutdown(&self) {
        // ignore send error: receivers may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for all workers.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for join in self.joins {
            let _ = join.await;
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<dyn CrateQueue>,
    dispatcher: Arc<MessageDispatcher>,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        // next_delivery は待つ可能性があるので select で shutdown と競合させる
        let crated = tokio::select! {
            _ = shutdown_rx.changed() => {
                continue;
            }
            crated = queue.next_delivery() => crated,
        };

        let Some(crated) = crated else {
            // queue shut down and drained
            break;
        };

        let label = crated.label.clone().unwrap_or_default();
        debug!(worker_id, code = %crated.tracking_code, "worker picked up crate");
        if let Err(err) = dispatcher
            .dispatch(&label, crated.tracking_code, crated.parcel)
            .await
        {
            warn!(worker_id, error = %err, "dispatch rejected; host scheduler owns retry");
        }
    }
}
