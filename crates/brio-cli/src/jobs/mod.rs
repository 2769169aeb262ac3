//! Per-target worker fan-out.
//!
//! One tokio task runs per target directory and reports through its own
//! oneshot channel. The aggregator waits for every worker, surfaces the
//! first error and never cancels siblings that are still running.

use std::future::Future;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use brio_core::error::{BrioError, BrioResult};
use brio_resolver::{Target, TargetLink, TargetSet};

/// File written into each target directory
pub const TARGET_FILE: &str = "target.json";

/// File holding the whole target graph, written next to the target directories
pub const GRAPH_FILE: &str = "targets.json";

/// Run `work` once per item, each in its own task, and wait for all of them.
///
/// Results come back in item order. The first failing worker (in item order)
/// decides the error; later failures are only logged.
pub async fn fan_out<I, F, Fut, T>(items: I, work: F) -> BrioResult<Vec<T>>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = BrioResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let receivers: Vec<oneshot::Receiver<BrioResult<T>>> = items
        .into_iter()
        .map(|item| {
            let (tx, rx) = oneshot::channel();
            let job = work(item);
            tokio::spawn(async move {
                // The aggregator holds every receiver until it has heard back
                let _ = tx.send(job.await);
            });
            rx
        })
        .collect();

    debug!("Waiting for {} workers", receivers.len());
    let mut first_error = None;
    let mut results = Vec::with_capacity(receivers.len());
    for rx in receivers {
        let outcome = rx.await.unwrap_or_else(|_| {
            Err(BrioError::io(
                "Worker stopped before reporting".to_string(),
                io::Error::new(io::ErrorKind::Other, "worker task panicked"),
            ))
        });
        match outcome {
            Ok(value) => results.push(value),
            Err(e) if first_error.is_none() => first_error = Some(e),
            Err(e) => warn!("Additional worker failure: {}", e),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

#[derive(Serialize)]
struct TargetDocument<'a> {
    target: &'a Target,
    /// Links going out of this target
    links: Vec<&'a TargetLink>,
}

fn serialization_error(name: &str, e: serde_json::Error) -> BrioError {
    BrioError::io(format!("Failed to serialize target {}", name), e.into())
}

/// Write the graph to `dir/targets.json` and each target to
/// `dir/<target>/target.json`. Returns the target directories written.
pub async fn emit_targets(targets: &TargetSet, dir: &Utf8Path) -> BrioResult<Vec<Utf8PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| BrioError::io(format!("Failed to create {}", dir), e))?;
    let graph = dir.join(GRAPH_FILE);
    tokio::fs::write(&graph, targets.to_json()?)
        .await
        .map_err(|e| BrioError::io(format!("Failed to write {}", graph), e))?;

    let documents = targets
        .iter()
        .map(|target| {
            let document = TargetDocument {
                target,
                links: targets.links().iter().filter(|link| link.from == target.name).collect(),
            };
            serde_json::to_string_pretty(&document)
                .map(|json| (dir.join(&target.name), json))
                .map_err(|e| serialization_error(&target.name, e))
        })
        .collect::<BrioResult<Vec<_>>>()?;

    fan_out(documents, |(target_dir, json)| async move {
        tokio::fs::create_dir_all(&target_dir)
            .await
            .map_err(|e| BrioError::io(format!("Failed to create {}", target_dir), e))?;
        let path = target_dir.join(TARGET_FILE);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| BrioError::io(format!("Failed to write {}", path), e))?;
        debug!("Wrote {}", path);
        Ok(target_dir)
    })
    .await
}
