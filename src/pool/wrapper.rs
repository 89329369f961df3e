//! Wraps a unit of work so a captured context rides along to the worker.

use std::future::Future;

use tracing::Instrument;

use crate::trace::context::{self, ContextSnapshot, TRACE_ID_KEY};
use crate::trace::id::TraceId;

/// Wrap `task` so that, when it eventually runs (possibly much later, on a
/// reused pooled worker), `snapshot` is installed first and the slot is torn
/// down afterwards.
///
/// If the snapshot carries no trace id a fresh one is generated at execution
/// time, so every executed task has *some* trace id even when scheduled with
/// no ambient context. A `tracing` span carrying the id wraps the body, so
/// log lines emitted inside the task are correlated.
///
/// Teardown is structural: the context slot is dropped when the returned
/// future completes, normally or by unwind, so nothing leaks into the next
/// task run on the same worker. Panics from the body are never swallowed
/// here; they unwind to the caller after the slot is gone.
pub fn wrap<F>(snapshot: ContextSnapshot, task: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    context::scope(snapshot, async move {
        if context::trace_id().is_none() {
            context::set(TRACE_ID_KEY, TraceId::generate().as_str());
        }
        let trace_id = context::trace_id().unwrap_or_default();
        let span = tracing::info_span!("pooled_task", trace_id = %trace_id);
        task.instrument(span).await
    })
}
