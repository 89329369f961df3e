//! Task-scoped key/value context carrier.
//!
//! Each logical task gets its own independent context map, installed by
//! [`scope`] and destroyed when the scoped future completes (including
//! panic unwind). The trace id lives under the well-known key
//! [`TRACE_ID_KEY`]; arbitrary auxiliary keys may coexist.
//!
//! All operations here are pure local-task bookkeeping: they never block,
//! never fail, and are never visible to any other task. Outside a scope
//! every operation is a no-op (`get` returns `None`, `snapshot` returns the
//! empty snapshot).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;

use crate::trace::id::TraceId;

/// Well-known context key holding the current trace id.
pub const TRACE_ID_KEY: &str = "traceId";

tokio::task_local! {
    /// Per-task context slot. Installed only by [`scope`]; borrows are
    /// never held across an await point.
    static CONTEXT: RefCell<BTreeMap<String, String>>;
}

/// Immutable copy of a task's context map at a point in time.
///
/// Capturing a snapshot and then mutating the live context does not alter
/// the captured copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSnapshot {
    entries: BTreeMap<String, String>,
}

impl ContextSnapshot {
    /// Snapshot holding only a trace id under [`TRACE_ID_KEY`].
    pub fn with_trace_id(id: &TraceId) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(TRACE_ID_KEY.to_string(), id.as_str().to_string());
        Self { entries }
    }

    /// Value for `key`, if captured.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// The captured trace id, if any.
    pub fn trace_id(&self) -> Option<&str> {
        self.get(TRACE_ID_KEY)
    }

    /// True when nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of captured entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl FromIterator<(String, String)> for ContextSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Value associated with `key` in the calling task's context.
pub fn get(key: &str) -> Option<String> {
    CONTEXT
        .try_with(|ctx| ctx.borrow().get(key).cloned())
        .ok()
        .flatten()
}

/// Set `key` to `value` in the calling task's context only.
pub fn set(key: &str, value: &str) {
    let _ = CONTEXT.try_with(|ctx| {
        ctx.borrow_mut().insert(key.to_string(), value.to_string());
    });
}

/// Remove `key` from the calling task's context.
pub fn remove(key: &str) {
    let _ = CONTEXT.try_with(|ctx| {
        ctx.borrow_mut().remove(key);
    });
}

/// Empty the calling task's context.
pub fn clear() {
    let _ = CONTEXT.try_with(|ctx| {
        ctx.borrow_mut().clear();
    });
}

/// The calling task's current trace id, if one is installed.
pub fn trace_id() -> Option<String> {
    get(TRACE_ID_KEY)
}

/// Capture an immutable copy of the calling task's entire context.
pub fn snapshot() -> ContextSnapshot {
    CONTEXT
        .try_with(|ctx| ContextSnapshot {
            entries: ctx.borrow().clone(),
        })
        .unwrap_or_default()
}

/// Replace the calling task's entire context with the snapshot's contents.
/// The empty snapshot means "clear everything".
pub fn restore(snap: &ContextSnapshot) {
    let _ = CONTEXT.try_with(|ctx| {
        *ctx.borrow_mut() = snap.entries.clone();
    });
}

/// Run `future` with its own context slot, seeded from `snap`.
///
/// The slot is destroyed when the future completes, whether it resolves
/// normally or unwinds, so nothing can leak into whatever runs next on the
/// same worker. Nested scopes shadow the outer context and restore it on
/// exit.
pub async fn scope<F>(snap: ContextSnapshot, future: F) -> F::Output
where
    F: Future,
{
    CONTEXT.scope(RefCell::new(snap.entries), future).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_operations_outside_scope_are_noops() {
        set("traceId", "abc");
        assert_eq!(get("traceId"), None);
        assert!(snapshot().is_empty());
        clear();
        restore(&ContextSnapshot::with_trace_id(&TraceId::from("abc")));
        assert_eq!(trace_id(), None);
    }

    #[tokio::test]
    async fn test_set_and_get_inside_scope() {
        scope(ContextSnapshot::default(), async {
            set(TRACE_ID_KEY, "abc");
            set("userId", "42");
            assert_eq!(trace_id().as_deref(), Some("abc"));
            assert_eq!(get("userId").as_deref(), Some("42"));
            remove("userId");
            assert_eq!(get("userId"), None);
        })
        .await;
        // Slot is gone once the scope ends.
        assert_eq!(trace_id(), None);
    }

    #[tokio::test]
    async fn test_snapshot_is_immutable_copy() {
        scope(ContextSnapshot::default(), async {
            set(TRACE_ID_KEY, "abc");
            let snap = snapshot();
            set(TRACE_ID_KEY, "mutated");
            set("extra", "later");
            assert_eq!(snap.trace_id(), Some("abc"));
            assert_eq!(snap.len(), 1);
        })
        .await;
    }

    #[tokio::test]
    async fn test_restore_empty_snapshot_clears() {
        scope(ContextSnapshot::default(), async {
            set(TRACE_ID_KEY, "abc");
            set("userId", "42");
            restore(&ContextSnapshot::default());
            assert_eq!(trace_id(), None);
            assert_eq!(get("userId"), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_restore_replaces_whole_context() {
        scope(ContextSnapshot::default(), async {
            set("stale", "value");
            let snap = ContextSnapshot::from_iter([
                (TRACE_ID_KEY.to_string(), "xyz".to_string()),
                ("tenant".to_string(), "blue".to_string()),
            ]);
            restore(&snap);
            assert_eq!(trace_id().as_deref(), Some("xyz"));
            assert_eq!(get("tenant").as_deref(), Some("blue"));
            assert_eq!(get("stale"), None);
        })
        .await;
    }

    #[tokio::test]
    async fn test_nested_scopes_shadow_and_restore() {
        scope(ContextSnapshot::with_trace_id(&TraceId::from("outer")), async {
            assert_eq!(trace_id().as_deref(), Some("outer"));
            scope(ContextSnapshot::with_trace_id(&TraceId::from("inner")), async {
                assert_eq!(trace_id().as_deref(), Some("inner"));
            })
            .await;
            assert_eq!(trace_id().as_deref(), Some("outer"));
        })
        .await;
    }

    #[tokio::test]
    async fn test_concurrent_tasks_are_isolated() {
        let a = tokio::spawn(scope(ContextSnapshot::default(), async {
            set(TRACE_ID_KEY, "abc");
            for _ in 0..100 {
                tokio::task::yield_now().await;
                assert_eq!(trace_id().as_deref(), Some("abc"));
            }
        }));
        let b = tokio::spawn(scope(ContextSnapshot::default(), async {
            set(TRACE_ID_KEY, "xyz");
            for _ in 0..100 {
                tokio::task::yield_now().await;
                assert_eq!(trace_id().as_deref(), Some("xyz"));
            }
        }));
        a.await.unwrap();
        b.await.unwrap();
    }
}
