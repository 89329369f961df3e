//! Server-side interceptor: adopt or mint the trace id for each request.
//!
//! Runs before the application handler. The id comes from the `x-trace-id`
//! request header when present; a missing or malformed header is not an
//! error, a fresh id is generated instead. The handler runs inside a
//! context scope holding the id, and the scope is torn down when the
//! request future completes (success, error, or unwind), so nothing
//! leaks into the next request served by a reused worker.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use axum::http::{HeaderValue, Request, Response};
use tower::{Layer, Service};
use tracing::Instrument;

use crate::http::TRACE_ID_HEADER;
use crate::trace::context::{self, ContextSnapshot};
use crate::trace::id::TraceId;

/// Installs [`TraceScope`] around a service.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceScopeLayer;

impl<S> Layer<S> for TraceScopeLayer {
    type Service = TraceScope<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceScope { inner }
    }
}

/// Service wrapper that scopes every request to a trace context.
#[derive(Debug, Clone)]
pub struct TraceScope<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for TraceScope<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let trace_id = req
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(TraceId::from)
            .unwrap_or_else(TraceId::generate);

        // Swap in a clone so the ready service handles this request.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let span = tracing::info_span!("request", trace_id = %trace_id);
            let snapshot = ContextSnapshot::with_trace_id(&trace_id);
            let mut response =
                context::scope(snapshot, inner.call(req).instrument(span)).await?;
            // Echo the id so callers can correlate without reading logs.
            if let Ok(value) = HeaderValue::from_str(trace_id.as_str()) {
                response.headers_mut().insert(TRACE_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}
