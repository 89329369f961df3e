//! Client-side interceptor: serialize the current trace id onto requests.
//!
//! Pure request mutation right before dispatch: if a trace id is current on
//! the calling task it is written to the `x-trace-id` header; otherwise the
//! request goes out unmodified. Never fails: an id that is not a valid
//! header value is skipped and the request is still sent.

use std::task::{Context as TaskContext, Poll};

use axum::http::{HeaderMap, HeaderValue, Request};
use tower::{Layer, Service};

use crate::http::TRACE_ID_HEADER;
use crate::trace::context;

/// Write the calling task's trace id into `headers`, if one is current.
pub fn inject_trace_id(headers: &mut HeaderMap) {
    if let Some(id) = context::trace_id() {
        if let Ok(value) = HeaderValue::from_str(&id) {
            headers.insert(TRACE_ID_HEADER, value);
        }
    }
}

/// Installs [`PropagateTrace`] around a client service.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropagateTraceLayer;

impl<S> Layer<S> for PropagateTraceLayer {
    type Service = PropagateTrace<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PropagateTrace::new(inner)
    }
}

/// Client middleware that stamps outgoing requests with the trace id.
#[derive(Debug, Clone)]
pub struct PropagateTrace<S> {
    inner: S,
}

impl<S> PropagateTrace<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, B> Service<Request<B>> for PropagateTrace<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        inject_trace_id(req.headers_mut());
        self.inner.call(req)
    }
}
