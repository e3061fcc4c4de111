//! RPC adapter: runs tonic handlers and turns their failures into terminal
//! [`Status`] values carrying the problem response.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;

use bytes::Bytes;
use faultline_core::trace::{TRACE_ID, trace_id_or_generate};
use faultline_core::{Failure, ProblemRenderer, RenderedProblem};
use futures::{FutureExt, Stream, StreamExt};
use tonic::metadata::{MetadataMap, MetadataValue};
use tonic::{Request, Response, Status};

/// Response stream of a guarded streaming call
///
/// Ends right after the first error it yields.
pub type GuardedStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send + 'static>>;

/// Wraps every handler shape of a tonic service
///
/// A handler reports failures by returning `Err(Failure)`, either from the
/// call itself or as a stream item; panics are caught as well. In every case
/// the caller receives a status with the classified RPC code and the problem
/// JSON as both message and details.
#[derive(Debug, Clone, Default)]
pub struct GrpcGuard {
    renderer: ProblemRenderer,
}

impl GrpcGuard {
    pub const fn new(renderer: ProblemRenderer) -> Self {
        Self { renderer }
    }

    pub const fn renderer(&self) -> &ProblemRenderer {
        &self.renderer
    }

    /// Run a unary handler
    pub async fn unary<Req, Res, F, Fut>(
        &self,
        method: &'static str,
        request: Request<Req>,
        handler: F,
    ) -> Result<Response<Res>, Status>
    where
        F: FnOnce(Request<Req>) -> Fut,
        Fut: Future<Output = Result<Response<Res>, Failure>>,
    {
        let trace_id = trace_id_from_metadata(request.metadata());
        self.run(method, &trace_id, request, handler).await
    }

    /// Run a client-streaming handler
    ///
    /// The inbound stream is handed over as-is; only the single response is
    /// guarded.
    pub async fn client_streaming<S, Res, F, Fut>(
        &self,
        method: &'static str,
        request: Request<S>,
        handler: F,
    ) -> Result<Response<Res>, Status>
    where
        F: FnOnce(Request<S>) -> Fut,
        Fut: Future<Output = Result<Response<Res>, Failure>>,
    {
        self.unary(method, request, handler).await
    }

    /// Run a server-streaming handler
    pub async fn server_streaming<Req, Res, S, F, Fut>(
        &self,
        method: &'static str,
        request: Request<Req>,
        handler: F,
    ) -> Result<Response<GuardedStream<Res>>, Status>
    where
        F: FnOnce(Request<Req>) -> Fut,
        Fut: Future<Output = Result<Response<S>, Failure>>,
        S: Stream<Item = Result<Res, Failure>> + Send + 'static,
        Res: Send + 'static,
    {
        let trace_id = trace_id_from_metadata(request.metadata());
        let response = self.run(method, &trace_id, request, handler).await?;

        let (metadata, stream, extensions) = response.into_parts();
        let guarded = self.guard_stream(method, trace_id, stream);

        Ok(Response::from_parts(metadata, guarded, extensions))
    }

    /// Run a bidirectional streaming handler
    pub async fn duplex<S, Res, Out, F, Fut>(
        &self,
        method: &'static str,
        request: Request<S>,
        handler: F,
    ) -> Result<Response<GuardedStream<Res>>, Status>
    where
        F: FnOnce(Request<S>) -> Fut,
        Fut: Future<Output = Result<Response<Out>, Failure>>,
        Out: Stream<Item = Result<Res, Failure>> + Send + 'static,
        Res: Send + 'static,
    {
        self.server_streaming(method, request, handler).await
    }

    /// Terminal status for a failure raised by `method`
    pub fn status(&self, method: &str, trace_id: &str, failure: &Failure) -> Status {
        tracing::error!(
            method,
            %trace_id,
            failure_type = %failure.failure_type(),
            detail = failure.message(),
            "call failed"
        );

        let rendered = self.renderer.render(Some(failure), Some(trace_id));
        problem_status(rendered, trace_id)
    }

    async fn run<Req, Res, F, Fut>(
        &self,
        method: &'static str,
        trace_id: &str,
        request: Request<Req>,
        handler: F,
    ) -> Result<Response<Res>, Status>
    where
        F: FnOnce(Request<Req>) -> Fut,
        Fut: Future<Output = Result<Response<Res>, Failure>>,
    {
        tracing::info!(method, %trace_id, "incoming call");

        // the handler call itself may panic before its future exists
        let outcome = AssertUnwindSafe(async move { handler(request).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(failure)) => Err(self.status(method, trace_id, &failure)),
            Err(payload) => Err(self.status(method, trace_id, &Failure::from_panic(&*payload))),
        }
    }

    fn guard_stream<S, Res>(&self, method: &'static str, trace_id: String, stream: S) -> GuardedStream<Res>
    where
        S: Stream<Item = Result<Res, Failure>> + Send + 'static,
        Res: Send + 'static,
    {
        let guard = self.clone();

        let items = AssertUnwindSafe(stream).catch_unwind().map(move |item| match item {
            Ok(Ok(message)) => Ok(message),
            Ok(Err(failure)) => Err(guard.status(method, &trace_id, &failure)),
            Err(payload) => Err(guard.status(method, &trace_id, &Failure::from_panic(&*payload))),
        });

        let terminated = items.scan(false, |failed, item| {
            if *failed {
                return std::future::ready(None);
            }
            *failed = item.is_err();
            std::future::ready(Some(item))
        });

        Box::pin(terminated)
    }
}

/// Status carrying a rendered problem
///
/// The problem JSON is both the status message and the binary details; the
/// trace id travels in the `x-trace-id` trailer.
pub fn problem_status(rendered: RenderedProblem, trace_id: &str) -> Status {
    let details = Bytes::from(rendered.body.clone());
    let mut status = Status::with_details(rendered.status.rpc(), rendered.body, details);

    if let Ok(value) = MetadataValue::try_from(trace_id) {
        status.metadata_mut().insert(TRACE_ID.as_str(), value);
    }

    status
}

/// Trace id from call metadata, or a fresh one
pub fn trace_id_from_metadata(metadata: &MetadataMap) -> String {
    trace_id_or_generate(&metadata.clone().into_headers())
}
