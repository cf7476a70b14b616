//! Proxy event handlers.
//!
//! Two call shapes are supported. [`handler_fn`] wraps business code that
//! only looks at the event; [`context_handler_fn`] also receives the
//! request's [`CancellationToken`]. Both become a [`ProxyHandler`], which is
//! all the adapter ever calls.

use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::event::{ProxyRequest, ProxyResponse};

/// Error type handlers report. Its detail is logged, never sent to clients.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Something that turns a proxy event request into a response.
pub trait ProxyHandler: Send + Sync + 'static {
    fn call(
        &self,
        cancel: CancellationToken,
        request: ProxyRequest,
    ) -> BoxFuture<'static, Result<ProxyResponse, BoxError>>;
}

/// Handler that ignores cancellation.
#[derive(Clone)]
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap `async fn(ProxyRequest) -> Result<ProxyResponse, E>`.
pub fn handler_fn<F, Fut, E>(f: F) -> HandlerFn<F>
where
    F: Fn(ProxyRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ProxyResponse, E>> + Send + 'static,
    E: Into<BoxError>,
{
    HandlerFn { f }
}

impl<F, Fut, E> ProxyHandler for HandlerFn<F>
where
    F: Fn(ProxyRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ProxyResponse, E>> + Send + 'static,
    E: Into<BoxError>,
{
    fn call(
        &self,
        _cancel: CancellationToken,
        request: ProxyRequest,
    ) -> BoxFuture<'static, Result<ProxyResponse, BoxError>> {
        (self.f)(request).map(|result| result.map_err(Into::<BoxError>::into)).boxed()
    }
}

/// Handler that receives the request's cancellation token.
#[derive(Clone)]
pub struct ContextHandlerFn<F> {
    f: F,
}

/// Wrap `async fn(CancellationToken, ProxyRequest) -> Result<ProxyResponse, E>`.
pub fn context_handler_fn<F, Fut, E>(f: F) -> ContextHandlerFn<F>
where
    F: Fn(CancellationToken, ProxyRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ProxyResponse, E>> + Send + 'static,
    E: Into<BoxError>,
{
    ContextHandlerFn { f }
}

impl<F, Fut, E> ProxyHandler for ContextHandlerFn<F>
where
    F: Fn(CancellationToken, ProxyRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ProxyResponse, E>> + Send + 'static,
    E: Into<BoxError>,
{
    fn call(
        &self,
        cancel: CancellationToken,
        request: ProxyRequest,
    ) -> BoxFuture<'static, Result<ProxyResponse, BoxError>> {
        (self.f)(cancel, request)
            .map(|result| result.map_err(Into::<BoxError>::into))
            .boxed()
    }
}
