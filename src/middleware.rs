//! Tower middleware that puts a [`Cooldown`] (or a [`CooldownSet`]) in front of a service.
//!
//! The layer needs to know who is calling; supply an [`IdentityExtractor`], usually
//! a closure `Fn(&Req) -> Identity`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use pin_project::pin_project;
use tower_layer::Layer;
use tower_service::Service;

use crate::cooldown::{Cooldown, CooldownSet, Decision};
use crate::error::CooldownError;
use crate::scope::Identity;

/// Derives the caller identity from a request.
pub trait IdentityExtractor<Req>: Send + Sync {
    /// Identity of the caller issuing `req`.
    fn identity(&self, req: &Req) -> Identity;
}

impl<Req, F> IdentityExtractor<Req> for F
where
    F: Fn(&Req) -> Identity + Send + Sync,
{
    fn identity(&self, req: &Req) -> Identity {
        self(req)
    }
}

/// A layer that rejects requests whose caller is cooling down.
#[derive(Debug)]
pub struct CooldownLayer<X> {
    cooldowns: Arc<CooldownSet>,
    extractor: Arc<X>,
}

impl<X> Clone for CooldownLayer<X> {
    fn clone(&self) -> Self {
        Self { cooldowns: self.cooldowns.clone(), extractor: self.extractor.clone() }
    }
}

impl<X> CooldownLayer<X> {
    /// Guard with a single cooldown.
    pub fn new(cooldown: Cooldown, extractor: X) -> Self {
        Self::with_set(CooldownSet::new().with(cooldown), extractor)
    }

    /// Guard with every cooldown in `cooldowns`.
    pub fn with_set(cooldowns: CooldownSet, extractor: X) -> Self {
        Self { cooldowns: Arc::new(cooldowns), extractor: Arc::new(extractor) }
    }
}

impl<S, X> Layer<S> for CooldownLayer<X> {
    type Service = CooldownService<S, X>;

    fn layer(&self, service: S) -> Self::Service {
        CooldownService {
            inner: service,
            cooldowns: self.cooldowns.clone(),
            extractor: self.extractor.clone(),
        }
    }
}

/// Middleware service that enforces cooldowns.
#[derive(Debug)]
pub struct CooldownService<S, X> {
    inner: S,
    cooldowns: Arc<CooldownSet>,
    extractor: Arc<X>,
}

impl<S: Clone, X> Clone for CooldownService<S, X> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            cooldowns: self.cooldowns.clone(),
            extractor: self.extractor.clone(),
        }
    }
}

impl<S, X, Req> Service<Req> for CooldownService<S, X>
where
    S: Service<Req>,
    X: IdentityExtractor<Req>,
{
    type Response = S::Response;
    type Error = CooldownError<S::Error>;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(CooldownError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let identity = IdentityExtractor::<Req>::identity(&*self.extractor, &req);
        match self.cooldowns.check(&identity) {
            Decision::Allowed { .. } => ResponseFuture::Forward { inner: self.inner.call(req) },
            Decision::Denied { wait } => ResponseFuture::Rejected { wait: Some(wait) },
        }
    }
}

/// Response future of [`CooldownService`].
#[pin_project(project = ResponseFutureProj)]
#[derive(Debug)]
pub enum ResponseFuture<F> {
    /// Request admitted; driving the inner service's future.
    Forward {
        /// Inner future.
        #[pin]
        inner: F,
    },
    /// Request rejected before reaching the inner service.
    Rejected {
        /// Remaining cooldown; taken when the future resolves.
        wait: Option<Duration>,
    },
}

impl<F, T, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<T, E>>,
{
    type Output = Result<T, CooldownError<E>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            ResponseFutureProj::Forward { inner } => inner.poll(cx).map_err(CooldownError::Inner),
            ResponseFutureProj::Rejected { wait } => {
                let wait = wait.take().unwrap_or(Duration::ZERO);
                Poll::Ready(Err(CooldownError::CoolingDown { wait }))
            }
        }
    }
}
