use crate::error::{GateError, RateLimited};
use crate::rate_limit::{Decision, RateLimitConfig, RateLimiter};
use futures::future::{self, Either, MapErr, Ready};
use futures::TryFutureExt;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

/// A layer that enforces keyed rate limits using a [`RateLimiter`].
///
/// `key_fn` derives the limiter key from each request (a session id, a
/// visitor id, a form name).
pub struct RateLimitLayer<L, K> {
    limiter: Arc<L>,
    config: RateLimitConfig,
    key_fn: K,
}

impl<L, K> RateLimitLayer<L, K> {
    /// Create a new rate limit layer that owns `limiter`.
    pub fn new(limiter: L, config: RateLimitConfig, key_fn: K) -> Self {
        Self::shared(Arc::new(limiter), config, key_fn)
    }

    /// Create a layer over a limiter that is also used elsewhere.
    pub fn shared(limiter: Arc<L>, config: RateLimitConfig, key_fn: K) -> Self {
        Self { limiter, config, key_fn }
    }
}

impl<L, K: Clone> Clone for RateLimitLayer<L, K> {
    fn clone(&self) -> Self {
        Self { limiter: self.limiter.clone(), config: self.config, key_fn: self.key_fn.clone() }
    }
}

impl<L: fmt::Debug, K> fmt::Debug for RateLimitLayer<L, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitLayer")
            .field("limiter", &self.limiter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S, L, K> Layer<S> for RateLimitLayer<L, K>
where
    K: Clone,
{
    type Service = RateLimitService<S, L, K>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService {
            inner: service,
            limiter: self.limiter.clone(),
            config: self.config,
            key_fn: self.key_fn.clone(),
        }
    }
}

/// Middleware service that enforces rate limits.
///
/// Denied requests resolve immediately to [`GateError::RateLimited`] and never
/// reach the inner service.
pub struct RateLimitService<S, L, K> {
    inner: S,
    limiter: Arc<L>,
    config: RateLimitConfig,
    key_fn: K,
}

impl<S: Clone, L, K: Clone> Clone for RateLimitService<S, L, K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: self.limiter.clone(),
            config: self.config,
            key_fn: self.key_fn.clone(),
        }
    }
}

impl<S: fmt::Debug, L: fmt::Debug, K> fmt::Debug for RateLimitService<S, L, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitService")
            .field("inner", &self.inner)
            .field("limiter", &self.limiter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

type InnerFuture<F, E> = MapErr<F, fn(E) -> GateError<E>>;

impl<S, L, K, Req> Service<Req> for RateLimitService<S, L, K>
where
    S: Service<Req>,
    L: RateLimiter,
    K: Fn(&Req) -> String,
{
    type Response = S::Response;
    type Error = GateError<S::Error>;
    type Future = Either<
        Ready<Result<S::Response, GateError<S::Error>>>,
        InnerFuture<S::Future, S::Error>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(GateError::Inner)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let key = (self.key_fn)(&req);
        match self.limiter.check(&key, &self.config) {
            Decision::Allowed { .. } => {
                let wrap: fn(S::Error) -> GateError<S::Error> = GateError::Inner;
                Either::Right(self.inner.call(req).map_err(wrap))
            }
            Decision::Denied { wait, .. } => {
                Either::Left(future::ready(Err(GateError::RateLimited(RateLimited { key, wait }))))
            }
        }
    }
}
