//! Request interceptors
//!
//! Every outgoing request passes through the client's interceptor chain in
//! installation order. The session uses this to attach (or stop attaching)
//! its bearer token without every call site knowing about authentication.

use reqwest::RequestBuilder;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Hook applied to each request before it is sent
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: RequestBuilder) -> RequestBuilder;
}

impl<F> RequestInterceptor for F
where
    F: Fn(RequestBuilder) -> RequestBuilder + Send + Sync,
{
    fn intercept(&self, request: RequestBuilder) -> RequestBuilder {
        self(request)
    }
}

/// Adds `Authorization: Bearer <token>`
pub struct BearerAuth {
    token: String,
}

impl BearerAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl RequestInterceptor for BearerAuth {
    fn intercept(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }
}

/// Handle returned by [`Interceptors::install`], used to eject it later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorId(u64);

type Chain = Vec<(InterceptorId, Arc<dyn RequestInterceptor>)>;

/// Ordered, shared interceptor chain
///
/// Clones share the same chain, so installing through one handle affects
/// every clone of the owning client.
#[derive(Clone, Default)]
pub struct Interceptors {
    chain: Arc<RwLock<Chain>>,
    next_id: Arc<AtomicU64>,
}

impl Interceptors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor to the chain
    pub fn install(&self, interceptor: Arc<dyn RequestInterceptor>) -> InterceptorId {
        let id = InterceptorId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.write().push((id, interceptor));
        id
    }

    /// Remove an interceptor; returns false if it was already gone
    pub fn eject(&self, id: InterceptorId) -> bool {
        let mut chain = self.write();
        let before = chain.len();
        chain.retain(|(installed, _)| *installed != id);
        chain.len() != before
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run a request through the chain
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        // Snapshot the chain so an interceptor never runs under the lock.
        let chain: Vec<Arc<dyn RequestInterceptor>> =
            self.read().iter().map(|(_, i)| Arc::clone(i)).collect();
        chain
            .into_iter()
            .fold(request, |request, interceptor| interceptor.intercept(request))
    }

    // A poisoned lock only means an interceptor panicked mid-push; the
    // vector itself is still valid.
    fn read(&self) -> RwLockReadGuard<'_, Chain> {
        self.chain.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Chain> {
        self.chain.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptors")
            .field("installed", &self.len())
            .finish()
    }
}
