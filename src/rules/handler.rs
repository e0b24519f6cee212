//! User callbacks
//!
//! Every callback the crawler invokes is a [`Handler`], which is either a
//! plain function or one returning a future. Both are driven through the
//! same `call(..).await`, so a crawl made only of synchronous handlers
//! never actually suspends.

use futures::future::{FutureExt, LocalBoxFuture};
use std::fmt;
use std::future::Future;
use std::rc::Rc;

type SyncFn<A, T> = Rc<dyn Fn(A) -> anyhow::Result<T>>;
type AsyncFn<A, T> = Rc<dyn Fn(A) -> LocalBoxFuture<'static, anyhow::Result<T>>>;

/// A synchronous or asynchronous callback taking `A` and producing `T`
pub enum Handler<A, T> {
    Sync(SyncFn<A, T>),
    Async(AsyncFn<A, T>),
}

impl<A: 'static, T: 'static> Handler<A, T> {
    /// Wraps a plain function
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(A) -> anyhow::Result<T> + 'static,
    {
        Self::Sync(Rc::new(f))
    }

    /// Wraps a function returning a future
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(A) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<T>> + 'static,
    {
        Self::Async(Rc::new(move |arg| f(arg).boxed_local()))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }

    /// Invokes the handler
    pub async fn call(&self, arg: A) -> anyhow::Result<T> {
        match self {
            Self::Sync(f) => f(arg),
            Self::Async(f) => f(arg).await,
        }
    }
}

impl<A, T> Clone for Handler<A, T> {
    fn clone(&self) -> Self {
        match self {
            Self::Sync(f) => Self::Sync(Rc::clone(f)),
            Self::Async(f) => Self::Async(Rc::clone(f)),
        }
    }
}

impl<A, T> fmt::Debug for Handler<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Handler::Sync"),
            Self::Async(_) => f.write_str("Handler::Async"),
        }
    }
}

/// Lifecycle callbacks around a crawl
///
/// `startup` and `shutdown` run once per crawl. `pre_setup` and
/// `post_setup` bracket the setup phase of every frontier entry and
/// receive the loaded document.
pub struct Hooks<D> {
    pub startup: Vec<Handler<(), ()>>,
    pub shutdown: Vec<Handler<(), ()>>,
    pub pre_setup: Vec<Handler<D, ()>>,
    pub post_setup: Vec<Handler<D, ()>>,
}

impl<D: 'static> Hooks<D> {
    pub fn has_async(&self) -> bool {
        self.startup.iter().any(Handler::is_async)
            || self.shutdown.iter().any(Handler::is_async)
            || self.pre_setup.iter().any(Handler::is_async)
            || self.post_setup.iter().any(Handler::is_async)
    }
}

impl<D> Default for Hooks<D> {
    fn default() -> Self {
        Self {
            startup: Vec::new(),
            shutdown: Vec::new(),
            pre_setup: Vec::new(),
            post_setup: Vec::new(),
        }
    }
}

impl<D> Clone for Hooks<D> {
    fn clone(&self) -> Self {
        Self {
            startup: self.startup.clone(),
            shutdown: self.shutdown.clone(),
            pre_setup: self.pre_setup.clone(),
            post_setup: self.post_setup.clone(),
        }
    }
}
