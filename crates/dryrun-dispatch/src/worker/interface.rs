use core::future::Future;

/// The invocation contract of a worker: one request in, one outcome out.
///
/// A worker is a handle to a single remote dry-run endpoint. The queue never
/// looks inside the request or the outcome; it only forwards the request and
/// hands the result back to whoever submitted it.
///
/// Closures can be adapted with [`invoke_fn`].
pub trait Invoke<Req>: Send + Sync + 'static {
    /// The value produced by a successful invocation.
    type Output: Send + 'static;
    /// The failure reported by an unsuccessful invocation.
    type Error: Send + 'static;

    /// Runs `request` against this worker's endpoint.
    fn invoke(&self, request: Req)
    -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

/// Adapter returned by [`invoke_fn`].
#[derive(Clone, Copy, Debug)]
pub struct InvokeFn<F> {
    f: F,
}

/// Wraps an async closure so it can serve as a pool worker.
///
/// # Example
///
/// ```
/// use dryrun_dispatch::invoke_fn;
///
/// let worker = invoke_fn(|call: u64| async move {
///     if call == 0 { Err("empty call") } else { Ok(call * 2) }
/// });
/// # let _ = &worker;
/// ```
pub const fn invoke_fn<F>(f: F) -> InvokeFn<F> {
    InvokeFn { f }
}

impl<F, Fut, Req, T, E> Invoke<Req> for InvokeFn<F>
where
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send + 'static,
    E: Send + 'static,
{
    type Output = T;
    type Error = E;

    fn invoke(&self, request: Req) -> impl Future<Output = Result<T, E>> + Send {
        (self.f)(request)
    }
}
