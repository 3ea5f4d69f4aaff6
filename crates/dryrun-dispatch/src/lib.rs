//! Ordered, bounded-concurrency dispatch over a small pool of remote dry-run
//! evaluators.
//!
//! The crate is made of two pieces:
//!
//! - [`ResourcePool`] hands out exclusive [`Worker`] checkouts and takes them
//!   back after a cooldown delay, serving blocked consumers in FIFO order.
//! - [`DispatchQueue`] accepts requests from any number of callers, pairs them
//!   with workers in strict submission order, and returns each caller its own
//!   outcome.
//!
//! Both are generic over a [`Runtime`] that provides spawning and timers.
//! Tokio ([`TokioRuntime`], default) and Smol ([`SmolRuntime`]) backends are
//! available behind the `async-tokio` and `async-smol` features.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "async-tokio")]
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use core::convert::Infallible;
//! use dryrun_dispatch::{DispatchConfig, TokioDispatchQueue, TokioResourcePool, invoke_fn};
//!
//! let endpoints = ["node-a", "node-b"].map(|name| {
//!     invoke_fn(move |call: u32| async move { Ok::<_, Infallible>(format!("{name}:{call}")) })
//! });
//!
//! let pool = TokioResourcePool::new(endpoints);
//! let queue = TokioDispatchQueue::new(pool, DispatchConfig::default());
//!
//! let out = queue.submit(7).await.unwrap();
//! assert!(out.ends_with(":7"));
//! # }
//! # #[cfg(not(feature = "async-tokio"))]
//! # fn main() {}
//! ```

mod config;
mod error;
mod pool;
mod queue;
mod runtime;
mod worker;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::pool::*;
pub use crate::queue::*;
pub use crate::runtime::*;
pub use crate::worker::*;
