//! Bounded execution of blocking calls with deadline waits.

pub mod pool;

pub use pool::{DispatchError, DispatchHandle, DispatchPool};
