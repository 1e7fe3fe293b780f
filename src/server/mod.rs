//! TCP accept loop with a bounded worker pool.

pub mod listener;
