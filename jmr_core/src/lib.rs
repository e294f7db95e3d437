//! Client-side core for the JM comic reader backend: a typed API client
//! and the polling monitor that tracks download tasks to completion.

pub mod api;
pub mod error;
pub mod monitor;
