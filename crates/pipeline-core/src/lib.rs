pub mod agenda;
pub mod board;
pub mod catalog;
pub mod config;
pub mod drag;
pub mod error;
pub mod gesture;
pub mod invalidation;
pub mod io;
pub mod opportunity;
pub mod paths;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod types;
pub mod urgency;

pub use error::{PipelineError, Result};
