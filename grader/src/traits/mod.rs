//!
//! Traits Module
//!
//! Extension points of the grading engine.
//!
//! - [`result_store`]: Defines where graded results are read from and written to.

pub mod result_store;

pub use result_store::ResultStore;
