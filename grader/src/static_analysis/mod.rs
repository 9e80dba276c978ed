pub mod catalog;
pub mod issue;

pub use catalog::{CategoryCatalog, CategoryMapping, CategoryState, StaticAnalysisCategory};
pub use issue::{StaticAnalysisIssue, StaticAnalysisPayload};
