//!
//! # Result Store Trait
//!
//! Persistence seam for graded results. The engine never decides how results
//! are stored; re-evaluation and statistics read and write through this trait.
//!

use async_trait::async_trait;

use crate::error::GraderError;
use crate::types::StoredResult;

/// Storage for the results of all participations of an exercise.
///
/// Implementations must make `save` replace an existing result with the same
/// `id`. Concurrent saves of the same result may resolve in any order.
#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Every result of every participation of the exercise, including
    /// template and solution participations.
    async fn find_by_exercise(&self, exercise_id: i64) -> Result<Vec<StoredResult>, GraderError>;

    async fn save(&self, result: StoredResult) -> Result<(), GraderError>;
}
