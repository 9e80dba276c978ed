//! # Re-Evaluation Coordinator
//!
//! Re-grades every stored result of an exercise after its test cases or
//! static-analysis categories changed. Each result is assembled again from its
//! original, unfiltered feedback under the current configuration, so running it
//! twice without configuration changes yields identical results.
//!
//! Only the graded fields are replaced. Identity, participation, completion
//! date and assessment type of a stored result are left untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::assembler::{GradingContext, ResultAssembler, Submission};
use crate::error::GraderError;
use crate::traits::ResultStore;
use crate::types::StoredResult;

pub struct ReEvaluationCoordinator {
    store: Arc<dyn ResultStore>,
    assembler: ResultAssembler,
}

impl ReEvaluationCoordinator {
    pub fn new(store: Arc<dyn ResultStore>, assembler: ResultAssembler) -> Self {
        Self { store, assembler }
    }

    /// Re-grades all results of `exercise_id` as of now.
    ///
    /// Returns the number of results written back, whether or not their
    /// grade changed.
    pub async fn re_evaluate_all(
        &self,
        exercise_id: i64,
        ctx: &GradingContext,
    ) -> Result<usize, GraderError> {
        self.re_evaluate_all_at(exercise_id, ctx, Utc::now()).await
    }

    /// Same as [`re_evaluate_all`](Self::re_evaluate_all) with an explicit
    /// evaluation time.
    ///
    /// # Arguments
    /// * `exercise_id` - Exercise whose stored results are re-graded.
    /// * `ctx` - The exercise's current parameters, test cases and catalog.
    /// * `now` - Evaluation time used for hidden-test visibility.
    ///
    /// # Returns
    /// The number of results saved back, whether or not their grade changed.
    ///
    /// # Behavior
    /// - Each result is assembled from its original feedback, keeping its
    ///   participation, build flag and assessment type.
    /// - Saves run concurrently, bounded by `re_evaluation_concurrency`.
    /// - A result that fails to save is logged and skipped; failing to load the
    ///   exercise's results is an error.
    pub async fn re_evaluate_all_at(
        &self,
        exercise_id: i64,
        ctx: &GradingContext,
        now: DateTime<Utc>,
    ) -> Result<usize, GraderError> {
        let results = self.store.find_by_exercise(exercise_id).await?;
        let total = results.len();
        info!(exercise_id, results = total, "Re-evaluating results");

        let concurrency = self.assembler.settings().re_evaluation_concurrency.max(1);
        let updated = stream::iter(results)
            .map(|stored| {
                let regraded = self.regrade(stored, ctx, now);
                async move {
                    let id = regraded.id;
                    match self.store.save(regraded).await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(exercise_id, result_id = id, error = %e, "Failed to save re-evaluated result");
                            false
                        }
                    }
                }
            })
            .buffer_unordered(concurrency)
            .filter(|saved| futures::future::ready(*saved))
            .count()
            .await;

        info!(exercise_id, updated, total, "Re-evaluation finished");
        Ok(updated)
    }

    fn regrade(&self, mut stored: StoredResult, ctx: &GradingContext, now: DateTime<Utc>) -> StoredResult {
        let submission = Submission {
            feedbacks: stored.original_feedbacks.clone(),
            participation: stored.participation,
            build_failed: stored.build_failed,
            assessment_type: stored.result.assessment_type,
        };
        stored.result = self.assembler.assemble_at(ctx, &submission, now);
        stored
    }
}
