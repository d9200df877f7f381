use anyhow::Result;

use crate::core::state::AppState;
use crate::repositories;
use crate::services::attempt_finalize::{self, FinalizeMode};
use crate::services::attempt_timing;

/// Eager sweep counterpart of the lazy per-request deadline enforcement.
/// Finalizes every expired in-progress attempt through the same CAS path the
/// API uses; a concurrent explicit submit simply wins the race.
pub(crate) async fn close_expired_attempts(state: &AppState) -> Result<()> {
    let now = state.clock().now_primitive();
    let expired = repositories::attempts::list_expired_in_progress(state.db(), now).await?;
    if expired.is_empty() {
        return Ok(());
    }

    let mut closed = 0usize;
    for row in expired {
        let deadline =
            attempt_timing::attempt_deadline(row.attempt.started_at, row.duration_minutes);
        let answers = row.attempt.answers.0.clone();

        match attempt_finalize::finalize(
            state.db(),
            &row.attempt,
            &answers,
            deadline,
            now,
            FinalizeMode::Auto,
        )
        .await
        {
            Ok(Some(_)) => closed += 1,
            // Someone submitted between the listing and the update.
            Ok(None) => {}
            Err(err) => {
                tracing::error!(
                    attempt_id = %row.attempt.id,
                    quiz_id = %row.attempt.quiz_id,
                    error = %err,
                    "Failed to auto-submit expired attempt"
                );
            }
        }
    }

    if closed > 0 {
        tracing::info!(closed, "Closed expired quiz attempts");
        metrics::counter!("expired_attempts_closed_total").increment(closed as u64);
    }

    Ok(())
}

#[cfg(test)]
mod tests;
