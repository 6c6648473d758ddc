use iam_core::error::AppError;
use std::future::Future;
use std::time::Instant;

use super::error::ReconcileError;

pub const REMOTE_CALLS_TOTAL: &str = "iam_remote_calls_total";
pub const REMOTE_CALL_DURATION_SECONDS: &str = "iam_remote_call_duration_seconds";

/// Await one remote operation, recording its outcome and latency.
pub(crate) async fn remote_call<T, F>(operation: &'static str, call: F) -> Result<T, ReconcileError>
where
    F: Future<Output = Result<T, AppError>>,
{
    let start = Instant::now();
    let result = call.await;
    let elapsed = start.elapsed().as_secs_f64();

    let outcome = match &result {
        Ok(_) => "success",
        Err(e) if e.is_not_found() => "not_found",
        Err(_) => "error",
    };
    metrics::counter!(REMOTE_CALLS_TOTAL, "operation" => operation, "outcome" => outcome)
        .increment(1);
    metrics::histogram!(REMOTE_CALL_DURATION_SECONDS, "operation" => operation).record(elapsed);

    result.map_err(ReconcileError::remote(operation))
}
