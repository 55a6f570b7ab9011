use std::future::Future;

/// Runs a secondary effect whose failure must not affect the enclosing
/// operation. Errors are logged and discarded; `None` stands in for the value.
pub async fn best_effort<T, F>(operation: &'static str, effect: F) -> Option<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match effect.await {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(error = ?err, operation, "best-effort step failed, ignoring");
            None
        }
    }
}
