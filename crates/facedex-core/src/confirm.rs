use async_trait::async_trait;

/// Asks the user to approve a destructive action.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, title: &str, body: &str) -> bool;
}

/// Approves everything. Used for non-interactive runs.
pub struct AssumeYes;

#[async_trait]
impl Confirm for AssumeYes {
    async fn confirm(&self, title: &str, _body: &str) -> bool {
        tracing::debug!(title, "confirmation assumed");
        true
    }
}
