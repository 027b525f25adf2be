use std::sync::Arc;

use tracing::{error, info, warn};

use super::dispatch::{ConfirmationRequest, ConfirmationTrigger, RelayEndpoint, RelayPayload};
use super::domain::{SubmissionDraft, SubmissionResult};
use super::schema;

/// Honeypot check, payload shaping, and the strictly sequential dual dispatch.
#[derive(Debug, Clone)]
pub struct SubmissionPipeline {
    relay: Arc<dyn RelayEndpoint>,
    confirmation: Arc<dyn ConfirmationTrigger>,
}

impl SubmissionPipeline {
    pub fn new(relay: Arc<dyn RelayEndpoint>, confirmation: Arc<dyn ConfirmationTrigger>) -> Self {
        Self {
            relay,
            confirmation,
        }
    }

    /// Success is decided by the relay alone. The confirmation call only runs
    /// after the relay accepted, and its failure is logged and swallowed.
    pub async fn run(&self, draft: &SubmissionDraft) -> SubmissionResult {
        if schema::honeypot_tripped(&draft.fields) {
            info!("honeypot field populated, submission dropped");
            return SubmissionResult::discarded();
        }

        let payload = RelayPayload::from_draft(draft);
        if let Err(err) = self.relay.submit(&payload).await {
            error!(error = %err, "relay dispatch failed");
            return SubmissionResult::failed();
        }
        info!(
            attachments = draft.attachments.len(),
            "quote request accepted by relay"
        );

        let request = ConfirmationRequest::from_draft(draft);
        if let Err(err) = self.confirmation.trigger(&request).await {
            warn!(error = %err, "confirmation email could not be triggered");
        }

        SubmissionResult::delivered()
    }
}
