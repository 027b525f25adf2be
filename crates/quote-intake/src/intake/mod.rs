//! Guided quote-request wizard: field schema, step controller, photo intake,
//! and the submission pipeline with its two delivery channels.

pub mod attachments;
pub mod dispatch;
pub mod domain;
pub mod http;
pub mod pipeline;
pub mod repository;
pub mod router;
pub mod schema;
pub mod service;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use attachments::{
    AttachmentCandidate, AttachmentIntake, AttachmentSet, RejectionReason, MAX_ATTACHMENTS,
    MAX_ATTACHMENT_BYTES,
};
pub use dispatch::{
    ConfirmationRequest, ConfirmationTrigger, DispatchError, RelayEndpoint, RelayPayload,
};
pub use domain::{
    FieldInput, IntakeFields, SubmissionDraft, SubmissionResult, WizardId, WizardView,
};
pub use http::{HttpConfirmationTrigger, HttpRelayEndpoint};
pub use pipeline::SubmissionPipeline;
pub use repository::{SharedWizard, StoreError, WizardStore};
pub use router::intake_router;
pub use schema::{
    validate_step, FieldName, FieldRule, Step, ValidationReport, WorkType, FIELD_SCHEMA,
};
pub use service::{IntakeService, IntakeServiceError};
pub use wizard::{IntakeWizard, WizardError};
