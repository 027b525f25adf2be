//! Outbound boundaries of the submission pipeline.
//!
//! The relay endpoint receives the full, label-keyed request; the confirmation
//! trigger receives a reduced subset and only ever after the relay accepted.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;

use super::domain::{AttachmentSummary, SubmissionDraft};
use super::schema::FieldName;

/// Form relay that forwards the request to the company inbox.
#[async_trait]
pub trait RelayEndpoint: Debug + Send + Sync {
    async fn submit(&self, payload: &RelayPayload) -> Result<(), DispatchError>;
}

/// Managed function that sends the acknowledgment e-mail to the requester.
#[async_trait]
pub trait ConfirmationTrigger: Debug + Send + Sync {
    async fn trigger(&self, request: &ConfirmationRequest) -> Result<(), DispatchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("endpoint answered with status {0}")]
    Status(u16),
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => DispatchError::Status(status.as_u16()),
            None => DispatchError::Transport(value.to_string()),
        }
    }
}

/// Flat, human-readable key/value list sent form-encoded to the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RelayPayload {
    entries: Vec<(String, String)>,
}

impl RelayPayload {
    fn push(&mut self, label: &str, value: impl Into<String>) {
        self.entries.push((label.to_string(), value.into()));
    }

    fn push_field(&mut self, field: FieldName, value: impl Into<String>) {
        if let Some(label) = field.relay_label() {
            self.push(label, value);
        }
    }

    fn push_optional(&mut self, field: FieldName, value: &str) {
        let value = value.trim();
        if !value.is_empty() {
            self.push_field(field, value);
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == label)
            .map(|(_, value)| value.as_str())
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Map a validated draft onto relay labels. Work types go out as display labels.
    pub fn from_draft(draft: &SubmissionDraft) -> Self {
        let fields = &draft.fields;
        let mut payload = RelayPayload::default();

        payload.push_field(FieldName::FirstName, fields.full_name());
        payload.push_field(FieldName::Phone, fields.phone.trim());
        payload.push_field(FieldName::Email, fields.email.trim());
        payload.push_field(FieldName::City, fields.city.trim());
        payload.push_field(
            FieldName::WorkType,
            fields
                .work_type()
                .map(|work| work.label())
                .unwrap_or(fields.work_type.as_str()),
        );
        payload.push_field(FieldName::Description, fields.description.trim());
        payload.push_optional(FieldName::SurfaceArea, &fields.surface_area);
        payload.push_optional(FieldName::Timeframe, &fields.timeframe);
        payload.push("Anhänge", format!("{} Datei(en)", draft.attachments.len()));
        if !draft.attachments.is_empty() {
            payload.push("Dateien", describe_attachments(&draft.attachments));
        }
        payload
    }
}

fn describe_attachments(attachments: &[AttachmentSummary]) -> String {
    attachments
        .iter()
        .map(|attachment| {
            format!(
                "{} ({:.1} KB)",
                attachment.file_name,
                attachment.size_bytes as f64 / 1024.0
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Body of the confirmation-email function call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub city: String,
    pub work_type: String,
}

impl ConfirmationRequest {
    pub fn from_draft(draft: &SubmissionDraft) -> Self {
        let fields = &draft.fields;
        Self {
            first_name: fields.first_name.trim().to_string(),
            last_name: fields.last_name.trim().to_string(),
            email: fields.email.trim().to_string(),
            city: fields.city.trim().to_string(),
            work_type: fields
                .work_type()
                .map(|work| work.label().to_string())
                .unwrap_or_else(|| fields.work_type.clone()),
        }
    }
}
