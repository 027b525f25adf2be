use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::attachments::AttachmentView;
use super::schema::{FieldKind, FieldName, FieldValue, Step, WorkType};

/// Identifier wrapper for an open wizard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WizardId(pub String);

/// Values accumulated across all steps of one quote request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeFields {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    pub work_type: String,
    pub description: String,
    pub surface_area: String,
    pub timeframe: String,
    pub consent: bool,
    #[serde(rename = "website")]
    pub honeypot: String,
}

impl IntakeFields {
    pub fn value(&self, name: FieldName) -> FieldValue<'_> {
        match name {
            FieldName::FirstName => FieldValue::Text(&self.first_name),
            FieldName::LastName => FieldValue::Text(&self.last_name),
            FieldName::Phone => FieldValue::Text(&self.phone),
            FieldName::Email => FieldValue::Text(&self.email),
            FieldName::City => FieldValue::Text(&self.city),
            FieldName::WorkType => FieldValue::Text(&self.work_type),
            FieldName::Description => FieldValue::Text(&self.description),
            FieldName::SurfaceArea => FieldValue::Text(&self.surface_area),
            FieldName::Timeframe => FieldValue::Text(&self.timeframe),
            FieldName::Consent => FieldValue::Flag(self.consent),
            FieldName::Honeypot => FieldValue::Text(&self.honeypot),
        }
    }

    /// Store `input` in the named field. Returns the expected kind on mismatch.
    pub fn set(&mut self, name: FieldName, input: FieldInput) -> Result<(), FieldKind> {
        let text = match (name.kind(), input) {
            (FieldKind::Flag, FieldInput::Flag(flag)) => {
                self.consent = flag;
                return Ok(());
            }
            (FieldKind::Text, FieldInput::Text(text)) => text,
            (expected, _) => return Err(expected),
        };

        let slot = match name {
            FieldName::FirstName => &mut self.first_name,
            FieldName::LastName => &mut self.last_name,
            FieldName::Phone => &mut self.phone,
            FieldName::Email => &mut self.email,
            FieldName::City => &mut self.city,
            FieldName::WorkType => &mut self.work_type,
            FieldName::Description => &mut self.description,
            FieldName::SurfaceArea => &mut self.surface_area,
            FieldName::Timeframe => &mut self.timeframe,
            FieldName::Honeypot => &mut self.honeypot,
            FieldName::Consent => return Err(FieldKind::Flag),
        };
        *slot = text;
        Ok(())
    }

    pub fn work_type(&self) -> Option<WorkType> {
        WorkType::from_slug(&self.work_type)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Raw value posted for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldInput {
    Flag(bool),
    Text(String),
}

impl From<&str> for FieldInput {
    fn from(value: &str) -> Self {
        FieldInput::Text(value.to_string())
    }
}

impl From<bool> for FieldInput {
    fn from(value: bool) -> Self {
        FieldInput::Flag(value)
    }
}

/// Outcome of one terminal submit attempt. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub spam_detected: bool,
}

pub const SUCCESS_MESSAGE: &str =
    "Vielen Dank für Ihre Anfrage! Wir melden uns schnellstmöglich bei Ihnen.";
pub const FAILURE_MESSAGE: &str =
    "Ihre Anfrage konnte nicht gesendet werden. Bitte versuchen Sie es erneut.";

impl SubmissionResult {
    pub fn delivered() -> Self {
        Self {
            success: true,
            message: Some(SUCCESS_MESSAGE.to_string()),
            spam_detected: false,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            message: Some(FAILURE_MESSAGE.to_string()),
            spam_detected: false,
        }
    }

    /// Silent drop: neither success nor a visible error.
    pub fn discarded() -> Self {
        Self {
            success: false,
            message: None,
            spam_detected: true,
        }
    }
}

/// Filename and size of an attachment as reported downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentSummary {
    pub file_name: String,
    pub size_bytes: u64,
}

/// Immutable snapshot handed to the submission pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionDraft {
    pub fields: IntakeFields,
    pub attachments: Vec<AttachmentSummary>,
    pub requested_at: DateTime<Utc>,
}

/// A selectable work type as rendered on step 2.
#[derive(Debug, Clone, Serialize)]
pub struct WorkTypeOption {
    pub value: &'static str,
    pub label: &'static str,
}

impl WorkTypeOption {
    pub fn all() -> Vec<Self> {
        WorkType::ALL
            .into_iter()
            .map(|work| WorkTypeOption {
                value: work.slug(),
                label: work.label(),
            })
            .collect()
    }
}

/// Projection of the wizard consumed by the hosting page to render the active step.
#[derive(Debug, Clone, Serialize)]
pub struct WizardView {
    pub wizard_id: WizardId,
    pub step: u8,
    pub step_key: Step,
    pub step_title: &'static str,
    pub total_steps: u8,
    pub values: VisibleFields,
    pub attachments: Vec<AttachmentView>,
    pub max_attachments: usize,
    pub submitting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_type_options: Option<Vec<WorkTypeOption>>,
    pub opened_at: DateTime<Utc>,
}

/// Field values without the honeypot, which is never echoed back.
#[derive(Debug, Clone, Serialize)]
pub struct VisibleFields {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    pub work_type: String,
    pub description: String,
    pub surface_area: String,
    pub timeframe: String,
    pub consent: bool,
}

impl From<&IntakeFields> for VisibleFields {
    fn from(fields: &IntakeFields) -> Self {
        Self {
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            phone: fields.phone.clone(),
            email: fields.email.clone(),
            city: fields.city.clone(),
            work_type: fields.work_type.clone(),
            description: fields.description.clone(),
            surface_area: fields.surface_area.clone(),
            timeframe: fields.timeframe.clone(),
            consent: fields.consent,
        }
    }
}
