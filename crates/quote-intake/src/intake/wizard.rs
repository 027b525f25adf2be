use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::attachments::{
    Attachment, AttachmentCandidate, AttachmentIndexError, AttachmentIntake, AttachmentSet,
    MAX_ATTACHMENTS,
};
use super::domain::{
    FieldInput, IntakeFields, SubmissionDraft, SubmissionResult, VisibleFields, WizardId,
    WizardView, WorkTypeOption,
};
use super::pipeline::SubmissionPipeline;
use super::schema::{self, FieldKind, FieldName, Step, ValidationReport, WorkType};

/// Errors raised by wizard transitions. None of them discard entered values.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("{0}")]
    Validation(ValidationReport),
    #[error("field {field} belongs to step {owner}, wizard is on step {current}")]
    FieldNotOnStep {
        field: FieldName,
        owner: u8,
        current: u8,
    },
    #[error("field {field} expects a {expected} value")]
    InvalidFieldValue {
        field: FieldName,
        expected: &'static str,
    },
    #[error("attachments can only change on step 4, wizard is on step {current}")]
    AttachmentsLocked { current: u8 },
    #[error(transparent)]
    AttachmentIndex(#[from] AttachmentIndexError),
    #[error("submission is only possible from step 5, wizard is on step {current}")]
    NotOnFinalStep { current: u8 },
    #[error("a submission is already in flight")]
    SubmissionInFlight,
}

/// State machine for one in-progress quote request.
#[derive(Debug, Clone)]
pub struct IntakeWizard {
    step: Step,
    fields: IntakeFields,
    attachments: AttachmentSet,
    submitting: bool,
    opened_at: DateTime<Utc>,
}

impl Default for IntakeWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeWizard {
    pub fn new() -> Self {
        Self {
            step: Step::Contact,
            fields: IntakeFields::default(),
            attachments: AttachmentSet::default(),
            submitting: false,
            opened_at: Utc::now(),
        }
    }

    /// Start a wizard with the work type pre-selected from the hosting page's query string.
    /// Unknown values are ignored.
    pub fn with_prefill(work_type: Option<&str>) -> Self {
        let mut wizard = Self::new();
        if let Some(work) = work_type.and_then(WorkType::from_slug) {
            wizard.fields.work_type = work.slug().to_string();
        }
        wizard
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn fields(&self) -> &IntakeFields {
        &self.fields
    }

    pub fn attachments(&self) -> &AttachmentSet {
        &self.attachments
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Edit a field owned by the active step.
    pub fn edit(&mut self, field: FieldName, value: FieldInput) -> Result<(), WizardError> {
        self.ensure_idle()?;
        let owner = field.step();
        if owner != self.step {
            return Err(WizardError::FieldNotOnStep {
                field,
                owner: owner.number(),
                current: self.step.number(),
            });
        }

        self.fields
            .set(field, value)
            .map_err(|expected| WizardError::InvalidFieldValue {
                field,
                expected: match expected {
                    FieldKind::Text => "text",
                    FieldKind::Flag => "boolean",
                },
            })
    }

    /// Validate the active step and move forward on success.
    pub fn advance(&mut self) -> Result<Step, WizardError> {
        self.ensure_idle()?;
        schema::validate_step(self.step, &self.fields).map_err(WizardError::Validation)?;
        let from = self.step;
        self.step = from.next();
        debug!(from = from.number(), to = self.step.number(), "wizard advanced");
        Ok(self.step)
    }

    /// Step back without validating. No-op on step 1.
    pub fn retreat(&mut self) -> Result<Step, WizardError> {
        self.ensure_idle()?;
        self.step = self.step.previous();
        Ok(self.step)
    }

    pub fn add_attachments<I>(&mut self, candidates: I) -> Result<AttachmentIntake, WizardError>
    where
        I: IntoIterator<Item = AttachmentCandidate>,
    {
        self.ensure_attachment_step()?;
        let intake = self.attachments.add(candidates);
        if !intake.rejected.is_empty() || !intake.dropped_over_cap.is_empty() {
            debug!(
                rejected = intake.rejected.len(),
                dropped = intake.dropped_over_cap.len(),
                "attachments filtered"
            );
        }
        Ok(intake)
    }

    pub fn remove_attachment(&mut self, index: usize) -> Result<Attachment, WizardError> {
        self.ensure_attachment_step()?;
        Ok(self.attachments.remove(index)?)
    }

    /// Values and step are frozen while a submission is out on the network.
    fn ensure_idle(&self) -> Result<(), WizardError> {
        if self.submitting {
            Err(WizardError::SubmissionInFlight)
        } else {
            Ok(())
        }
    }

    fn ensure_attachment_step(&self) -> Result<(), WizardError> {
        self.ensure_idle()?;
        if self.step == Step::Attachments {
            Ok(())
        } else {
            Err(WizardError::AttachmentsLocked {
                current: self.step.number(),
            })
        }
    }

    /// First half of a submit: gate, mark in flight, and snapshot the data.
    ///
    /// Consent is only checked when the honeypot is clean so a tripped honeypot
    /// always reaches the pipeline and is dropped there without feedback.
    pub fn begin_submission(&mut self) -> Result<SubmissionDraft, WizardError> {
        if self.step != Step::Review {
            return Err(WizardError::NotOnFinalStep {
                current: self.step.number(),
            });
        }
        self.ensure_idle()?;
        if !schema::honeypot_tripped(&self.fields) {
            schema::validate_step(Step::Review, &self.fields).map_err(WizardError::Validation)?;
        }

        self.submitting = true;
        Ok(SubmissionDraft {
            fields: self.fields.clone(),
            attachments: self.attachments.summaries(),
            requested_at: Utc::now(),
        })
    }

    /// Second half of a submit: a delivered request resets the wizard, anything
    /// else leaves it on step 5 with all data intact.
    pub fn complete_submission(&mut self, result: &SubmissionResult) {
        self.submitting = false;
        if result.success {
            info!("quote request delivered, wizard reset");
            self.reset();
        }
    }

    /// Run the whole submit sequence for a wizard with a single owner.
    pub async fn submit(
        &mut self,
        pipeline: &SubmissionPipeline,
    ) -> Result<SubmissionResult, WizardError> {
        let draft = self.begin_submission()?;
        let result = pipeline.run(&draft).await;
        self.complete_submission(&result);
        Ok(result)
    }

    fn reset(&mut self) {
        self.step = Step::Contact;
        self.fields = IntakeFields::default();
        self.attachments.clear();
        self.submitting = false;
    }

    pub fn view(&self, wizard_id: &WizardId) -> WizardView {
        WizardView {
            wizard_id: wizard_id.clone(),
            step: self.step.number(),
            step_key: self.step,
            step_title: self.step.title(),
            total_steps: Step::Review.number(),
            values: VisibleFields::from(&self.fields),
            attachments: self.attachments.views(),
            max_attachments: MAX_ATTACHMENTS,
            submitting: self.submitting,
            work_type_options: (self.step == Step::WorkType).then(WorkTypeOption::all),
            opened_at: self.opened_at,
        }
    }
}
