use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, MutexGuard};

use tracing::info;

use super::attachments::{AttachmentCandidate, AttachmentIntake};
use super::domain::{FieldInput, SubmissionResult, WizardId, WizardView};
use super::pipeline::SubmissionPipeline;
use super::repository::{SharedWizard, StoreError, WizardStore};
use super::schema::FieldName;
use super::wizard::{IntakeWizard, WizardError};

/// Facade the HTTP layer talks to: looks wizards up and drives their transitions.
pub struct IntakeService<S> {
    store: Arc<S>,
    pipeline: SubmissionPipeline,
}

static WIZARD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_wizard_id() -> WizardId {
    let id = WIZARD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    WizardId(format!("wiz-{id:06}"))
}

impl<S> IntakeService<S>
where
    S: WizardStore + 'static,
{
    pub fn new(store: Arc<S>, pipeline: SubmissionPipeline) -> Self {
        Self { store, pipeline }
    }

    /// Mount a new wizard, optionally seeded with a work type from the page URL.
    pub fn open(&self, work_type: Option<&str>) -> Result<WizardView, IntakeServiceError> {
        let id = next_wizard_id();
        let shared = self
            .store
            .insert(id.clone(), IntakeWizard::with_prefill(work_type))?;
        let view = lock(&shared).view(&id);
        info!(wizard_id = %id.0, "wizard opened");
        Ok(view)
    }

    pub fn view(&self, id: &WizardId) -> Result<WizardView, IntakeServiceError> {
        let shared = self.lookup(id)?;
        let view = lock(&shared).view(id);
        Ok(view)
    }

    /// Apply a batch of edits. Stops at the first rejected field; earlier edits stay applied.
    pub fn edit(
        &self,
        id: &WizardId,
        edits: BTreeMap<FieldName, FieldInput>,
    ) -> Result<WizardView, IntakeServiceError> {
        let shared = self.lookup(id)?;
        let mut wizard = lock(&shared);
        for (field, value) in edits {
            wizard.edit(field, value)?;
        }
        Ok(wizard.view(id))
    }

    pub fn advance(&self, id: &WizardId) -> Result<WizardView, IntakeServiceError> {
        let shared = self.lookup(id)?;
        let mut wizard = lock(&shared);
        wizard.advance()?;
        Ok(wizard.view(id))
    }

    pub fn retreat(&self, id: &WizardId) -> Result<WizardView, IntakeServiceError> {
        let shared = self.lookup(id)?;
        let mut wizard = lock(&shared);
        wizard.retreat()?;
        Ok(wizard.view(id))
    }

    pub fn attach(
        &self,
        id: &WizardId,
        candidates: Vec<AttachmentCandidate>,
    ) -> Result<(AttachmentIntake, WizardView), IntakeServiceError> {
        let shared = self.lookup(id)?;
        let mut wizard = lock(&shared);
        let intake = wizard.add_attachments(candidates)?;
        Ok((intake, wizard.view(id)))
    }

    pub fn detach(&self, id: &WizardId, index: usize) -> Result<WizardView, IntakeServiceError> {
        let shared = self.lookup(id)?;
        let mut wizard = lock(&shared);
        wizard.remove_attachment(index)?;
        Ok(wizard.view(id))
    }

    /// Submit from step 5. The in-flight flag blocks a concurrent second submit
    /// while the wizard lock is released for the network calls.
    pub async fn submit(&self, id: &WizardId) -> Result<SubmissionResult, IntakeServiceError> {
        let shared = self.lookup(id)?;
        let draft = lock(&shared).begin_submission()?;

        let result = self.pipeline.run(&draft).await;

        lock(&shared).complete_submission(&result);
        Ok(result)
    }

    /// Unmount a wizard and discard its data.
    pub fn close(&self, id: &WizardId) -> Result<(), IntakeServiceError> {
        self.store.remove(id)?;
        Ok(())
    }

    fn lookup(&self, id: &WizardId) -> Result<SharedWizard, IntakeServiceError> {
        let shared = self.store.fetch(id)?.ok_or(StoreError::NotFound)?;
        Ok(shared)
    }
}

fn lock(shared: &SharedWizard) -> MutexGuard<'_, IntakeWizard> {
    shared
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Error raised by the intake service.
#[derive(Debug, thiserror::Error)]
pub enum IntakeServiceError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
