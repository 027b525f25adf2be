use std::sync::{Arc, Mutex};

use super::domain::WizardId;
use super::wizard::IntakeWizard;

/// A mounted wizard. The lock is never held across a network call.
pub type SharedWizard = Arc<Mutex<IntakeWizard>>;

/// Holds the wizards currently mounted by hosting pages.
pub trait WizardStore: Send + Sync {
    fn insert(&self, id: WizardId, wizard: IntakeWizard) -> Result<SharedWizard, StoreError>;
    fn fetch(&self, id: &WizardId) -> Result<Option<SharedWizard>, StoreError>;
    fn remove(&self, id: &WizardId) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("wizard already exists")]
    Conflict,
    #[error("wizard not found")]
    NotFound,
    #[error("wizard store unavailable: {0}")]
    Unavailable(String),
}
