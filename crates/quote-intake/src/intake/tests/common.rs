use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::intake::attachments::AttachmentCandidate;
use crate::intake::dispatch::{
    ConfirmationRequest, ConfirmationTrigger, DispatchError, RelayEndpoint, RelayPayload,
};
use crate::intake::domain::{FieldInput, WizardId};
use crate::intake::pipeline::SubmissionPipeline;
use crate::intake::repository::{SharedWizard, StoreError, WizardStore};
use crate::intake::schema::FieldName;
use crate::intake::service::IntakeService;
use crate::intake::wizard::IntakeWizard;
use crate::intake::intake_router;

#[derive(Debug, Clone, Copy)]
pub(super) enum RelayBehavior {
    Accept,
    Status(u16),
    Offline,
}

#[derive(Debug)]
pub(super) struct RecordingRelay {
    behavior: RelayBehavior,
    payloads: Mutex<Vec<RelayPayload>>,
}

impl RecordingRelay {
    pub(super) fn new(behavior: RelayBehavior) -> Self {
        Self {
            behavior,
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.payloads.lock().expect("relay mutex poisoned").len()
    }

    pub(super) fn payloads(&self) -> Vec<RelayPayload> {
        self.payloads.lock().expect("relay mutex poisoned").clone()
    }
}

#[async_trait]
impl RelayEndpoint for RecordingRelay {
    async fn submit(&self, payload: &RelayPayload) -> Result<(), DispatchError> {
        self.payloads
            .lock()
            .expect("relay mutex poisoned")
            .push(payload.clone());
        match self.behavior {
            RelayBehavior::Accept => Ok(()),
            RelayBehavior::Status(code) => Err(DispatchError::Status(code)),
            RelayBehavior::Offline => Err(DispatchError::Transport("connection refused".into())),
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct RecordingConfirmation {
    fail: bool,
    requests: Mutex<Vec<ConfirmationRequest>>,
}

impl RecordingConfirmation {
    pub(super) fn failing() -> Self {
        Self {
            fail: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.requests.lock().expect("confirmation mutex poisoned").len()
    }

    pub(super) fn requests(&self) -> Vec<ConfirmationRequest> {
        self.requests
            .lock()
            .expect("confirmation mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl ConfirmationTrigger for RecordingConfirmation {
    async fn trigger(&self, request: &ConfirmationRequest) -> Result<(), DispatchError> {
        self.requests
            .lock()
            .expect("confirmation mutex poisoned")
            .push(request.clone());
        if self.fail {
            Err(DispatchError::Transport("function crashed".into()))
        } else {
            Ok(())
        }
    }
}

pub(super) struct Dispatch {
    pub(super) relay: Arc<RecordingRelay>,
    pub(super) confirmation: Arc<RecordingConfirmation>,
    pub(super) pipeline: SubmissionPipeline,
}

pub(super) fn dispatch(relay: RelayBehavior, confirmation: RecordingConfirmation) -> Dispatch {
    let relay = Arc::new(RecordingRelay::new(relay));
    let confirmation = Arc::new(confirmation);
    let pipeline = SubmissionPipeline::new(relay.clone(), confirmation.clone());
    Dispatch {
        relay,
        confirmation,
        pipeline,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    wizards: Arc<Mutex<HashMap<WizardId, SharedWizard>>>,
}

impl WizardStore for MemoryStore {
    fn insert(&self, id: WizardId, wizard: IntakeWizard) -> Result<SharedWizard, StoreError> {
        let mut guard = self.wizards.lock().expect("store mutex poisoned");
        if guard.contains_key(&id) {
            return Err(StoreError::Conflict);
        }
        let shared = Arc::new(Mutex::new(wizard));
        guard.insert(id, shared.clone());
        Ok(shared)
    }

    fn fetch(&self, id: &WizardId) -> Result<Option<SharedWizard>, StoreError> {
        let guard = self.wizards.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn remove(&self, id: &WizardId) -> Result<(), StoreError> {
        let mut guard = self.wizards.lock().expect("store mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}

pub(super) struct UnavailableStore;

impl WizardStore for UnavailableStore {
    fn insert(&self, _id: WizardId, _wizard: IntakeWizard) -> Result<SharedWizard, StoreError> {
        Err(StoreError::Unavailable("session cache offline".to_string()))
    }

    fn fetch(&self, _id: &WizardId) -> Result<Option<SharedWizard>, StoreError> {
        Err(StoreError::Unavailable("session cache offline".to_string()))
    }

    fn remove(&self, _id: &WizardId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("session cache offline".to_string()))
    }
}

pub(super) fn build_service(
    relay: RelayBehavior,
    confirmation: RecordingConfirmation,
) -> (
    IntakeService<MemoryStore>,
    Arc<RecordingRelay>,
    Arc<RecordingConfirmation>,
) {
    let Dispatch {
        relay,
        confirmation,
        pipeline,
    } = dispatch(relay, confirmation);
    let service = IntakeService::new(Arc::new(MemoryStore::default()), pipeline);
    (service, relay, confirmation)
}

pub(super) fn router_with_service(service: IntakeService<MemoryStore>) -> axum::Router {
    intake_router(Arc::new(service))
}

/// Walk a freshly opened wizard through the service up to step 5 with consent given.
pub(super) fn drive_to_review(service: &IntakeService<MemoryStore>) -> WizardId {
    let id = service.open(Some("earthworks")).expect("opens").wizard_id;
    service
        .edit(&id, contact_edits().into_iter().collect())
        .expect("contact edits");
    service.advance(&id).expect("step 1 valid");
    service.advance(&id).expect("prefilled work type valid");
    service
        .edit(
            &id,
            [(FieldName::Description, "Aushub für Fundament".into())]
                .into_iter()
                .collect(),
        )
        .expect("description");
    service.advance(&id).expect("step 3 valid");
    service.advance(&id).expect("step 4 passes");
    service
        .edit(&id, [(FieldName::Consent, FieldInput::Flag(true))].into_iter().collect())
        .expect("consent");
    id
}

pub(super) fn contact_edits() -> Vec<(FieldName, FieldInput)> {
    vec![
        (FieldName::FirstName, "Max".into()),
        (FieldName::LastName, "Mustermann".into()),
        (FieldName::Phone, "0211123456".into()),
        (FieldName::Email, "max@example.de".into()),
        (FieldName::City, "Solingen".into()),
    ]
}

pub(super) fn photo(name: &str) -> AttachmentCandidate {
    AttachmentCandidate {
        file_name: name.to_string(),
        size_bytes: 512_000,
        mime_type: "image/jpeg".to_string(),
    }
}

fn apply(wizard: &mut IntakeWizard, edits: Vec<(FieldName, FieldInput)>) {
    for (field, value) in edits {
        wizard.edit(field, value).expect("field belongs to step");
    }
}

/// A wizard that passed steps 1 through 4 with two photos attached.
pub(super) fn wizard_on_review() -> IntakeWizard {
    let mut wizard = IntakeWizard::new();
    apply(&mut wizard, contact_edits());
    wizard.advance().expect("contact valid");
    apply(
        &mut wizard,
        vec![(FieldName::WorkType, "earthworks".into())],
    );
    wizard.advance().expect("work type valid");
    apply(
        &mut wizard,
        vec![
            (
                FieldName::Description,
                "Aushub für eine Garage, ca. 40 m³".into(),
            ),
            (FieldName::SurfaceArea, "60 m²".into()),
        ],
    );
    wizard.advance().expect("project valid");
    wizard
        .add_attachments(vec![photo("hof.jpg"), photo("zufahrt.jpg")])
        .expect("attachments on step 4");
    wizard.advance().expect("attachments always pass");
    wizard
}

/// Same as [`wizard_on_review`] with consent given.
pub(super) fn consented_wizard() -> IntakeWizard {
    let mut wizard = wizard_on_review();
    wizard
        .edit(FieldName::Consent, FieldInput::Flag(true))
        .expect("consent on step 5");
    wizard
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
