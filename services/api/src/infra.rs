use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use quote_intake::config::DispatchConfig;
use quote_intake::error::AppError;
use quote_intake::intake::{
    ConfirmationRequest, ConfirmationTrigger, DispatchError, HttpConfirmationTrigger,
    HttpRelayEndpoint, IntakeWizard, RelayEndpoint, RelayPayload, SharedWizard, StoreError,
    SubmissionPipeline, WizardId, WizardStore,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

const WIZARD_TTL_MINUTES: i64 = 120;
const MAX_LIVE_WIZARDS: usize = 10_000;

/// Wizards mounted by hosting pages. Entries older than the TTL are swept on
/// every insert and dropped on fetch; the number of live wizards is capped.
#[derive(Clone)]
pub(crate) struct InMemoryWizardStore {
    wizards: Arc<Mutex<HashMap<WizardId, SharedWizard>>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for InMemoryWizardStore {
    fn default() -> Self {
        Self::with_limits(Duration::minutes(WIZARD_TTL_MINUTES), MAX_LIVE_WIZARDS)
    }
}

impl InMemoryWizardStore {
    pub(crate) fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            wizards: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            capacity,
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<WizardId, SharedWizard>>, StoreError> {
        self.wizards
            .lock()
            .map_err(|_| StoreError::Unavailable("wizard store mutex poisoned".to_string()))
    }

    fn is_expired(&self, wizard: &SharedWizard, now: DateTime<Utc>) -> bool {
        let opened_at = match wizard.lock() {
            Ok(wizard) => wizard.opened_at(),
            Err(poisoned) => poisoned.into_inner().opened_at(),
        };
        now - opened_at >= self.ttl
    }
}

impl WizardStore for InMemoryWizardStore {
    fn insert(&self, id: WizardId, wizard: IntakeWizard) -> Result<SharedWizard, StoreError> {
        let mut guard = self.guard()?;
        let now = Utc::now();
        let before = guard.len();
        guard.retain(|_, existing| !self.is_expired(existing, now));
        if guard.len() < before {
            debug!(evicted = before - guard.len(), "expired wizards swept");
        }

        if guard.contains_key(&id) {
            return Err(StoreError::Conflict);
        }
        if guard.len() >= self.capacity {
            warn!(capacity = self.capacity, "wizard store full, refusing new wizard");
            return Err(StoreError::Unavailable("wizard capacity reached".to_string()));
        }
        let shared = Arc::new(Mutex::new(wizard));
        guard.insert(id, shared.clone());
        Ok(shared)
    }

    fn fetch(&self, id: &WizardId) -> Result<Option<SharedWizard>, StoreError> {
        let mut guard = self.guard()?;
        let Some(shared) = guard.get(id).cloned() else {
            return Ok(None);
        };
        if self.is_expired(&shared, Utc::now()) {
            guard.remove(id);
            return Ok(None);
        }
        Ok(Some(shared))
    }

    fn remove(&self, id: &WizardId) -> Result<(), StoreError> {
        self.guard()?
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

/// Stands in for the form relay when no endpoint is configured.
#[derive(Debug, Default)]
pub(crate) struct DryRunRelay;

#[async_trait]
impl RelayEndpoint for DryRunRelay {
    async fn submit(&self, payload: &RelayPayload) -> Result<(), DispatchError> {
        let labels: Vec<&str> = payload
            .entries()
            .iter()
            .map(|(label, _)| label.as_str())
            .collect();
        info!(?labels, "dry run: relay payload not sent");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct DryRunConfirmation;

#[async_trait]
impl ConfirmationTrigger for DryRunConfirmation {
    async fn trigger(&self, request: &ConfirmationRequest) -> Result<(), DispatchError> {
        info!(
            work_type = %request.work_type,
            "dry run: confirmation email not triggered"
        );
        Ok(())
    }
}

/// Wire the submission pipeline from configuration. Unset targets fall back to
/// dry-run dispatchers so the wizard stays usable in development.
pub(crate) fn build_pipeline(config: &DispatchConfig) -> Result<SubmissionPipeline, AppError> {
    let needs_client = config.relay_url.is_some() || config.confirmation_url.is_some();
    let client = if needs_client {
        Some(reqwest::Client::builder().build()?)
    } else {
        None
    };

    let relay: Arc<dyn RelayEndpoint> = match (&client, &config.relay_url) {
        (Some(client), Some(url)) => Arc::new(HttpRelayEndpoint::new(client.clone(), url.clone())),
        _ => {
            warn!("INTAKE_RELAY_URL not set, quote requests will not leave this process");
            Arc::new(DryRunRelay)
        }
    };

    let confirmation: Arc<dyn ConfirmationTrigger> = match (&client, &config.confirmation_url) {
        (Some(client), Some(url)) => Arc::new(HttpConfirmationTrigger::new(
            client.clone(),
            url.clone(),
            config.confirmation_key.clone(),
        )),
        _ => {
            warn!("INTAKE_CONFIRMATION_URL not set, confirmation emails are disabled");
            Arc::new(DryRunConfirmation)
        }
    };

    Ok(SubmissionPipeline::new(relay, confirmation))
}
