use super::common::*;
use crate::intake::dispatch::RelayPayload;
use crate::intake::domain::{FieldInput, SubmissionResult, FAILURE_MESSAGE};
use crate::intake::schema::{FieldName, Step};

#[tokio::test]
async fn delivered_submission_resets_the_wizard() {
    let dispatch = dispatch(RelayBehavior::Accept, RecordingConfirmation::default());
    let mut wizard = consented_wizard();

    let result = wizard.submit(&dispatch.pipeline).await.expect("submit runs");

    assert_eq!(result, SubmissionResult::delivered());
    assert_eq!(dispatch.relay.calls(), 1);
    assert_eq!(dispatch.confirmation.calls(), 1);
    assert_eq!(wizard.step(), Step::Contact);
    assert!(wizard.fields().first_name.is_empty());
    assert!(wizard.attachments().is_empty());
    assert!(!wizard.is_submitting());
}

#[tokio::test]
async fn relay_server_error_fails_without_confirmation() {
    let dispatch = dispatch(RelayBehavior::Status(500), RecordingConfirmation::default());
    let mut wizard = consented_wizard();

    let result = wizard.submit(&dispatch.pipeline).await.expect("submit runs");

    assert!(!result.success);
    assert_eq!(result.message.as_deref(), Some(FAILURE_MESSAGE));
    assert_eq!(dispatch.relay.calls(), 1);
    assert_eq!(dispatch.confirmation.calls(), 0);
    assert_eq!(wizard.step(), Step::Review);
    assert_eq!(wizard.fields().first_name, "Max");
    assert!(wizard.fields().consent);
    assert_eq!(wizard.attachments().len(), 2);
    assert!(!wizard.is_submitting(), "failed submit must permit a retry");
}

#[tokio::test]
async fn relay_transport_error_hides_detail_from_the_user() {
    let dispatch = dispatch(RelayBehavior::Offline, RecordingConfirmation::default());
    let mut wizard = consented_wizard();

    let result = wizard.submit(&dispatch.pipeline).await.expect("submit runs");

    assert_eq!(result, SubmissionResult::failed());
    assert!(!result
        .message
        .unwrap_or_default()
        .contains("connection refused"));
}

#[tokio::test]
async fn failed_submission_can_be_retried() {
    let failing = dispatch(RelayBehavior::Status(503), RecordingConfirmation::default());
    let accepting = dispatch(RelayBehavior::Accept, RecordingConfirmation::default());
    let mut wizard = consented_wizard();

    let first = wizard.submit(&failing.pipeline).await.expect("first attempt");
    let second = wizard.submit(&accepting.pipeline).await.expect("retry");

    assert!(!first.success);
    assert!(second.success);
    assert_eq!(accepting.relay.payloads()[0].get("Name"), Some("Max Mustermann"));
}

#[tokio::test]
async fn confirmation_failure_is_swallowed() {
    let dispatch = dispatch(RelayBehavior::Accept, RecordingConfirmation::failing());
    let mut wizard = consented_wizard();

    let result = wizard.submit(&dispatch.pipeline).await.expect("submit runs");

    assert!(result.success);
    assert_eq!(dispatch.confirmation.calls(), 1);
    assert_eq!(wizard.step(), Step::Contact);
}

#[tokio::test]
async fn honeypot_drops_submission_without_network_calls() {
    let dispatch = dispatch(RelayBehavior::Accept, RecordingConfirmation::default());
    let mut wizard = wizard_on_review();
    wizard
        .edit(FieldName::Honeypot, "https://cheap-pills.example".into())
        .expect("honeypot on step 5");

    let result = wizard.submit(&dispatch.pipeline).await.expect("silent drop");

    assert!(result.spam_detected);
    assert!(!result.success);
    assert!(result.message.is_none());
    assert_eq!(dispatch.relay.calls(), 0);
    assert_eq!(dispatch.confirmation.calls(), 0);
    assert_eq!(wizard.step(), Step::Review);
    assert!(!wizard.is_submitting());
}

#[tokio::test]
async fn relay_payload_uses_labels_and_expanded_work_type() {
    let dispatch = dispatch(RelayBehavior::Accept, RecordingConfirmation::default());
    let mut wizard = consented_wizard();

    wizard.submit(&dispatch.pipeline).await.expect("submit runs");

    let payload: RelayPayload = dispatch.relay.payloads().remove(0);
    assert_eq!(payload.get("Name"), Some("Max Mustermann"));
    assert_eq!(payload.get("Telefon"), Some("0211123456"));
    assert_eq!(payload.get("E-Mail"), Some("max@example.de"));
    assert_eq!(payload.get("Ort"), Some("Solingen"));
    assert_eq!(payload.get("Leistung"), Some("Erdarbeiten"));
    assert_eq!(payload.get("Fläche"), Some("60 m²"));
    assert_eq!(payload.get("Zeitraum"), None);
    assert_eq!(payload.get("Anhänge"), Some("2 Datei(en)"));
    let files = payload.get("Dateien").expect("file list present");
    assert!(files.contains("hof.jpg"));
    assert!(files.contains("zufahrt.jpg"));
    assert!(!files.contains("blob:"));
    assert!(payload.get("website").is_none());
}

#[tokio::test]
async fn confirmation_receives_reduced_subset() {
    let dispatch = dispatch(RelayBehavior::Accept, RecordingConfirmation::default());
    let mut wizard = consented_wizard();

    wizard.submit(&dispatch.pipeline).await.expect("submit runs");

    let request = dispatch.confirmation.requests().remove(0);
    let json = serde_json::to_value(&request).expect("serializes");
    assert_eq!(
        json,
        serde_json::json!({
            "firstName": "Max",
            "lastName": "Mustermann",
            "email": "max@example.de",
            "city": "Solingen",
            "workType": "Erdarbeiten",
        })
    );
}

#[tokio::test]
async fn submission_without_attachments_reports_zero_files() {
    let dispatch = dispatch(RelayBehavior::Accept, RecordingConfirmation::default());
    let mut wizard = consented_wizard();
    wizard.retreat().expect("wizard idle");
    wizard.remove_attachment(1).expect("second photo");
    wizard.remove_attachment(0).expect("first photo");
    wizard.advance().expect("attachments pass");
    wizard
        .edit(FieldName::Timeframe, FieldInput::from("irrelevant"))
        .expect_err("timeframe belongs to step 3");

    wizard.submit(&dispatch.pipeline).await.expect("submit runs");

    let payload = dispatch.relay.payloads().remove(0);
    assert_eq!(payload.get("Anhänge"), Some("0 Datei(en)"));
    assert_eq!(payload.get("Dateien"), None);
}
