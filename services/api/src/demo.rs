use crate::infra::{build_pipeline, InMemoryWizardStore};
use clap::Args;
use quote_intake::config::AppConfig;
use quote_intake::error::AppError;
use quote_intake::intake::schema::fields_for;
use quote_intake::intake::{
    AttachmentCandidate, FieldInput, FieldName, FieldRule, IntakeService, IntakeServiceError,
    Step, WizardError, WizardId, WizardView, WorkType,
};
use quote_intake::telemetry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Work type slug the hosting page would pass in (e.g. earthworks)
    #[arg(long, default_value = "earthworks")]
    pub(crate) work_type: String,
    /// Image files to attach on step 4; MIME types are guessed from the extension
    #[arg(long = "attach")]
    pub(crate) attachments: Vec<PathBuf>,
    /// Fill the hidden honeypot field to show the silent spam drop
    #[arg(long)]
    pub(crate) honeypot: bool,
}

type DemoService = IntakeService<InMemoryWizardStore>;

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        work_type,
        attachments,
        honeypot,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let pipeline = build_pipeline(&config.dispatch)?;
    let service = IntakeService::new(Arc::new(InMemoryWizardStore::default()), pipeline);

    println!("Quote intake demo");
    let view = service.open(Some(&work_type))?;
    let id = view.wizard_id.clone();
    println!(
        "- Opened {} at {} (work type prefill: {})",
        id.0,
        view.opened_at.format("%Y-%m-%d %H:%M:%S UTC"),
        display_or_dash(&view.values.work_type)
    );

    render_step(&view);
    try_advance(&service, &id)?;
    service.edit(
        &id,
        edits([
            (FieldName::FirstName, "Erika"),
            (FieldName::LastName, "Musterfrau"),
            (FieldName::Phone, "0212 445566"),
            (FieldName::Email, "erika@example.de"),
            (FieldName::City, "Solingen"),
        ]),
    )?;
    let view = advance(&service, &id)?;
    render_step(&view);

    if view.values.work_type.is_empty() {
        service.edit(&id, edits([(FieldName::WorkType, WorkType::Other.slug())]))?;
    }
    advance(&service, &id)?;

    service.edit(&id, edits([(FieldName::Description, "ab")]))?;
    try_advance(&service, &id)?;
    let view = service.edit(
        &id,
        edits([
            (
                FieldName::Description,
                "Aushub für eine Doppelgarage inklusive Abtransport",
            ),
            (FieldName::SurfaceArea, "45 m²"),
            (FieldName::Timeframe, "Frühjahr"),
        ]),
    )?;
    render_step(&view);
    let view = advance(&service, &id)?;

    let candidates = if attachments.is_empty() {
        sample_candidates()
    } else {
        attachments
            .iter()
            .map(|path| candidate_from_path(path))
            .collect::<Result<Vec<_>, AppError>>()?
    };
    let (intake, view) = service.attach(&id, candidates)?;
    for name in &intake.accepted {
        println!("  + accepted {name}");
    }
    for rejected in &intake.rejected {
        println!("  - rejected {} ({:?})", rejected.file_name, rejected.reason);
    }
    for name in &intake.dropped_over_cap {
        println!("  - dropped {name} (limit {} files)", view.max_attachments);
    }
    for attachment in &view.attachments {
        println!(
            "    {} -> {} ({} bytes)",
            attachment.file_name, attachment.preview_url, attachment.size_bytes
        );
    }
    let view = advance(&service, &id)?;
    render_step(&view);

    if honeypot {
        service.edit(
            &id,
            edits([(FieldName::Honeypot, "http://cheap-pills.example")]),
        )?;
    } else {
        service.edit(&id, BTreeMap::from([(FieldName::Consent, FieldInput::Flag(true))]))?;
    }

    let result = service.submit(&id).await?;
    match serde_json::to_string_pretty(&result) {
        Ok(json) => println!("  Submission result:\n{json}"),
        Err(err) => println!("  Submission result unavailable: {err}"),
    }

    let view = service.view(&id)?;
    println!(
        "- Wizard now on step {} of {} ({})",
        view.step, view.total_steps, view.step_title
    );
    Ok(())
}

/// Print every visible rule grouped by step.
pub(crate) fn print_schema() {
    for step in Step::ALL {
        println!("Step {}: {}", step.number(), step.title());
        let mut rows = fields_for(step).peekable();
        if rows.peek().is_none() {
            println!("  (no required fields)");
        }
        for spec in rows {
            if !spec.rule.is_visible() {
                continue;
            }
            println!(
                "  - {:<14} {:<36} {}",
                spec.name.key(),
                describe_rule(&spec.rule),
                spec.message
            );
        }
    }
}

fn describe_rule(rule: &FieldRule) -> String {
    match rule {
        FieldRule::MinChars(min) => format!("at least {min} characters"),
        FieldRule::EmailAddress => "email address".to_string(),
        FieldRule::OneOf(choices) => choices
            .iter()
            .map(|work| work.slug())
            .collect::<Vec<_>>()
            .join(" | "),
        FieldRule::MustBeTrue => "must be checked".to_string(),
        FieldRule::Optional => "optional".to_string(),
        FieldRule::MustBeEmpty => "hidden, must stay empty".to_string(),
    }
}

fn edits<const N: usize>(pairs: [(FieldName, &str); N]) -> BTreeMap<FieldName, FieldInput> {
    pairs
        .into_iter()
        .map(|(field, value)| (field, FieldInput::from(value)))
        .collect()
}

fn advance(service: &DemoService, id: &WizardId) -> Result<WizardView, AppError> {
    let view = service.advance(id)?;
    println!("- Advanced to step {}: {}", view.step, view.step_title);
    Ok(view)
}

/// Advance and report validation messages instead of failing the demo.
fn try_advance(service: &DemoService, id: &WizardId) -> Result<(), AppError> {
    match service.advance(id) {
        Ok(view) => {
            println!("- Advanced to step {}: {}", view.step, view.step_title);
            Ok(())
        }
        Err(IntakeServiceError::Wizard(WizardError::Validation(report))) => {
            println!("- Step {} blocked:", report.step);
            for (field, message) in &report.errors {
                println!("    {}: {}", field.key(), message);
            }
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn render_step(view: &WizardView) {
    for line in step_lines(view) {
        println!("{line}");
    }
}

fn step_lines(view: &WizardView) -> Vec<String> {
    let mut lines = vec![format!(
        "  [{} / {}] {}{}",
        view.step,
        view.total_steps,
        view.step_title,
        if view.submitting { " (sending)" } else { "" }
    )];
    if let Some(options) = &view.work_type_options {
        for option in options {
            lines.push(format!("    * {} ({})", option.label, option.value));
        }
    }
    if view.step_key == Step::Project {
        let values = &view.values;
        lines.push(format!("    Beschreibung: {}", display_or_dash(&values.description)));
        lines.push(format!("    Fläche: {}", display_or_dash(&values.surface_area)));
        lines.push(format!("    Zeitraum: {}", display_or_dash(&values.timeframe)));
    }
    lines
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn candidate_from_path(path: &Path) -> Result<AttachmentCandidate, AppError> {
    let metadata = std::fs::metadata(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(AttachmentCandidate {
        file_name,
        size_bytes: metadata.len(),
        mime_type: mime.essence_str().to_string(),
    })
}

fn sample_candidates() -> Vec<AttachmentCandidate> {
    [
        ("baugrube.jpg", 1_843_200, "image/jpeg"),
        ("zufahrt.png", 734_003, "image/png"),
        ("lageplan.pdf", 204_800, "application/pdf"),
        ("drohne.heic", 9_437_184, "image/heic"),
    ]
    .into_iter()
    .map(|(name, size, mime)| AttachmentCandidate {
        file_name: name.to_string(),
        size_bytes: size,
        mime_type: mime.to_string(),
    })
    .collect()
}
