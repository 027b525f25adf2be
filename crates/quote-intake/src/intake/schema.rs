//! Declarative field table for the quote wizard.
//!
//! Every captured field is listed exactly once in [`FIELD_SCHEMA`] together with
//! the step that owns it and the rule it must satisfy before that step may be
//! left. Validation never looks at fields owned by other steps.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::domain::IntakeFields;

/// The five wizard steps in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Contact,
    WorkType,
    Project,
    Attachments,
    Review,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Contact,
        Step::WorkType,
        Step::Project,
        Step::Attachments,
        Step::Review,
    ];

    /// 1-based position shown to the user.
    pub const fn number(self) -> u8 {
        match self {
            Step::Contact => 1,
            Step::WorkType => 2,
            Step::Project => 3,
            Step::Attachments => 4,
            Step::Review => 5,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|step| step.number() == number)
    }

    pub const fn title(self) -> &'static str {
        match self {
            Step::Contact => "Kontaktdaten",
            Step::WorkType => "Leistung",
            Step::Project => "Projekt",
            Step::Attachments => "Fotos",
            Step::Review => "Absenden",
        }
    }

    /// Following step, saturating at [`Step::Review`].
    pub fn next(self) -> Self {
        Self::from_number(self.number() + 1).unwrap_or(Step::Review)
    }

    /// Preceding step, saturating at [`Step::Contact`].
    pub fn previous(self) -> Self {
        Self::from_number(self.number().saturating_sub(1)).unwrap_or(Step::Contact)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.title())
    }
}

/// Every field the wizard captures, including the synthetic consent and honeypot fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    FirstName,
    LastName,
    Phone,
    Email,
    City,
    WorkType,
    Description,
    SurfaceArea,
    Timeframe,
    Consent,
    #[serde(rename = "website")]
    Honeypot,
}

impl FieldName {
    pub const fn key(self) -> &'static str {
        match self {
            FieldName::FirstName => "first_name",
            FieldName::LastName => "last_name",
            FieldName::Phone => "phone",
            FieldName::Email => "email",
            FieldName::City => "city",
            FieldName::WorkType => "work_type",
            FieldName::Description => "description",
            FieldName::SurfaceArea => "surface_area",
            FieldName::Timeframe => "timeframe",
            FieldName::Consent => "consent",
            FieldName::Honeypot => "website",
        }
    }

    /// Label used in the relay payload. First and last name share one entry;
    /// consent and the honeypot are never forwarded.
    pub const fn relay_label(self) -> Option<&'static str> {
        match self {
            FieldName::FirstName | FieldName::LastName => Some("Name"),
            FieldName::Phone => Some("Telefon"),
            FieldName::Email => Some("E-Mail"),
            FieldName::City => Some("Ort"),
            FieldName::WorkType => Some("Leistung"),
            FieldName::Description => Some("Projektbeschreibung"),
            FieldName::SurfaceArea => Some("Fläche"),
            FieldName::Timeframe => Some("Zeitraum"),
            FieldName::Consent | FieldName::Honeypot => None,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        FIELD_SCHEMA
            .iter()
            .map(|spec| spec.name)
            .find(|name| name.key() == key)
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            FieldName::Consent => FieldKind::Flag,
            _ => FieldKind::Text,
        }
    }

    /// Schema entry for this field; the table is laid out in declaration order.
    pub fn spec(self) -> &'static FieldSpec {
        &FIELD_SCHEMA[self as usize]
    }

    pub fn step(self) -> Step {
        self.spec().step
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Flag,
}

/// Services offered on the quote form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkType {
    StreetConstruction,
    Earthworks,
    SewerConstruction,
    GardenLandscaping,
    Other,
}

impl WorkType {
    pub const ALL: [WorkType; 5] = [
        WorkType::StreetConstruction,
        WorkType::Earthworks,
        WorkType::SewerConstruction,
        WorkType::GardenLandscaping,
        WorkType::Other,
    ];

    pub const fn slug(self) -> &'static str {
        match self {
            WorkType::StreetConstruction => "street-construction",
            WorkType::Earthworks => "earthworks",
            WorkType::SewerConstruction => "sewer-construction",
            WorkType::GardenLandscaping => "garden-landscaping",
            WorkType::Other => "other",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            WorkType::StreetConstruction => "Straßenbau",
            WorkType::Earthworks => "Erdarbeiten",
            WorkType::SewerConstruction => "Kanalbau",
            WorkType::GardenLandscaping => "Garten- & Landschaftsbau",
            WorkType::Other => "Sonstiges",
        }
    }

    pub fn from_slug(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|work| work.slug() == raw)
    }
}

/// Borrowed view of a field's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Flag(bool),
}

/// Validation rules a field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Trimmed text must have at least this many characters.
    MinChars(usize),
    EmailAddress,
    OneOf(&'static [WorkType]),
    MustBeTrue,
    Optional,
    /// Never shown to the user; checked by the submission pipeline, not by step validation.
    MustBeEmpty,
}

impl FieldRule {
    pub fn check(&self, value: FieldValue<'_>) -> bool {
        match (self, value) {
            (FieldRule::MinChars(min), FieldValue::Text(text)) => {
                text.trim().chars().count() >= *min
            }
            (FieldRule::EmailAddress, FieldValue::Text(text)) => {
                email_pattern().is_match(text.trim())
            }
            (FieldRule::OneOf(choices), FieldValue::Text(text)) => {
                WorkType::from_slug(text).is_some_and(|work| choices.contains(&work))
            }
            (FieldRule::MustBeTrue, FieldValue::Flag(flag)) => flag,
            (FieldRule::Optional, _) => true,
            (FieldRule::MustBeEmpty, FieldValue::Text(text)) => text.is_empty(),
            _ => false,
        }
    }

    /// Whether a failure of this rule is reported back to the user.
    pub const fn is_visible(&self) -> bool {
        !matches!(self, FieldRule::MustBeEmpty)
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").expect("email pattern compiles")
    })
}

/// One row of the validation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: FieldName,
    pub step: Step,
    pub rule: FieldRule,
    pub message: &'static str,
}

pub const FIELD_SCHEMA: [FieldSpec; 11] = [
    FieldSpec {
        name: FieldName::FirstName,
        step: Step::Contact,
        rule: FieldRule::MinChars(2),
        message: "Bitte geben Sie Ihren Vornamen ein (mindestens 2 Zeichen).",
    },
    FieldSpec {
        name: FieldName::LastName,
        step: Step::Contact,
        rule: FieldRule::MinChars(2),
        message: "Bitte geben Sie Ihren Nachnamen ein (mindestens 2 Zeichen).",
    },
    FieldSpec {
        name: FieldName::Phone,
        step: Step::Contact,
        rule: FieldRule::MinChars(6),
        message: "Bitte geben Sie eine gültige Telefonnummer ein.",
    },
    FieldSpec {
        name: FieldName::Email,
        step: Step::Contact,
        rule: FieldRule::EmailAddress,
        message: "Bitte geben Sie eine gültige E-Mail-Adresse ein.",
    },
    FieldSpec {
        name: FieldName::City,
        step: Step::Contact,
        rule: FieldRule::MinChars(2),
        message: "Bitte geben Sie Ihren Ort ein.",
    },
    FieldSpec {
        name: FieldName::WorkType,
        step: Step::WorkType,
        rule: FieldRule::OneOf(&WorkType::ALL),
        message: "Bitte wählen Sie eine Leistung aus.",
    },
    FieldSpec {
        name: FieldName::Description,
        step: Step::Project,
        rule: FieldRule::MinChars(10),
        message: "Bitte beschreiben Sie Ihr Projekt (mindestens 10 Zeichen).",
    },
    FieldSpec {
        name: FieldName::SurfaceArea,
        step: Step::Project,
        rule: FieldRule::Optional,
        message: "",
    },
    FieldSpec {
        name: FieldName::Timeframe,
        step: Step::Project,
        rule: FieldRule::Optional,
        message: "",
    },
    FieldSpec {
        name: FieldName::Consent,
        step: Step::Review,
        rule: FieldRule::MustBeTrue,
        message: "Bitte stimmen Sie der Verarbeitung Ihrer Daten zu.",
    },
    FieldSpec {
        name: FieldName::Honeypot,
        step: Step::Review,
        rule: FieldRule::MustBeEmpty,
        message: "",
    },
];

/// Schema rows owned by `step`, in table order.
pub fn fields_for(step: Step) -> impl Iterator<Item = &'static FieldSpec> {
    FIELD_SCHEMA.iter().filter(move |spec| spec.step == step)
}

/// Field-level failures for one step, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub step: u8,
    pub errors: BTreeMap<FieldName, &'static str>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.errors.contains_key(&field)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.errors.keys().map(|name| name.key()).collect();
        write!(
            f,
            "step {} has invalid fields: {}",
            self.step,
            fields.join(", ")
        )
    }
}

/// Validate only the user-visible fields owned by `step`.
pub fn validate_step(step: Step, fields: &IntakeFields) -> Result<(), ValidationReport> {
    let errors: BTreeMap<FieldName, &'static str> = fields_for(step)
        .filter(|spec| spec.rule.is_visible())
        .filter(|spec| !spec.rule.check(fields.value(spec.name)))
        .map(|spec| (spec.name, spec.message))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationReport {
            step: step.number(),
            errors,
        })
    }
}

/// True when an automated filler populated the hidden field.
pub fn honeypot_tripped(fields: &IntakeFields) -> bool {
    !FieldName::Honeypot
        .spec()
        .rule
        .check(fields.value(FieldName::Honeypot))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> IntakeFields {
        IntakeFields {
            first_name: "Max".to_string(),
            last_name: "Mustermann".to_string(),
            phone: "0211123456".to_string(),
            email: "max@example.de".to_string(),
            city: "Solingen".to_string(),
            ..IntakeFields::default()
        }
    }

    #[test]
    fn every_field_belongs_to_exactly_one_step() {
        for (index, spec) in FIELD_SCHEMA.iter().enumerate() {
            assert_eq!(spec.name as usize, index, "table out of declaration order");
            let owners = FIELD_SCHEMA
                .iter()
                .filter(|other| other.name == spec.name)
                .count();
            assert_eq!(owners, 1, "{} listed more than once", spec.name);
            assert_eq!(spec.name.step(), spec.step);
            assert_eq!(FieldName::from_key(spec.name.key()), Some(spec.name));
        }
    }

    #[test]
    fn private_fields_have_no_relay_label() {
        assert_eq!(FieldName::Consent.relay_label(), None);
        assert_eq!(FieldName::Honeypot.relay_label(), None);
        assert_eq!(
            FieldName::FirstName.relay_label(),
            FieldName::LastName.relay_label()
        );
    }

    #[test]
    fn attachment_step_owns_no_fields() {
        assert_eq!(fields_for(Step::Attachments).count(), 0);
        assert!(validate_step(Step::Attachments, &IntakeFields::default()).is_ok());
    }

    #[test]
    fn step_navigation_saturates() {
        assert_eq!(Step::Review.next(), Step::Review);
        assert_eq!(Step::Contact.previous(), Step::Contact);
        assert_eq!(Step::WorkType.next(), Step::Project);
        assert_eq!(Step::from_number(0), None);
        assert_eq!(Step::from_number(4), Some(Step::Attachments));
    }

    #[test]
    fn contact_step_accepts_complete_details() {
        assert!(validate_step(Step::Contact, &contact()).is_ok());
    }

    #[test]
    fn contact_step_flags_each_short_field() {
        let fields = IntakeFields {
            first_name: " M ".to_string(),
            phone: "12345".to_string(),
            email: "max@example".to_string(),
            ..contact()
        };

        let report = validate_step(Step::Contact, &fields).expect_err("invalid contact");
        assert!(report.contains(FieldName::FirstName));
        assert!(report.contains(FieldName::Phone));
        assert!(report.contains(FieldName::Email));
        assert!(!report.contains(FieldName::LastName));
        assert!(!report.contains(FieldName::City));
        assert_eq!(report.step, 1);
    }

    #[test]
    fn email_pattern_rejects_common_typos() {
        let rule = FieldRule::EmailAddress;
        assert!(rule.check(FieldValue::Text("max@example.de")));
        assert!(rule.check(FieldValue::Text("  info@bau-firma.com ")));
        assert!(!rule.check(FieldValue::Text("max.example.de")));
        assert!(!rule.check(FieldValue::Text("max@@example.de")));
        assert!(!rule.check(FieldValue::Text("max @example.de")));
        assert!(!rule.check(FieldValue::Text("")));
    }

    #[test]
    fn work_type_must_be_a_known_slug() {
        let mut fields = IntakeFields {
            work_type: "roofing".to_string(),
            ..IntakeFields::default()
        };
        assert!(validate_step(Step::WorkType, &fields).is_err());

        for work in WorkType::ALL {
            fields.work_type = work.slug().to_string();
            assert!(validate_step(Step::WorkType, &fields).is_ok());
        }
    }

    #[test]
    fn project_step_only_requires_description() {
        let fields = IntakeFields {
            description: "ab".to_string(),
            surface_area: String::new(),
            timeframe: String::new(),
            ..IntakeFields::default()
        };
        let report = validate_step(Step::Project, &fields).expect_err("short description");
        assert_eq!(
            report.errors.keys().copied().collect::<Vec<_>>(),
            vec![FieldName::Description]
        );
    }

    #[test]
    fn min_chars_counts_characters_not_bytes() {
        let rule = FieldRule::MinChars(2);
        assert!(rule.check(FieldValue::Text("Öz")));
        assert!(!rule.check(FieldValue::Text("Ö")));
    }

    #[test]
    fn honeypot_never_appears_in_review_errors() {
        let fields = IntakeFields {
            consent: true,
            honeypot: "http://spam.example".to_string(),
            ..IntakeFields::default()
        };
        assert!(validate_step(Step::Review, &fields).is_ok());
        assert!(honeypot_tripped(&fields));
    }

    #[test]
    fn whitespace_in_honeypot_counts_as_filled() {
        let fields = IntakeFields {
            honeypot: "   ".to_string(),
            ..IntakeFields::default()
        };
        assert!(honeypot_tripped(&fields));
        assert!(!honeypot_tripped(&IntakeFields::default()));
    }

    #[test]
    fn review_step_requires_consent() {
        let report = validate_step(Step::Review, &IntakeFields::default())
            .expect_err("consent missing");
        assert!(report.contains(FieldName::Consent));
        assert!(!report.contains(FieldName::Honeypot));
    }

    #[test]
    fn validation_report_serializes_field_keys() {
        let report = validate_step(Step::Project, &IntakeFields::default()).expect_err("empty");
        let json = serde_json::to_value(&report).expect("serializes");
        assert!(json["errors"].get("description").is_some());
        assert_eq!(json["step"], 3);
    }
}
