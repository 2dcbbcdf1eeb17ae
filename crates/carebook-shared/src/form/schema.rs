use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};

use super::{FormDraft, FormField, FormMode};

const MIN_PHYSICIAN_LEN: usize = 2;
const MIN_CANCELLATION_REASON_LEN: usize = 2;
const MAX_TEXT_LEN: usize = 500;

/// A draft that passed its mode's schema. Each variant only holds what that
/// mode submits.
#[derive(Debug, Clone, PartialEq)]
pub enum AppointmentChange {
    Create {
        primary_physician: String,
        schedule: DateTime<Utc>,
        reason: Option<String>,
        note: Option<String>,
    },
    Schedule {
        primary_physician: String,
        schedule: DateTime<Utc>,
    },
    Cancel {
        cancellation_reason: String,
    },
}

impl AppointmentChange {
    pub fn mode(&self) -> FormMode {
        match self {
            Self::Create { .. } => FormMode::Create,
            Self::Schedule { .. } => FormMode::Schedule,
            Self::Cancel { .. } => FormMode::Cancel,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<FormField, String>,
}

impl ValidationErrors {
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.fields
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }

    fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field.label(), message)?;
            first = false;
        }
        Ok(())
    }
}

/// Applies the schema `mode` selects to `draft`.
pub fn validate(mode: FormMode, draft: &FormDraft) -> Result<AppointmentChange, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let change = match mode {
        FormMode::Create => {
            let primary_physician = required_physician(draft, &mut errors);
            let schedule = required_schedule(draft, &mut errors);
            let reason = optional_text(FormField::Reason, &draft.reason, &mut errors);
            let note = optional_text(FormField::Note, &draft.note, &mut errors);
            match (primary_physician, schedule) {
                (Some(primary_physician), Some(schedule)) => Some(AppointmentChange::Create {
                    primary_physician,
                    schedule,
                    reason,
                    note,
                }),
                _ => None,
            }
        }
        FormMode::Schedule => {
            let primary_physician = required_physician(draft, &mut errors);
            let schedule = required_schedule(draft, &mut errors);
            optional_text(FormField::Reason, &draft.reason, &mut errors);
            optional_text(FormField::Note, &draft.note, &mut errors);
            match (primary_physician, schedule) {
                (Some(primary_physician), Some(schedule)) => Some(AppointmentChange::Schedule {
                    primary_physician,
                    schedule,
                }),
                _ => None,
            }
        }
        FormMode::Cancel => required_cancellation_reason(draft, &mut errors)
            .map(|cancellation_reason| AppointmentChange::Cancel {
                cancellation_reason,
            }),
    };

    match change {
        Some(change) if errors.is_empty() => Ok(change),
        _ => Err(errors),
    }
}

fn required_physician(draft: &FormDraft, errors: &mut ValidationErrors) -> Option<String> {
    let value = draft.primary_physician.trim();
    if value.chars().count() < MIN_PHYSICIAN_LEN {
        errors.insert(FormField::PrimaryPhysician, "Select at least one doctor");
        return None;
    }
    Some(value.to_string())
}

fn required_schedule(draft: &FormDraft, errors: &mut ValidationErrors) -> Option<DateTime<Utc>> {
    if draft.schedule.is_none() {
        errors.insert(FormField::Schedule, "Please select an appointment date");
    }
    draft.schedule
}

fn required_cancellation_reason(
    draft: &FormDraft,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let value = draft.cancellation_reason.trim();
    let len = value.chars().count();
    if len < MIN_CANCELLATION_REASON_LEN {
        errors.insert(
            FormField::CancellationReason,
            "Reason must be at least 2 characters",
        );
        return None;
    }
    if len > MAX_TEXT_LEN {
        errors.insert(
            FormField::CancellationReason,
            "Reason must be at most 500 characters",
        );
        return None;
    }
    Some(value.to_string())
}

fn optional_text(field: FormField, raw: &str, errors: &mut ValidationErrors) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if value.chars().count() > MAX_TEXT_LEN {
        errors.insert(field, format!("{} must be at most 500 characters", field_noun(field)));
        return None;
    }
    Some(value.to_string())
}

fn field_noun(field: FormField) -> &'static str {
    match field {
        FormField::Note => "Note",
        _ => "Reason",
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{AppointmentChange, validate};
    use crate::form::{FormDraft, FormField, FormMode};

    fn when() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 12, 14, 30, 0)
            .single()
            .expect("valid date")
    }

    #[test]
    fn create_requires_physician_and_schedule() {
        let draft = FormDraft::default();
        let errors = validate(FormMode::Create, &draft).expect_err("empty draft is invalid");
        assert_eq!(
            errors.get(FormField::PrimaryPhysician),
            Some("Select at least one doctor")
        );
        assert_eq!(
            errors.get(FormField::Schedule),
            Some("Please select an appointment date")
        );
        assert_eq!(errors.get(FormField::Reason), None);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn create_treats_blank_reason_as_absent() {
        let draft = FormDraft {
            primary_physician: " John Green ".to_string(),
            schedule: Some(when()),
            reason: "   ".to_string(),
            note: "bring referral".to_string(),
            cancellation_reason: String::new(),
        };
        let change = validate(FormMode::Create, &draft).expect("valid create");
        assert_eq!(
            change,
            AppointmentChange::Create {
                primary_physician: "John Green".to_string(),
                schedule: when(),
                reason: None,
                note: Some("bring referral".to_string()),
            }
        );
    }

    #[test]
    fn cancel_ignores_booking_fields() {
        let draft = FormDraft {
            cancellation_reason: "moved away".to_string(),
            ..FormDraft::default()
        };
        let change = validate(FormMode::Cancel, &draft).expect("valid cancel");
        assert_eq!(
            change,
            AppointmentChange::Cancel {
                cancellation_reason: "moved away".to_string(),
            }
        );
    }

    #[test]
    fn cancel_requires_reason_bounds() {
        let short = FormDraft {
            cancellation_reason: "x".to_string(),
            ..FormDraft::default()
        };
        let errors = validate(FormMode::Cancel, &short).expect_err("too short");
        assert_eq!(
            errors.get(FormField::CancellationReason),
            Some("Reason must be at least 2 characters")
        );

        let long = FormDraft {
            cancellation_reason: "a".repeat(501),
            ..FormDraft::default()
        };
        let errors = validate(FormMode::Cancel, &long).expect_err("too long");
        assert_eq!(
            errors.get(FormField::CancellationReason),
            Some("Reason must be at most 500 characters")
        );
    }

    #[test]
    fn schedule_rejects_overlong_note() {
        let draft = FormDraft {
            primary_physician: "Evan Peter".to_string(),
            schedule: Some(when()),
            note: "n".repeat(501),
            ..FormDraft::default()
        };
        let errors = validate(FormMode::Schedule, &draft).expect_err("note too long");
        assert_eq!(
            errors.get(FormField::Note),
            Some("Note must be at most 500 characters")
        );
        assert_eq!(errors.to_string(), "Notes: Note must be at most 500 characters");
    }
}
