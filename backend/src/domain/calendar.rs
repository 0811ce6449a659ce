//! Saving appointments from the calendar form.
//!
//! Every save snapshots the currently active medications into
//! `medicationsAtTime`. The snapshot is a copy and is never refreshed when a
//! medication changes later.

use serde_json::Value;
use shared::{Appointment, AppointmentType, EntityId, MedicationSnapshot};
use thiserror::Error;

use super::state::HealthState;
use super::store::AppStore;

/// Form input that cannot be saved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("required field `{0}` is empty")]
    MissingField(&'static str),
}

/// Values of the appointment form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentDraft {
    pub title: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub doctor: String,
    pub kind: AppointmentType,
    pub diagnosis_id: Option<EntityId>,
    pub purpose: String,
    pub prep_notes: String,
    pub reminder: bool,
}

impl AppointmentDraft {
    /// Prefill the form from an existing appointment
    pub fn from_appointment(appointment: &Appointment) -> Self {
        Self {
            title: appointment.title.clone(),
            date: appointment.date.clone(),
            time: appointment.time.clone(),
            location: appointment.location.clone(),
            doctor: appointment.doctor.clone(),
            kind: appointment.kind.clone(),
            diagnosis_id: appointment.diagnosis_id.clone(),
            purpose: appointment.purpose.clone(),
            prep_notes: appointment.prep_notes.clone(),
            reminder: appointment.reminder,
        }
    }

    fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::MissingField("title"));
        }
        if self.date.trim().is_empty() {
            return Err(DraftError::MissingField("date"));
        }
        Ok(())
    }
}

/// Copies of every active medication, in list order
pub fn snapshot_active_medications(state: &HealthState) -> Vec<MedicationSnapshot> {
    state
        .medications
        .iter()
        .filter(|medication| medication.active)
        .map(MedicationSnapshot::from)
        .collect()
}

/// Create a new appointment, or update `editing` with the draft's values.
/// Returns the saved appointment.
pub fn save_appointment(
    store: &AppStore,
    draft: AppointmentDraft,
    editing: Option<&Appointment>,
) -> Result<Appointment, DraftError> {
    draft.validate()?;
    let medications_at_time = snapshot_active_medications(&store.state());

    let appointment = match editing {
        Some(existing) => {
            let appointment = Appointment {
                title: draft.title,
                date: draft.date,
                time: draft.time,
                location: draft.location,
                doctor: draft.doctor,
                kind: draft.kind,
                diagnosis_id: draft.diagnosis_id,
                purpose: draft.purpose,
                prep_notes: draft.prep_notes,
                reminder: draft.reminder,
                medications_at_time,
                ..existing.clone()
            };
            store.update_appointment(appointment.clone());
            appointment
        }
        None => {
            let mut appointment = Appointment {
                id: EntityId::generate(),
                title: draft.title,
                date: draft.date,
                time: draft.time,
                location: draft.location,
                doctor: draft.doctor,
                kind: draft.kind,
                diagnosis_id: draft.diagnosis_id,
                purpose: draft.purpose,
                prep_notes: draft.prep_notes,
                post_notes: String::new(),
                reminder: draft.reminder,
                medications_at_time,
                ..Appointment::default()
            };
            appointment
                .extra
                .insert("questions".to_string(), Value::Array(Vec::new()));
            store.add_appointment(appointment.clone());
            appointment
        }
    };

    Ok(appointment)
}
