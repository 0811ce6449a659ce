//! # Doctor Visits
//!
//! Saving a doctor visit mirrors it into the calendar. The direction is one
//! way: visit -> appointment. Editing the appointment in the calendar never
//! touches the visit.
//!
//! The appointment is written first so the visit can carry its id.

use chrono::Utc;
use serde_json::Value;
use shared::{Appointment, AppointmentType, DoctorVisit, EntityId};
use tracing::debug;

use super::calendar::{snapshot_active_medications, DraftError};
use super::state::HealthState;
use super::store::AppStore;

/// Title used when the visit has none and no diagnosis is linked
pub const DEFAULT_VISIT_TITLE: &str = "Läkarbesök";

/// Start time used when the visit has none
pub const DEFAULT_VISIT_TIME: &str = "09:00";

/// Values of the doctor visit form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitDraft {
    pub date: String,
    pub time: String,
    pub location: String,
    pub title: String,
    pub doctor: String,
    pub kind: AppointmentType,
    pub diagnosis_id: Option<EntityId>,
    pub purpose: String,
    pub prep_notes: String,
    pub reminder: bool,
    pub notes: String,
}

impl VisitDraft {
    pub fn from_visit(visit: &DoctorVisit) -> Self {
        Self {
            date: visit.date.clone(),
            time: visit.time.clone(),
            location: visit.location.clone(),
            title: visit.title.clone(),
            doctor: visit.doctor.clone(),
            kind: visit.kind.clone(),
            diagnosis_id: visit.diagnosis_id.clone(),
            purpose: visit.purpose.clone(),
            prep_notes: visit.prep_notes.clone(),
            reminder: visit.reminder,
            notes: visit.notes.clone(),
        }
    }

    fn validate(&self) -> Result<(), DraftError> {
        if self.date.trim().is_empty() {
            return Err(DraftError::MissingField("date"));
        }
        if self.notes.trim().is_empty() {
            return Err(DraftError::MissingField("notes"));
        }
        Ok(())
    }
}

/// Build the calendar appointment mirroring a visit
fn mirrored_appointment(
    state: &HealthState,
    draft: &VisitDraft,
    appointment_id: EntityId,
) -> Appointment {
    let existing = state.appointments.iter().find(|a| a.id == appointment_id);

    let title = if !draft.title.trim().is_empty() {
        draft.title.clone()
    } else {
        draft
            .diagnosis_id
            .as_ref()
            .and_then(|id| state.diagnoses.iter().find(|d| &d.id == id))
            .map(|diagnosis| diagnosis.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_VISIT_TITLE.to_string())
    };

    let time = if draft.time.trim().is_empty() {
        DEFAULT_VISIT_TIME.to_string()
    } else {
        draft.time.clone()
    };

    let mut extra = existing.map(|a| a.extra.clone()).unwrap_or_default();
    extra
        .entry("questions")
        .or_insert_with(|| Value::Array(Vec::new()));

    Appointment {
        id: appointment_id,
        title,
        date: draft.date.clone(),
        time,
        location: draft.location.clone(),
        doctor: draft.doctor.clone(),
        kind: draft.kind.clone(),
        diagnosis_id: draft.diagnosis_id.clone(),
        purpose: draft.purpose.clone(),
        prep_notes: draft.prep_notes.clone(),
        reminder: draft.reminder,
        medications_at_time: snapshot_active_medications(state),
        post_notes: existing.map(|a| a.post_notes.clone()).unwrap_or_default(),
        extra,
    }
}

/// Create or update a visit together with its calendar appointment.
/// Returns the saved visit.
pub fn save_visit(
    store: &AppStore,
    draft: VisitDraft,
    editing: Option<&DoctorVisit>,
) -> Result<DoctorVisit, DraftError> {
    draft.validate()?;
    let state = store.state();

    let appointment_id = editing
        .and_then(|visit| visit.appointment_id.clone())
        .unwrap_or_else(EntityId::generate);
    let appointment = mirrored_appointment(&state, &draft, appointment_id.clone());

    // Upsert: the paired appointment may have been deleted from the calendar
    if state.appointments.iter().any(|a| a.id == appointment_id) {
        store.update_appointment(appointment);
    } else {
        debug!(appointment_id = %appointment_id, "Creating calendar appointment for visit");
        store.add_appointment(appointment);
    }

    let visit = match editing {
        Some(existing) => {
            let visit = DoctorVisit {
                date: draft.date,
                time: draft.time,
                location: draft.location,
                title: draft.title,
                doctor: draft.doctor,
                kind: draft.kind,
                diagnosis_id: draft.diagnosis_id,
                purpose: draft.purpose,
                prep_notes: draft.prep_notes,
                reminder: draft.reminder,
                notes: draft.notes,
                appointment_id: Some(appointment_id),
                ..existing.clone()
            };
            store.update_visit(visit.clone());
            visit
        }
        None => {
            let visit = DoctorVisit {
                id: EntityId::generate(),
                date: draft.date,
                time: draft.time,
                location: draft.location,
                title: draft.title,
                doctor: draft.doctor,
                kind: draft.kind,
                diagnosis_id: draft.diagnosis_id,
                purpose: draft.purpose,
                prep_notes: draft.prep_notes,
                reminder: draft.reminder,
                notes: draft.notes,
                appointment_id: Some(appointment_id),
                created_at: Utc::now().to_rfc3339(),
                ..DoctorVisit::default()
            };
            store.add_visit(visit.clone());
            visit
        }
    };

    Ok(visit)
}

/// Delete a visit, its AI analyses and its calendar appointment
pub fn delete_visit(store: &AppStore, visit: &DoctorVisit) {
    store.delete_visit(visit.id.clone());
    if let Some(appointment_id) = &visit.appointment_id {
        store.delete_appointment(appointment_id.clone());
    }
}
