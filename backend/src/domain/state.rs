//! # Application State
//!
//! The single in-memory state owned by the [`AppStore`](super::store::AppStore).
//!
//! Every collection sits behind its own `Arc`. The reducer never mutates a
//! previous state: a slice an action does not touch keeps the same allocation,
//! so "did this slice change" is a pointer comparison (see
//! [`HealthState::changed_slices`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    AiNote, AiNoteMap, Appointment, Diagnosis, DiaryEntry, DoctorVisit, HealthDocument,
    Medication, MedicationLog, Note, Notification,
};
use std::sync::Arc;

/// Top-level views of the application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Dashboard,
    Calendar,
    Medications,
    Diagnoses,
    Diary,
    Reminders,
    Questions,
    Analysis,
    Notebook,
    Visits,
    Profile,
}

/// One persisted collection of the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slice {
    Diagnoses,
    Medications,
    DiaryEntries,
    Appointments,
    AiNotes,
    MedicationAiNotes,
    MedicationInteractionNotes,
    OverallAiNotes,
    MedicationLog,
    DoctorVisits,
    VisitAiNotes,
    Notes,
}

impl Slice {
    pub const ALL: [Slice; 12] = [
        Slice::Diagnoses,
        Slice::Medications,
        Slice::DiaryEntries,
        Slice::Appointments,
        Slice::AiNotes,
        Slice::MedicationAiNotes,
        Slice::MedicationInteractionNotes,
        Slice::OverallAiNotes,
        Slice::MedicationLog,
        Slice::DoctorVisits,
        Slice::VisitAiNotes,
        Slice::Notes,
    ];

    /// Local storage key, without the application prefix.
    /// Diary entries keep their historical key `diary`.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Slice::Diagnoses => "diagnoses",
            Slice::Medications => "medications",
            Slice::DiaryEntries => "diary",
            Slice::Appointments => "appointments",
            Slice::AiNotes => "aiNotes",
            Slice::MedicationAiNotes => "medicationAiNotes",
            Slice::MedicationInteractionNotes => "medicationInteractionNotes",
            Slice::OverallAiNotes => "overallAiNotes",
            Slice::MedicationLog => "medicationLog",
            Slice::DoctorVisits => "doctorVisits",
            Slice::VisitAiNotes => "visitAiNotes",
            Slice::Notes => "notes",
        }
    }

    /// Field name in the remote document
    pub fn document_field(&self) -> &'static str {
        match self {
            Slice::DiaryEntries => "diaryEntries",
            other => other.storage_key(),
        }
    }
}

/// Application state: domain collections plus transient UI flags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthState {
    pub active_view: View,
    pub is_loading: bool,
    pub ai_response: Option<String>,
    pub show_export_modal: bool,
    pub mobile_menu_open: bool,
    pub selected_appointment: Option<Appointment>,
    pub notifications: Arc<Vec<Notification>>,

    pub diagnoses: Arc<Vec<Diagnosis>>,
    pub medications: Arc<Vec<Medication>>,
    pub diary_entries: Arc<Vec<DiaryEntry>>,
    pub appointments: Arc<Vec<Appointment>>,
    pub ai_notes: Arc<AiNoteMap>,
    pub medication_ai_notes: Arc<AiNoteMap>,
    pub medication_interaction_notes: Arc<Vec<AiNote>>,
    pub overall_ai_notes: Arc<Vec<AiNote>>,
    pub medication_log: Arc<MedicationLog>,
    pub doctor_visits: Arc<Vec<DoctorVisit>>,
    pub visit_ai_notes: Arc<AiNoteMap>,
    pub notes: Arc<Vec<Note>>,
}

impl HealthState {
    /// Full dataset for upload; the UI flags are not part of it
    pub fn to_document(&self) -> HealthDocument {
        HealthDocument {
            diagnoses: self.diagnoses.as_ref().clone(),
            medications: self.medications.as_ref().clone(),
            diary_entries: self.diary_entries.as_ref().clone(),
            appointments: self.appointments.as_ref().clone(),
            ai_notes: self.ai_notes.as_ref().clone(),
            medication_ai_notes: self.medication_ai_notes.as_ref().clone(),
            medication_interaction_notes: self.medication_interaction_notes.as_ref().clone(),
            overall_ai_notes: self.overall_ai_notes.as_ref().clone(),
            medication_log: self.medication_log.as_ref().clone(),
            doctor_visits: self.doctor_visits.as_ref().clone(),
            visit_ai_notes: self.visit_ai_notes.as_ref().clone(),
            notes: self.notes.as_ref().clone(),
        }
    }

    /// JSON value of a single collection, as written to its storage key
    pub fn slice_json(&self, slice: Slice) -> serde_json::Result<Value> {
        match slice {
            Slice::Diagnoses => serde_json::to_value(self.diagnoses.as_ref()),
            Slice::Medications => serde_json::to_value(self.medications.as_ref()),
            Slice::DiaryEntries => serde_json::to_value(self.diary_entries.as_ref()),
            Slice::Appointments => serde_json::to_value(self.appointments.as_ref()),
            Slice::AiNotes => serde_json::to_value(self.ai_notes.as_ref()),
            Slice::MedicationAiNotes => serde_json::to_value(self.medication_ai_notes.as_ref()),
            Slice::MedicationInteractionNotes => {
                serde_json::to_value(self.medication_interaction_notes.as_ref())
            }
            Slice::OverallAiNotes => serde_json::to_value(self.overall_ai_notes.as_ref()),
            Slice::MedicationLog => serde_json::to_value(self.medication_log.as_ref()),
            Slice::DoctorVisits => serde_json::to_value(self.doctor_visits.as_ref()),
            Slice::VisitAiNotes => serde_json::to_value(self.visit_ai_notes.as_ref()),
            Slice::Notes => serde_json::to_value(self.notes.as_ref()),
        }
    }

    fn slice_is(&self, other: &HealthState, slice: Slice) -> bool {
        match slice {
            Slice::Diagnoses => Arc::ptr_eq(&self.diagnoses, &other.diagnoses),
            Slice::Medications => Arc::ptr_eq(&self.medications, &other.medications),
            Slice::DiaryEntries => Arc::ptr_eq(&self.diary_entries, &other.diary_entries),
            Slice::Appointments => Arc::ptr_eq(&self.appointments, &other.appointments),
            Slice::AiNotes => Arc::ptr_eq(&self.ai_notes, &other.ai_notes),
            Slice::MedicationAiNotes => {
                Arc::ptr_eq(&self.medication_ai_notes, &other.medication_ai_notes)
            }
            Slice::MedicationInteractionNotes => Arc::ptr_eq(
                &self.medication_interaction_notes,
                &other.medication_interaction_notes,
            ),
            Slice::OverallAiNotes => Arc::ptr_eq(&self.overall_ai_notes, &other.overall_ai_notes),
            Slice::MedicationLog => Arc::ptr_eq(&self.medication_log, &other.medication_log),
            Slice::DoctorVisits => Arc::ptr_eq(&self.doctor_visits, &other.doctor_visits),
            Slice::VisitAiNotes => Arc::ptr_eq(&self.visit_ai_notes, &other.visit_ai_notes),
            Slice::Notes => Arc::ptr_eq(&self.notes, &other.notes),
        }
    }

    /// Collections whose allocation differs from `previous`
    pub fn changed_slices(&self, previous: &HealthState) -> Vec<Slice> {
        Slice::ALL
            .into_iter()
            .filter(|slice| !self.slice_is(previous, *slice))
            .collect()
    }

    /// Cheap identity check: same UI flags and the very same collection allocations
    pub fn same_as(&self, other: &HealthState) -> bool {
        self.active_view == other.active_view
            && self.is_loading == other.is_loading
            && self.ai_response == other.ai_response
            && self.show_export_modal == other.show_export_modal
            && self.mobile_menu_open == other.mobile_menu_open
            && self.selected_appointment == other.selected_appointment
            && Arc::ptr_eq(&self.notifications, &other.notifications)
            && self.changed_slices(other).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::EntityId;

    #[test]
    fn test_storage_keys_and_document_fields() {
        assert_eq!(Slice::DiaryEntries.storage_key(), "diary");
        assert_eq!(Slice::DiaryEntries.document_field(), "diaryEntries");
        assert_eq!(Slice::MedicationLog.storage_key(), "medicationLog");
    }

    #[test]
    fn test_changed_slices_uses_identity() {
        let state = HealthState::default();
        let mut next = state.clone();
        assert!(next.changed_slices(&state).is_empty());
        assert!(next.same_as(&state));

        // Equal content in a new allocation still counts as a change
        next.notes = Arc::new(Vec::new());
        assert_eq!(next.changed_slices(&state), vec![Slice::Notes]);
        assert_eq!(next, state);
    }

    #[test]
    fn test_to_document_copies_collections() {
        let state = HealthState {
            diagnoses: Arc::new(vec![Diagnosis {
                id: EntityId::from("d1"),
                name: "Hypotyreos".to_string(),
                ..Diagnosis::default()
            }]),
            is_loading: true,
            ..HealthState::default()
        };

        let document = state.to_document();
        assert_eq!(document.diagnoses.len(), 1);
        assert_eq!(document.diagnoses[0].name, "Hypotyreos");
        assert!(document.notes.is_empty());
    }

    #[test]
    fn test_slice_json_shapes() {
        let state = HealthState::default();
        assert!(state.slice_json(Slice::Diagnoses).unwrap().is_array());
        assert!(state.slice_json(Slice::MedicationLog).unwrap().is_object());
    }
}
