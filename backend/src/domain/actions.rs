//! # Actions
//!
//! The closed set of state transitions the [`reduce`](super::reducer::reduce)
//! function understands. Every action travels as
//! `{ "type": "ADD_DIAGNOSIS", "payload": ... }` when serialized.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    AiNote, Appointment, Diagnosis, DiaryEntry, DoctorVisit, EntityId, HealthDocument,
    Medication, Note, Notification,
};
use tracing::warn;

use super::state::View;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Switch view; also closes the mobile menu
    SetView(View),

    SetDiagnoses(Vec<Diagnosis>),
    AddDiagnosis(Diagnosis),
    UpdateDiagnosis(Diagnosis),
    DeleteDiagnosis(EntityId),

    SetMedications(Vec<Medication>),
    AddMedication(Medication),
    UpdateMedication(Medication),
    DeleteMedication(EntityId),

    SetDiary(Vec<DiaryEntry>),
    /// Newest entry first
    AddDiaryEntry(DiaryEntry),
    DeleteDiaryEntry(EntityId),

    /// Newest visit first
    AddVisit(DoctorVisit),
    UpdateVisit(DoctorVisit),
    /// Removes the visit and its AI analysis notes
    DeleteVisit(EntityId),

    /// Newest note first
    AddNote(Note),
    UpdateNote(Note),
    DeleteNote(EntityId),

    SetAppointments(Vec<Appointment>),
    AddAppointment(Appointment),
    UpdateAppointment(Appointment),
    DeleteAppointment(EntityId),

    AddNotification(Notification),
    RemoveNotification(EntityId),

    SetLoading(bool),
    SetAiResponse(Option<String>),
    ToggleExportModal,
    ToggleMobileMenu,
    SetSelectedAppointment(Option<Appointment>),

    /// Bulk replace of every collection. Dispatched once, at hydration.
    LoadAllData(HealthDocument),

    #[serde(rename_all = "camelCase")]
    AddAiNote {
        diagnosis_id: EntityId,
        note: AiNote,
    },
    #[serde(rename_all = "camelCase")]
    DeleteAiNote {
        diagnosis_id: EntityId,
        note_id: EntityId,
    },
    #[serde(rename_all = "camelCase")]
    AddMedicationAiNote {
        medication_id: EntityId,
        note: AiNote,
    },
    #[serde(rename_all = "camelCase")]
    DeleteMedicationAiNote {
        medication_id: EntityId,
        note_id: EntityId,
    },
    AddOverallAiNote(AiNote),
    DeleteOverallAiNote(EntityId),
    AddMedicationInteractionNote(AiNote),
    DeleteMedicationInteractionNote(EntityId),

    /// Mark a medication as taken (or not) on a day
    #[serde(rename_all = "camelCase")]
    SetMedicationIntake {
        date: String,
        #[serde(rename = "medId")]
        medication_id: EntityId,
        taken: bool,
    },

    #[serde(rename_all = "camelCase")]
    AddVisitAnalysis {
        visit_id: EntityId,
        note: AiNote,
    },
    #[serde(rename_all = "camelCase")]
    DeleteVisitAnalysis {
        visit_id: EntityId,
        note_id: EntityId,
    },

    /// Any action kind this build does not know. The reducer ignores it.
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Read an action from JSON. Anything that is not a known, well-formed
    /// action becomes [`Action::Unknown`].
    pub fn from_json(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match serde_json::from_value(value) {
            Ok(action) => action,
            Err(e) => {
                warn!(kind = %kind, error = %e, "Ignoring unreadable action");
                Action::Unknown
            }
        }
    }
}
