//! # App Store
//!
//! Owns the single [`HealthState`] and is the only place it is mutated.
//! Components receive a cloned [`AppStore`] handle instead of reaching for a
//! global; observers call [`AppStore::subscribe`] and react to changes.

use chrono::Utc;
use shared::{
    AiNote, Appointment, Diagnosis, DiaryEntry, DoctorVisit, EntityId, HealthDocument,
    Medication, Note, Notification, NotificationKind,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use super::actions::Action;
use super::reducer::reduce;
use super::state::{HealthState, View};

/// How long a regular notification stays visible
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(10);

/// Cloneable handle to the application state
#[derive(Clone)]
pub struct AppStore {
    sender: Arc<watch::Sender<HealthState>>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AppStore {
    pub fn new() -> Self {
        Self::with_state(HealthState::default())
    }

    pub fn with_state(state: HealthState) -> Self {
        let (sender, _) = watch::channel(state);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> HealthState {
        self.sender.borrow().clone()
    }

    /// Receiver that is notified after every dispatch that changed the state
    pub fn subscribe(&self) -> watch::Receiver<HealthState> {
        self.sender.subscribe()
    }

    /// Run an action through the reducer. Returns whether the state changed;
    /// subscribers are only woken when it did.
    pub fn dispatch(&self, action: Action) -> bool {
        self.sender.send_if_modified(|state| {
            let next = reduce(state, action);
            if next.same_as(state) {
                false
            } else {
                *state = next;
                true
            }
        })
    }

    pub fn set_view(&self, view: View) {
        self.dispatch(Action::SetView(view));
    }

    // Diagnoses

    pub fn add_diagnosis(&self, diagnosis: Diagnosis) {
        self.dispatch(Action::AddDiagnosis(diagnosis));
    }

    pub fn update_diagnosis(&self, diagnosis: Diagnosis) {
        self.dispatch(Action::UpdateDiagnosis(diagnosis));
    }

    pub fn delete_diagnosis(&self, id: EntityId) {
        self.dispatch(Action::DeleteDiagnosis(id));
    }

    // Medications

    pub fn add_medication(&self, medication: Medication) {
        self.dispatch(Action::AddMedication(medication));
    }

    pub fn update_medication(&self, medication: Medication) {
        self.dispatch(Action::UpdateMedication(medication));
    }

    pub fn delete_medication(&self, id: EntityId) {
        self.dispatch(Action::DeleteMedication(id));
    }

    pub fn set_medication_intake(&self, date: &str, medication_id: EntityId, taken: bool) {
        self.dispatch(Action::SetMedicationIntake {
            date: date.to_string(),
            medication_id,
            taken,
        });
    }

    // Diary

    pub fn add_diary_entry(&self, entry: DiaryEntry) {
        self.dispatch(Action::AddDiaryEntry(entry));
    }

    pub fn delete_diary_entry(&self, id: EntityId) {
        self.dispatch(Action::DeleteDiaryEntry(id));
    }

    /// Save the diary entry for a day, overwriting whatever entry that day
    /// already had. Returns the id of the entry that was replaced, if any.
    pub fn replace_diary_entry_for_date(&self, entry: DiaryEntry) -> Option<EntityId> {
        let existing = self
            .sender
            .borrow()
            .diary_entries
            .iter()
            .find(|e| e.date == entry.date)
            .map(|e| e.id.clone());

        if let Some(id) = &existing {
            self.dispatch(Action::DeleteDiaryEntry(id.clone()));
        }
        self.dispatch(Action::AddDiaryEntry(entry));
        existing
    }

    // Appointments

    pub fn add_appointment(&self, appointment: Appointment) {
        self.dispatch(Action::AddAppointment(appointment));
    }

    pub fn update_appointment(&self, appointment: Appointment) {
        self.dispatch(Action::UpdateAppointment(appointment));
    }

    pub fn delete_appointment(&self, id: EntityId) {
        self.dispatch(Action::DeleteAppointment(id));
    }

    pub fn set_selected_appointment(&self, appointment: Option<Appointment>) {
        self.dispatch(Action::SetSelectedAppointment(appointment));
    }

    // Doctor visits

    pub fn add_visit(&self, visit: DoctorVisit) {
        self.dispatch(Action::AddVisit(visit));
    }

    pub fn update_visit(&self, visit: DoctorVisit) {
        self.dispatch(Action::UpdateVisit(visit));
    }

    pub fn delete_visit(&self, id: EntityId) {
        self.dispatch(Action::DeleteVisit(id));
    }

    pub fn add_visit_analysis(&self, visit_id: EntityId, note: AiNote) {
        self.dispatch(Action::AddVisitAnalysis { visit_id, note });
    }

    pub fn delete_visit_analysis(&self, visit_id: EntityId, note_id: EntityId) {
        self.dispatch(Action::DeleteVisitAnalysis { visit_id, note_id });
    }

    // Notebook

    pub fn add_note(&self, note: Note) {
        self.dispatch(Action::AddNote(note));
    }

    pub fn update_note(&self, note: Note) {
        self.dispatch(Action::UpdateNote(note));
    }

    pub fn delete_note(&self, id: EntityId) {
        self.dispatch(Action::DeleteNote(id));
    }

    // AI notes

    pub fn add_ai_note(&self, diagnosis_id: EntityId, note: AiNote) {
        self.dispatch(Action::AddAiNote { diagnosis_id, note });
    }

    pub fn delete_ai_note(&self, diagnosis_id: EntityId, note_id: EntityId) {
        self.dispatch(Action::DeleteAiNote {
            diagnosis_id,
            note_id,
        });
    }

    pub fn add_medication_ai_note(&self, medication_id: EntityId, note: AiNote) {
        self.dispatch(Action::AddMedicationAiNote {
            medication_id,
            note,
        });
    }

    pub fn delete_medication_ai_note(&self, medication_id: EntityId, note_id: EntityId) {
        self.dispatch(Action::DeleteMedicationAiNote {
            medication_id,
            note_id,
        });
    }

    pub fn add_overall_ai_note(&self, note: AiNote) {
        self.dispatch(Action::AddOverallAiNote(note));
    }

    pub fn delete_overall_ai_note(&self, id: EntityId) {
        self.dispatch(Action::DeleteOverallAiNote(id));
    }

    pub fn add_medication_interaction_note(&self, note: AiNote) {
        self.dispatch(Action::AddMedicationInteractionNote(note));
    }

    pub fn delete_medication_interaction_note(&self, id: EntityId) {
        self.dispatch(Action::DeleteMedicationInteractionNote(id));
    }

    // UI

    pub fn set_loading(&self, loading: bool) {
        self.dispatch(Action::SetLoading(loading));
    }

    pub fn set_ai_response(&self, response: Option<String>) {
        self.dispatch(Action::SetAiResponse(response));
    }

    pub fn toggle_export_modal(&self) {
        self.dispatch(Action::ToggleExportModal);
    }

    pub fn toggle_mobile_menu(&self) {
        self.dispatch(Action::ToggleMobileMenu);
    }

    pub fn load_all_data(&self, document: HealthDocument) {
        self.dispatch(Action::LoadAllData(document));
    }

    pub fn remove_notification(&self, id: EntityId) {
        self.dispatch(Action::RemoveNotification(id));
    }

    /// Show a notification and remove it again after [`NOTIFICATION_TTL`]
    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind) -> EntityId {
        self.notify_for(message, kind, NOTIFICATION_TTL)
    }

    /// Show a notification that disappears after `ttl`.
    ///
    /// Removal needs a Tokio runtime; without one the notification stays
    /// until [`AppStore::remove_notification`] is called.
    pub fn notify_for(
        &self,
        message: impl Into<String>,
        kind: NotificationKind,
        ttl: Duration,
    ) -> EntityId {
        let id = EntityId::generate();
        self.dispatch(Action::AddNotification(Notification {
            id: id.clone(),
            message: message.into(),
            kind,
            time: Utc::now(),
        }));

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = self.clone();
                let expired = id.clone();
                handle.spawn(async move {
                    tokio::time::sleep(ttl).await;
                    store.remove_notification(expired);
                });
            }
            Err(_) => debug!(notification_id = %id, "No runtime, notification will not expire"),
        }

        id
    }
}
