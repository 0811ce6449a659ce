//! # Reducer
//!
//! Pure state transition function. [`reduce`] takes the current state and an
//! action and returns the next state without touching the previous one and
//! without any I/O.
//!
//! ## Key Responsibilities
//! - **Structural sharing**: untouched collections keep their `Arc`
//! - **No-op detection**: update/delete misses return the same allocation,
//!   so observers see no change
//! - **Sparse maps**: per-owner note lists and per-day intake maps never stay
//!   behind empty; their key is removed instead

use shared::{AiNote, AiNoteMap, EntityId, Identified};
use std::sync::Arc;

use super::actions::Action;
use super::state::HealthState;

/// Apply one action to the state
pub fn reduce(state: &HealthState, action: Action) -> HealthState {
    let mut next = state.clone();

    match action {
        Action::SetView(view) => {
            next.active_view = view;
            next.mobile_menu_open = false;
        }

        Action::SetDiagnoses(diagnoses) => next.diagnoses = Arc::new(diagnoses),
        Action::AddDiagnosis(diagnosis) => next.diagnoses = appended(&state.diagnoses, diagnosis),
        Action::UpdateDiagnosis(diagnosis) => {
            next.diagnoses = replaced(&state.diagnoses, diagnosis)
        }
        Action::DeleteDiagnosis(id) => next.diagnoses = removed(&state.diagnoses, &id),

        Action::SetMedications(medications) => next.medications = Arc::new(medications),
        Action::AddMedication(medication) => {
            next.medications = appended(&state.medications, medication)
        }
        Action::UpdateMedication(medication) => {
            next.medications = replaced(&state.medications, medication)
        }
        Action::DeleteMedication(id) => next.medications = removed(&state.medications, &id),

        Action::SetDiary(entries) => next.diary_entries = Arc::new(entries),
        Action::AddDiaryEntry(entry) => next.diary_entries = prepended(&state.diary_entries, entry),
        Action::DeleteDiaryEntry(id) => next.diary_entries = removed(&state.diary_entries, &id),

        Action::AddVisit(visit) => next.doctor_visits = prepended(&state.doctor_visits, visit),
        Action::UpdateVisit(visit) => next.doctor_visits = replaced(&state.doctor_visits, visit),
        Action::DeleteVisit(id) => {
            next.doctor_visits = removed(&state.doctor_visits, &id);
            if state.visit_ai_notes.contains_key(&id) {
                let mut notes = state.visit_ai_notes.as_ref().clone();
                notes.remove(&id);
                next.visit_ai_notes = Arc::new(notes);
            }
        }

        Action::AddNote(note) => next.notes = prepended(&state.notes, note),
        Action::UpdateNote(note) => next.notes = replaced(&state.notes, note),
        Action::DeleteNote(id) => next.notes = removed(&state.notes, &id),

        Action::SetAppointments(appointments) => next.appointments = Arc::new(appointments),
        Action::AddAppointment(appointment) => {
            next.appointments = appended(&state.appointments, appointment)
        }
        Action::UpdateAppointment(appointment) => {
            next.appointments = replaced(&state.appointments, appointment)
        }
        Action::DeleteAppointment(id) => next.appointments = removed(&state.appointments, &id),

        Action::AddNotification(notification) => {
            let mut notifications = state.notifications.as_ref().clone();
            notifications.push(notification);
            next.notifications = Arc::new(notifications);
        }
        Action::RemoveNotification(id) => {
            if state.notifications.iter().any(|n| n.id == id) {
                next.notifications = Arc::new(
                    state
                        .notifications
                        .iter()
                        .filter(|n| n.id != id)
                        .cloned()
                        .collect(),
                );
            }
        }

        Action::SetLoading(loading) => next.is_loading = loading,
        Action::SetAiResponse(response) => next.ai_response = response,
        Action::ToggleExportModal => next.show_export_modal = !state.show_export_modal,
        Action::ToggleMobileMenu => next.mobile_menu_open = !state.mobile_menu_open,
        Action::SetSelectedAppointment(appointment) => next.selected_appointment = appointment,

        Action::LoadAllData(document) => {
            // Re-loading identical content keeps the existing allocations
            keep_or_replace(&mut next.diagnoses, document.diagnoses);
            keep_or_replace(&mut next.medications, document.medications);
            keep_or_replace(&mut next.diary_entries, document.diary_entries);
            keep_or_replace(&mut next.appointments, document.appointments);
            keep_or_replace(&mut next.ai_notes, document.ai_notes);
            keep_or_replace(&mut next.medication_ai_notes, document.medication_ai_notes);
            keep_or_replace(
                &mut next.medication_interaction_notes,
                document.medication_interaction_notes,
            );
            keep_or_replace(&mut next.overall_ai_notes, document.overall_ai_notes);
            keep_or_replace(&mut next.medication_log, document.medication_log);
            keep_or_replace(&mut next.doctor_visits, document.doctor_visits);
            keep_or_replace(&mut next.visit_ai_notes, document.visit_ai_notes);
            keep_or_replace(&mut next.notes, document.notes);
        }

        Action::AddAiNote { diagnosis_id, note } => {
            next.ai_notes = with_owner_note(&state.ai_notes, diagnosis_id, note)
        }
        Action::DeleteAiNote {
            diagnosis_id,
            note_id,
        } => next.ai_notes = without_owner_note(&state.ai_notes, &diagnosis_id, &note_id),
        Action::AddMedicationAiNote {
            medication_id,
            note,
        } => {
            next.medication_ai_notes =
                with_owner_note(&state.medication_ai_notes, medication_id, note)
        }
        Action::DeleteMedicationAiNote {
            medication_id,
            note_id,
        } => {
            next.medication_ai_notes =
                without_owner_note(&state.medication_ai_notes, &medication_id, &note_id)
        }
        Action::AddOverallAiNote(note) => {
            next.overall_ai_notes = appended(&state.overall_ai_notes, note)
        }
        Action::DeleteOverallAiNote(id) => {
            next.overall_ai_notes = removed(&state.overall_ai_notes, &id)
        }
        Action::AddMedicationInteractionNote(note) => {
            next.medication_interaction_notes =
                appended(&state.medication_interaction_notes, note)
        }
        Action::DeleteMedicationInteractionNote(id) => {
            next.medication_interaction_notes =
                removed(&state.medication_interaction_notes, &id)
        }

        Action::SetMedicationIntake {
            date,
            medication_id,
            taken,
        } => {
            let current = state
                .medication_log
                .get(&date)
                .and_then(|day| day.get(&medication_id))
                .copied()
                .unwrap_or(false);

            if current != taken {
                let mut log = state.medication_log.as_ref().clone();
                let mut day = log.remove(&date).unwrap_or_default();
                if taken {
                    day.insert(medication_id, true);
                } else {
                    day.remove(&medication_id);
                }
                if !day.is_empty() {
                    log.insert(date, day);
                }
                next.medication_log = Arc::new(log);
            }
        }

        Action::AddVisitAnalysis { visit_id, note } => {
            next.visit_ai_notes = with_owner_note(&state.visit_ai_notes, visit_id, note)
        }
        Action::DeleteVisitAnalysis { visit_id, note_id } => {
            next.visit_ai_notes = without_owner_note(&state.visit_ai_notes, &visit_id, &note_id)
        }

        Action::Unknown => {}
    }

    next
}

fn appended<T: Clone>(items: &Arc<Vec<T>>, item: T) -> Arc<Vec<T>> {
    let mut list = Vec::with_capacity(items.len() + 1);
    list.extend(items.iter().cloned());
    list.push(item);
    Arc::new(list)
}

fn prepended<T: Clone>(items: &Arc<Vec<T>>, item: T) -> Arc<Vec<T>> {
    let mut list = Vec::with_capacity(items.len() + 1);
    list.push(item);
    list.extend(items.iter().cloned());
    Arc::new(list)
}

fn replaced<T: Clone + Identified>(items: &Arc<Vec<T>>, item: T) -> Arc<Vec<T>> {
    if !items.iter().any(|existing| existing.id() == item.id()) {
        return Arc::clone(items);
    }
    Arc::new(
        items
            .iter()
            .map(|existing| {
                if existing.id() == item.id() {
                    item.clone()
                } else {
                    existing.clone()
                }
            })
            .collect(),
    )
}

fn removed<T: Clone + Identified>(items: &Arc<Vec<T>>, id: &EntityId) -> Arc<Vec<T>> {
    if !items.iter().any(|existing| existing.id() == id) {
        return Arc::clone(items);
    }
    Arc::new(
        items
            .iter()
            .filter(|existing| existing.id() != id)
            .cloned()
            .collect(),
    )
}

fn keep_or_replace<T: PartialEq>(slot: &mut Arc<T>, value: T) {
    if slot.as_ref() != &value {
        *slot = Arc::new(value);
    }
}

fn with_owner_note(notes: &Arc<AiNoteMap>, owner: EntityId, note: AiNote) -> Arc<AiNoteMap> {
    let mut map = notes.as_ref().clone();
    map.entry(owner).or_default().push(note);
    Arc::new(map)
}

fn without_owner_note(
    notes: &Arc<AiNoteMap>,
    owner: &EntityId,
    note_id: &EntityId,
) -> Arc<AiNoteMap> {
    let Some(list) = notes.get(owner) else {
        return Arc::clone(notes);
    };
    if !list.iter().any(|note| &note.id == note_id) {
        return Arc::clone(notes);
    }

    let remaining: Vec<AiNote> = list.iter().filter(|note| &note.id != note_id).cloned().collect();
    let mut map = notes.as_ref().clone();
    if remaining.is_empty() {
        map.remove(owner);
    } else {
        map.insert(owner.clone(), remaining);
    }
    Arc::new(map)
}
