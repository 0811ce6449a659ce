//! Coerces loosely shaped JSON (local storage, remote profiles, demo data)
//! into a [`HealthDocument`] whose collections always have their container
//! shape. Nothing here fails: missing or malformed fields become empty lists
//! or maps, unreadable list elements are dropped.

use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{AiNote, AiNoteMap, DayIntake, EntityId, HealthDocument, MedicationLog};
use tracing::warn;

use super::state::Slice;

/// Legacy field name older documents used for the diary
const LEGACY_DIARY_FIELD: &str = "diary";

/// Build a document from any JSON value
pub fn normalize_document(raw: &Value) -> HealthDocument {
    let field = |slice: Slice| document_field(raw, slice);

    HealthDocument {
        diagnoses: list(field(Slice::Diagnoses), "diagnoses"),
        medications: list(field(Slice::Medications), "medications"),
        diary_entries: list(field(Slice::DiaryEntries), "diaryEntries"),
        appointments: list(field(Slice::Appointments), "appointments"),
        ai_notes: note_map(field(Slice::AiNotes), "aiNotes"),
        medication_ai_notes: note_map(field(Slice::MedicationAiNotes), "medicationAiNotes"),
        medication_interaction_notes: list(
            field(Slice::MedicationInteractionNotes),
            "medicationInteractionNotes",
        ),
        overall_ai_notes: list(field(Slice::OverallAiNotes), "overallAiNotes"),
        medication_log: medication_log(field(Slice::MedicationLog)),
        doctor_visits: list(field(Slice::DoctorVisits), "doctorVisits"),
        visit_ai_notes: note_map(field(Slice::VisitAiNotes), "visitAiNotes"),
        notes: list(field(Slice::Notes), "notes"),
    }
}

fn document_field(raw: &Value, slice: Slice) -> Option<&Value> {
    let value = raw.get(slice.document_field());
    if slice != Slice::DiaryEntries {
        return value;
    }
    match value {
        None | Some(Value::Null) => raw.get(LEGACY_DIARY_FIELD),
        Some(value) if !value.is_array() => raw
            .get(LEGACY_DIARY_FIELD)
            .filter(|legacy| legacy.is_array())
            .or(Some(value)),
        _ => value,
    }
}

/// True for anything but a non-empty object: a profile that was never
/// written, or one whose data cannot hold collections
pub fn is_blank_document(raw: Option<&Value>) -> bool {
    match raw {
        Some(Value::Object(fields)) => fields.is_empty(),
        _ => true,
    }
}

fn list<T: DeserializeOwned>(value: Option<&Value>, field: &str) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match T::deserialize(item) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!(field, index, error = %e, "Dropping unreadable element");
                    None
                }
            })
            .collect(),
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            warn!(field, found = json_kind(other), "Expected a list, using empty");
            Vec::new()
        }
    }
}

fn note_map(value: Option<&Value>, field: &str) -> AiNoteMap {
    let Some(value) = value else {
        return AiNoteMap::new();
    };
    let Value::Object(owners) = value else {
        if !value.is_null() {
            warn!(field, found = json_kind(value), "Expected a map, using empty");
        }
        return AiNoteMap::new();
    };

    owners
        .iter()
        .filter_map(|(owner, notes)| {
            let notes: Vec<AiNote> = list(Some(notes), field);
            (!notes.is_empty()).then(|| (EntityId::new(owner.clone()), notes))
        })
        .collect()
}

fn medication_log(value: Option<&Value>) -> MedicationLog {
    let Some(Value::Object(days)) = value else {
        if let Some(other) = value.filter(|v| !v.is_null()) {
            warn!(field = "medicationLog", found = json_kind(other), "Expected a map, using empty");
        }
        return MedicationLog::new();
    };

    days.iter()
        .filter_map(|(date, day)| {
            let taken: DayIntake = day
                .as_object()
                .map(|meds| {
                    meds.iter()
                        .filter(|(_, taken)| taken.as_bool() == Some(true))
                        .map(|(id, _)| (EntityId::new(id.clone()), true))
                        .collect()
                })
                .unwrap_or_default();
            (!taken.is_empty()).then(|| (date.clone(), taken))
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_and_malformed_fields_default() {
        let document = normalize_document(&json!({
            "diagnoses": [{ "id": "d1", "name": "Astma" }],
            "notes": "oops",
            "aiNotes": [1, 2, 3],
            "medicationLog": null
        }));

        assert_eq!(document.diagnoses.len(), 1);
        assert!(document.notes.is_empty());
        assert!(document.ai_notes.is_empty());
        assert!(document.medication_log.is_empty());
        assert!(document.doctor_visits.is_empty());
    }

    #[test]
    fn test_missing_notes_field() {
        let document = normalize_document(&json!({ "diagnoses": [] }));
        assert!(document.notes.is_empty());
    }

    #[test]
    fn test_non_object_input() {
        assert!(normalize_document(&json!(null)).is_empty());
        assert!(normalize_document(&json!([1, 2])).is_empty());
        assert!(normalize_document(&json!("text")).is_empty());
    }

    #[test]
    fn test_legacy_diary_alias() {
        let document = normalize_document(&json!({
            "diary": [{ "id": "e1", "date": "2024-05-16", "mood": 4 }]
        }));
        assert_eq!(document.diary_entries.len(), 1);
        assert_eq!(document.diary_entries[0].mood.value(), 4);

        // The current field wins when both are present
        let document = normalize_document(&json!({
            "diaryEntries": [],
            "diary": [{ "id": "e1" }]
        }));
        assert!(document.diary_entries.is_empty());
    }

    #[test]
    fn test_unreadable_elements_are_dropped() {
        let document = normalize_document(&json!({
            "medications": [
                { "id": "m1", "name": "Levaxin" },
                "not a medication",
                { "id": "m2", "times": "08:00" }
            ]
        }));
        assert_eq!(document.medications.len(), 1);
        assert_eq!(document.medications[0].id.as_str(), "m1");
    }

    #[test]
    fn test_maps_stay_sparse() {
        let document = normalize_document(&json!({
            "visitAiNotes": {
                "v1": [{ "id": "a1", "question": "Q", "answer": "A" }],
                "v2": [],
                "v3": "broken"
            },
            "medicationLog": {
                "2024-05-16": { "m1": true, "m2": false },
                "2024-05-17": {},
                "2024-05-18": { "m3": false }
            }
        }));

        assert_eq!(document.visit_ai_notes.len(), 1);
        assert!(document.visit_ai_notes.contains_key(&EntityId::from("v1")));

        assert_eq!(document.medication_log.len(), 1);
        assert_eq!(document.medication_log["2024-05-16"].len(), 1);
    }

    #[test]
    fn test_blank_document_detection() {
        assert!(is_blank_document(None));
        assert!(is_blank_document(Some(&json!(null))));
        assert!(is_blank_document(Some(&json!({}))));
        assert!(is_blank_document(Some(&json!([]))));
        assert!(is_blank_document(Some(&json!([{ "id": "d1" }]))));
        assert!(is_blank_document(Some(&json!("text"))));
        assert!(!is_blank_document(Some(&json!({ "notes": [] }))));
    }

    #[test]
    fn test_round_trip_keeps_nulls_and_custom_kinds() {
        let raw = json!({
            "diagnoses": [{ "id": "d1", "name": "Astma", "doctor": null }],
            "appointments": [{ "id": "a1", "type": "consultation", "time": null }]
        });
        let document = normalize_document(&raw);
        assert_eq!(document.diagnoses.len(), 1);
        assert_eq!(document.appointments.len(), 1);

        let written = serde_json::to_value(&document).unwrap();
        assert_eq!(written["diagnoses"][0]["name"], json!("Astma"));
        assert_eq!(written["appointments"][0]["type"], json!("consultation"));
    }
}
