use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Opaque identifier shared by every record in the health dataset.
///
/// Older clients wrote numeric ids (epoch millis), newer ones write strings;
/// both are accepted on input and the id is always written back as a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => EntityId(text),
            RawId::Signed(n) => EntityId(n.to_string()),
            RawId::Unsigned(n) => EntityId(n.to_string()),
        })
    }
}

/// Forms submit `""` for "no link"; treat it the same as an absent reference.
fn empty_id_as_none<'de, D>(deserializer: D) -> Result<Option<EntityId>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = Option::<EntityId>::deserialize(deserializer)?;
    Ok(id.filter(|id| !id.is_empty()))
}

fn default_true() -> bool {
    true
}

/// Other clients write `null` for cleared fields; read it as the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Text field that older clients sometimes wrote as a number or a bool
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!("expected text, found {}", other))),
    }
}

fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// Records that live in an id-addressed collection
pub trait Identified {
    fn id(&self) -> &EntityId;
}

macro_rules! identified {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identified for $ty {
                fn id(&self) -> &EntityId {
                    &self.id
                }
            }
        )*
    };
}

/// A diagnosis the user has registered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Diagnosis {
    #[serde(deserialize_with = "null_as_default")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    /// Date of diagnosis (YYYY-MM-DD)
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub doctor: String,
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(deserialize_with = "lenient_string")]
    pub treatment: String,
    /// Fields written by other clients that this model does not know about
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Medication {
    #[serde(deserialize_with = "null_as_default")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub dosage: String,
    /// Intake times as HH:MM, in the order the user entered them
    #[serde(deserialize_with = "null_as_default")]
    pub times: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub instructions: String,
    #[serde(deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub active: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub reminder: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Medication {
    fn default() -> Self {
        Self {
            id: EntityId::default(),
            name: String::new(),
            dosage: String::new(),
            times: Vec::new(),
            instructions: String::new(),
            start_date: String::new(),
            active: true,
            reminder: false,
            extra: Map::new(),
        }
    }
}

/// Copy of a medication taken when an appointment is saved.
/// Never updated when the medication itself changes later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MedicationSnapshot {
    #[serde(deserialize_with = "empty_id_as_none", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub dosage: String,
    #[serde(deserialize_with = "null_as_default")]
    pub times: Vec<String>,
}

impl From<&Medication> for MedicationSnapshot {
    fn from(medication: &Medication) -> Self {
        Self {
            id: Some(medication.id.clone()),
            name: medication.name.clone(),
            dosage: medication.dosage.clone(),
            times: medication.times.clone(),
        }
    }
}

/// Kind of appointment, used for calendar colouring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AppointmentType {
    #[default]
    Checkup,
    Specialist,
    Test,
    Surgery,
    Followup,
    Other,
    /// Kind written by another client; kept verbatim so it is written back unchanged
    Custom(String),
}

impl AppointmentType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "checkup" => AppointmentType::Checkup,
            "specialist" => AppointmentType::Specialist,
            "test" => AppointmentType::Test,
            "surgery" => AppointmentType::Surgery,
            "followup" => AppointmentType::Followup,
            "other" => AppointmentType::Other,
            custom => AppointmentType::Custom(custom.to_string()),
        }
    }

    /// Wire value of the kind
    pub fn as_str(&self) -> &str {
        match self {
            AppointmentType::Checkup => "checkup",
            AppointmentType::Specialist => "specialist",
            AppointmentType::Test => "test",
            AppointmentType::Surgery => "surgery",
            AppointmentType::Followup => "followup",
            AppointmentType::Other => "other",
            AppointmentType::Custom(custom) => custom,
        }
    }

    /// Swedish label shown in forms
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentType::Checkup => "Rutinkontroll",
            AppointmentType::Specialist => "Specialistbesök",
            AppointmentType::Test => "Provtagning",
            AppointmentType::Surgery => "Operation/Ingrepp",
            AppointmentType::Followup => "Uppföljning",
            AppointmentType::Other | AppointmentType::Custom(_) => "Annat",
        }
    }
}

impl Serialize for AppointmentType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppointmentType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.is_empty() => AppointmentType::parse(&raw),
            _ => AppointmentType::default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Appointment {
    #[serde(deserialize_with = "null_as_default")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    /// Appointment day (YYYY-MM-DD)
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    /// Start time (HH:MM)
    #[serde(deserialize_with = "lenient_string")]
    pub time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(deserialize_with = "lenient_string")]
    pub doctor: String,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    #[serde(deserialize_with = "empty_id_as_none", skip_serializing_if = "Option::is_none")]
    pub diagnosis_id: Option<EntityId>,
    #[serde(deserialize_with = "lenient_string")]
    pub purpose: String,
    #[serde(deserialize_with = "lenient_string")]
    pub prep_notes: String,
    #[serde(deserialize_with = "lenient_string")]
    pub post_notes: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reminder: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub medications_at_time: Vec<MedicationSnapshot>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Mood on a 1 (very bad) to 5 (very good) scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Mood(u8);

impl Mood {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Clamp into the 1..=5 scale
    pub fn new(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> &'static str {
        match self.0 {
            1 => "Mycket dåligt",
            2 => "Dåligt",
            4 => "Bra",
            5 => "Mycket bra",
            _ => "Okej",
        }
    }
}

impl Default for Mood {
    fn default() -> Self {
        Self(3)
    }
}

impl<'de> Deserialize<'de> for Mood {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Anything that is not a number falls back to the neutral mood
        let value = Value::deserialize(deserializer)?;
        Ok(match value.as_f64() {
            Some(n) => Mood::new(n.round() as i64),
            None => Mood::default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiaryEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    pub mood: Mood,
    #[serde(deserialize_with = "null_as_default")]
    pub symptoms: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub notes: String,
    #[serde(deserialize_with = "empty_id_as_none", skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<EntityId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A visit the user has had with a doctor. Each visit mirrors into a
/// calendar appointment referenced by `appointment_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DoctorVisit {
    #[serde(deserialize_with = "null_as_default")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub time: String,
    #[serde(deserialize_with = "lenient_string")]
    pub location: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub doctor: String,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    #[serde(deserialize_with = "empty_id_as_none", skip_serializing_if = "Option::is_none")]
    pub diagnosis_id: Option<EntityId>,
    #[serde(deserialize_with = "empty_id_as_none", skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<EntityId>,
    #[serde(deserialize_with = "lenient_string")]
    pub purpose: String,
    #[serde(deserialize_with = "lenient_string")]
    pub prep_notes: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reminder: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub notes: String,
    #[serde(deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Freeform notebook entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Note {
    #[serde(deserialize_with = "null_as_default")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub content: String,
    /// RFC 3339 creation timestamp
    #[serde(deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Note {
    /// Day the note belongs to: its explicit date, else the day it was created
    pub fn day(&self) -> &str {
        if !self.date.is_empty() {
            &self.date
        } else {
            self.created_at.split('T').next().unwrap_or_default()
        }
    }
}

/// Saved question/answer pair from the AI assistant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiNote {
    #[serde(deserialize_with = "null_as_default")]
    pub id: EntityId,
    #[serde(deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(deserialize_with = "lenient_string")]
    pub answer: String,
    #[serde(deserialize_with = "lenient_string")]
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

identified!(Diagnosis, Medication, Appointment, DiaryEntry, DoctorVisit, Note, AiNote);

/// AI notes keyed by the id of the record they were asked about
pub type AiNoteMap = BTreeMap<EntityId, Vec<AiNote>>;

/// Medications taken on one day: medication id -> true
pub type DayIntake = BTreeMap<EntityId, bool>;

/// Intake log keyed by day (YYYY-MM-DD). A day with no intake has no key.
pub type MedicationLog = BTreeMap<String, DayIntake>;

/// The complete dataset of one profile, as stored locally and remotely
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDocument {
    pub diagnoses: Vec<Diagnosis>,
    pub medications: Vec<Medication>,
    pub diary_entries: Vec<DiaryEntry>,
    pub appointments: Vec<Appointment>,
    pub ai_notes: AiNoteMap,
    pub medication_ai_notes: AiNoteMap,
    pub medication_interaction_notes: Vec<AiNote>,
    pub overall_ai_notes: Vec<AiNote>,
    pub medication_log: MedicationLog,
    pub doctor_visits: Vec<DoctorVisit>,
    pub visit_ai_notes: AiNoteMap,
    pub notes: Vec<Note>,
}

impl HealthDocument {
    /// True when no collection holds anything
    pub fn is_empty(&self) -> bool {
        self.diagnoses.is_empty()
            && self.medications.is_empty()
            && self.diary_entries.is_empty()
            && self.appointments.is_empty()
            && self.ai_notes.is_empty()
            && self.medication_ai_notes.is_empty()
            && self.medication_interaction_notes.is_empty()
            && self.overall_ai_notes.is_empty()
            && self.medication_log.is_empty()
            && self.doctor_visits.is_empty()
            && self.visit_ai_notes.is_empty()
            && self.notes.is_empty()
    }
}

/// Severity/kind of a transient UI notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Appointment,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: EntityId,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub time: chrono::DateTime<chrono::Utc>,
}

/// Body sent to the AI proxy endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub options: AiOptions,
}

/// Per-request overrides for the completion call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl AiOptions {
    pub fn with_budget(max_tokens: u32, temperature: f64) -> Self {
        Self {
            max_tokens: Some(max_tokens),
            temperature: Some(temperature),
            ..Self::default()
        }
    }
}

/// Error body returned by the proxy on failure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Request forwarded to the upstream chat-completion API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
}

/// The parts of an upstream chat-completion response the client reads
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Trimmed text of the first choice, if there is any
    pub fn first_content(&self) -> Option<String> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_id_accepts_numbers_and_strings() {
        let ids: Vec<EntityId> = serde_json::from_value(json!(["abc", 1702516122000i64])).unwrap();
        assert_eq!(ids[0].as_str(), "abc");
        assert_eq!(ids[1].as_str(), "1702516122000");

        // Always written back as a string
        assert_eq!(serde_json::to_value(&ids[1]).unwrap(), json!("1702516122000"));
    }

    #[test]
    fn test_entity_id_generate_is_unique() {
        assert_ne!(EntityId::generate(), EntityId::generate());
    }

    #[test]
    fn test_medication_defaults_to_active() {
        let medication: Medication = serde_json::from_value(json!({
            "id": "med-1",
            "name": "Metformin"
        }))
        .unwrap();

        assert!(medication.active);
        assert!(!medication.reminder);
        assert!(medication.times.is_empty());
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "id": "med-1",
            "name": "Metformin",
            "frequency": "2 gånger per dag"
        });
        let medication: Medication = serde_json::from_value(raw).unwrap();
        assert_eq!(medication.extra.get("frequency"), Some(&json!("2 gånger per dag")));

        let written = serde_json::to_value(&medication).unwrap();
        assert_eq!(written["frequency"], json!("2 gånger per dag"));
        assert_eq!(written["startDate"], json!(""));
    }

    #[test]
    fn test_appointment_reads_type_and_empty_links() {
        let appointment: Appointment = serde_json::from_value(json!({
            "id": "apt-1",
            "title": "Kostrådgivning",
            "type": "consultation",
            "diagnosisId": ""
        }))
        .unwrap();

        assert_eq!(appointment.kind, AppointmentType::Custom("consultation".to_string()));
        assert_eq!(appointment.kind.label(), "Annat");
        assert_eq!(appointment.diagnosis_id, None);
        assert_eq!(serde_json::to_value(&appointment).unwrap()["type"], json!("consultation"));

        let checkup: Appointment =
            serde_json::from_value(json!({ "id": "apt-2", "type": "specialist", "diagnosisId": "d1" })).unwrap();
        assert_eq!(checkup.kind, AppointmentType::Specialist);
        assert_eq!(checkup.diagnosis_id, Some(EntityId::from("d1")));
    }

    #[test]
    fn test_null_fields_read_as_defaults() {
        let diagnosis: Diagnosis = serde_json::from_value(json!({
            "id": "d1",
            "name": "Astma",
            "doctor": null,
            "date": null
        }))
        .unwrap();
        assert_eq!(diagnosis.name, "Astma");
        assert_eq!(diagnosis.doctor, "");

        let medication: Medication =
            serde_json::from_value(json!({ "id": "m0", "dosage": 500 })).unwrap();
        assert_eq!(medication.dosage, "500");

        let medication: Medication = serde_json::from_value(json!({
            "id": "m1",
            "times": null,
            "active": null,
            "reminder": null
        }))
        .unwrap();
        assert!(medication.times.is_empty());
        assert!(medication.active);
        assert!(!medication.reminder);

        let appointment: Appointment =
            serde_json::from_value(json!({ "id": "a1", "type": null, "medicationsAtTime": null })).unwrap();
        assert_eq!(appointment.kind, AppointmentType::Checkup);
        assert!(appointment.medications_at_time.is_empty());
    }

    #[test]
    fn test_mood_is_clamped_and_lenient() {
        let entries: Vec<DiaryEntry> = serde_json::from_value(json!([
            { "id": "a", "mood": 9 },
            { "id": "b", "mood": 0 },
            { "id": "c", "mood": "neutral" },
            { "id": "d" }
        ]))
        .unwrap();

        assert_eq!(entries[0].mood.value(), 5);
        assert_eq!(entries[1].mood.value(), 1);
        assert_eq!(entries[2].mood.value(), 3);
        assert_eq!(entries[3].mood.value(), 3);
        assert_eq!(entries[0].mood.label(), "Mycket bra");
    }

    #[test]
    fn test_note_day_falls_back_to_created_at() {
        let note = Note {
            id: "n1".into(),
            created_at: "2024-05-16T08:00:00.000Z".to_string(),
            ..Note::default()
        };
        assert_eq!(note.day(), "2024-05-16");

        let dated = Note {
            date: "2024-05-20".to_string(),
            ..note
        };
        assert_eq!(dated.day(), "2024-05-20");
    }

    #[test]
    fn test_first_content_trims_and_skips_blank() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "  Hej!  " } }]
        }))
        .unwrap();
        assert_eq!(response.first_content().as_deref(), Some("Hej!"));

        let blank: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [{ "message": { "content": "   " } }] })).unwrap();
        assert_eq!(blank.first_content(), None);
        assert_eq!(ChatCompletionResponse::default().first_content(), None);
    }

    #[test]
    fn test_ai_request_serializes_camel_case_options() {
        let request = AiRequest {
            prompt: "Vad är hypotyreos?".to_string(),
            options: AiOptions::with_budget(700, 0.3),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["options"]["maxTokens"], json!(700));
        assert!(value["options"].get("model").is_none());
    }

    #[test]
    fn test_empty_document() {
        assert!(HealthDocument::default().is_empty());
        let document = HealthDocument {
            notes: vec![Note::default()],
            ..HealthDocument::default()
        };
        assert!(!document.is_empty());
    }
}
