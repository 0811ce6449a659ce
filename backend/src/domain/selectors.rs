//! Read-only helpers over [`HealthState`].
//!
//! Dates are stored as `YYYY-MM-DD` strings. An appointment whose date cannot
//! be parsed is neither upcoming nor past.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use shared::{AiNoteMap, Appointment, EntityId, Medication, Note};
use std::collections::BTreeMap;

use super::state::HealthState;

/// Hour of the evening before an appointment when its reminder fires
pub const REMINDER_HOUR: u32 = 18;

fn parse_day(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

/// Appointments on or after `today`, soonest first
pub fn upcoming_appointments(state: &HealthState, today: NaiveDate) -> Vec<&Appointment> {
    let mut upcoming: Vec<&Appointment> = state
        .appointments
        .iter()
        .filter(|a| parse_day(&a.date).is_some_and(|day| day >= today))
        .collect();
    upcoming.sort_by(|a, b| (&a.date, &a.time).cmp(&(&b.date, &b.time)));
    upcoming
}

/// Appointments before `today`, most recent first
pub fn past_appointments(state: &HealthState, today: NaiveDate) -> Vec<&Appointment> {
    let mut past: Vec<&Appointment> = state
        .appointments
        .iter()
        .filter(|a| parse_day(&a.date).is_some_and(|day| day < today))
        .collect();
    past.sort_by(|a, b| (&b.date, &b.time).cmp(&(&a.date, &a.time)));
    past
}

/// Number of upcoming appointments with a reminder switched on
pub fn active_reminder_count(state: &HealthState, today: NaiveDate) -> usize {
    upcoming_appointments(state, today)
        .into_iter()
        .filter(|a| a.reminder)
        .count()
}

/// Appointments whose reminder is due at `now`: the evening before, at 18:00
pub fn due_reminders(state: &HealthState, now: NaiveDateTime) -> Vec<&Appointment> {
    if now.hour() != REMINDER_HOUR || now.minute() != 0 {
        return Vec::new();
    }

    let tomorrow = now.date() + Duration::days(1);
    state
        .appointments
        .iter()
        .filter(|a| a.reminder && parse_day(&a.date) == Some(tomorrow))
        .collect()
}

/// Notification text for a due reminder
pub fn reminder_message(appointment: &Appointment) -> String {
    format!("📅 Imorgon: {} kl {}", appointment.title, appointment.time)
}

pub fn active_medications(state: &HealthState) -> Vec<&Medication> {
    state.medications.iter().filter(|m| m.active).collect()
}

/// Whether the medication was marked as taken on `date`
pub fn intake_taken(state: &HealthState, date: &str, medication_id: &EntityId) -> bool {
    state
        .medication_log
        .get(date)
        .and_then(|day| day.get(medication_id))
        .copied()
        .unwrap_or(false)
}

/// Notebook entries grouped by day, newest day first. Within a day the
/// stored order is kept.
pub fn notes_by_date(state: &HealthState) -> Vec<(String, Vec<&Note>)> {
    let mut grouped: BTreeMap<String, Vec<&Note>> = BTreeMap::new();
    for note in state.notes.iter() {
        grouped.entry(note.day().to_string()).or_default().push(note);
    }
    grouped.into_iter().rev().collect()
}

pub fn has_ai_notes(notes: &AiNoteMap, owner: &EntityId) -> bool {
    notes.get(owner).is_some_and(|list| !list.is_empty())
}
