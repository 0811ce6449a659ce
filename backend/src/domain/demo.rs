//! Bundled demo profile, used to try the app without entering data.

use serde_json::Value;
use shared::{HealthDocument, NotificationKind};
use std::time::Duration;
use tracing::info;

use super::normalize::normalize_document;
use super::store::AppStore;

const DEMO_PROFILE: &str = include_str!("../../data/demo_profile.json");

/// How long the import confirmation stays visible
pub const DEMO_NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// The demo profile, normalized like any other loaded document
pub fn demo_document() -> serde_json::Result<HealthDocument> {
    let raw: Value = serde_json::from_str(DEMO_PROFILE)?;
    Ok(normalize_document(&raw))
}

/// Replace every collection with the demo profile
pub fn import_demo_data(store: &AppStore) -> serde_json::Result<()> {
    let document = demo_document()?;
    info!(
        diagnoses = document.diagnoses.len(),
        appointments = document.appointments.len(),
        "Importing demo data"
    );

    store.load_all_data(document);
    store.notify_for(
        "Demodata importerad!",
        NotificationKind::Success,
        DEMO_NOTIFICATION_TTL,
    );
    Ok(())
}
