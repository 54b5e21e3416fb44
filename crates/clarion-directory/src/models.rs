//! Address book row types (§3, §4.6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityWindow {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub priority: i32,
}

/// As stored: `on_call_availability` is a JSON-encoded column, so this is
/// what `sqlx::FromRow` decodes directly.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AddressBookRow {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub address: String,
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub phone_number: String,
    pub enabled: bool,
    pub created_time: DateTime<Utc>,
    pub annotations: String,
    pub on_call_availability: String,
}

/// Domain-level view with the availability column already parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressBookEntry {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub address: String,
    pub zip_code: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub phone_number: String,
    pub enabled: bool,
    pub created_time: DateTime<Utc>,
    pub annotations: String,
    pub on_call_availability: Vec<AvailabilityWindow>,
}

impl TryFrom<AddressBookRow> for AddressBookEntry {
    type Error = serde_json::Error;

    fn try_from(row: AddressBookRow) -> Result<Self, Self::Error> {
        let on_call_availability = serde_json::from_str(&row.on_call_availability)?;
        Ok(AddressBookEntry {
            id: row.id,
            name: row.name,
            surname: row.surname,
            address: row.address,
            zip_code: row.zip_code,
            city: row.city,
            state: row.state,
            country: row.country,
            phone_number: row.phone_number,
            enabled: row.enabled,
            created_time: row.created_time,
            annotations: row.annotations,
            on_call_availability,
        })
    }
}

/// One resolved on-call candidate: the contact plus the specific window
/// that makes them eligible right now.
#[derive(Debug, Clone, Serialize)]
pub struct OnCallCandidate {
    pub entry_id: String,
    pub name: String,
    pub surname: String,
    pub phone_number: String,
    pub priority: i32,
    pub window_start_at: DateTime<Utc>,
    pub created_time: DateTime<Utc>,
}
