//! CSV import/export (§4.6). Canonical column order:
//! `id,name,surname,address,zip_code,city,state,country,phone_number,
//! enabled,created_time,annotations,on_call_availability` — the
//! availability column is the JSON encoding of `Vec<AvailabilityWindow>`.

use chrono::Utc;
use serde::Serialize;

use crate::db::DirectoryDb;
use crate::models::AddressBookEntry;

const COLUMNS: &[&str] = &[
    "id",
    "name",
    "surname",
    "address",
    "zip_code",
    "city",
    "state",
    "country",
    "phone_number",
    "enabled",
    "created_time",
    "annotations",
    "on_call_availability",
];

pub async fn export(db: &DirectoryDb) -> clarion_core::error::Result<String> {
    let entries = db.list_entries().await?;
    let mut writer = csv::WriterBuilder::new().from_writer(vec![]);
    writer
        .write_record(COLUMNS)
        .map_err(|e| clarion_core::Error::Internal(e.into()))?;
    for entry in &entries {
        let availability = serde_json::to_string(&entry.on_call_availability)
            .map_err(|e| clarion_core::Error::DataIntegrity(format!("cannot serialize on_call_availability: {e}")))?;
        writer
            .write_record([
                entry.id.as_str(),
                entry.name.as_str(),
                entry.surname.as_str(),
                entry.address.as_str(),
                entry.zip_code.as_str(),
                entry.city.as_str(),
                entry.state.as_str(),
                entry.country.as_str(),
                entry.phone_number.as_str(),
                if entry.enabled { "true" } else { "false" },
                &entry.created_time.to_rfc3339(),
                entry.annotations.as_str(),
                &availability,
            ])
            .map_err(|e| clarion_core::Error::Internal(e.into()))?;
    }
    let bytes = writer.into_inner().map_err(|e| clarion_core::Error::Internal(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|e| clarion_core::Error::Internal(e.into()))
}

#[derive(Debug, Clone, Serialize)]
pub struct RowOutcome {
    pub row: usize,
    pub id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ImportSummary {
    pub inserted_or_updated: usize,
    pub failed: usize,
    pub rows: Vec<RowOutcome>,
}

/// Imports a CSV payload row by row; a malformed row does not abort the
/// rest of the import, it is recorded in the summary (§4.6).
pub async fn import(db: &DirectoryDb, csv_data: &str) -> ImportSummary {
    let mut summary = ImportSummary::default();
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(csv_data.as_bytes());

    for (idx, record) in reader.records().enumerate() {
        let outcome = match record {
            Ok(record) => import_row(db, &record).await,
            Err(e) => Err(format!("malformed CSV row: {e}")),
        };
        match outcome {
            Ok(id) => {
                summary.inserted_or_updated += 1;
                summary.rows.push(RowOutcome { row: idx, id: Some(id), error: None });
            }
            Err(message) => {
                summary.failed += 1;
                summary.rows.push(RowOutcome { row: idx, id: None, error: Some(message) });
            }
        }
    }
    summary
}

async fn import_row(db: &DirectoryDb, record: &csv::StringRecord) -> Result<String, String> {
    let get = |i: usize| record.get(i).unwrap_or("").to_string();

    let enabled = matches!(get(9).trim().to_lowercase().as_str(), "true" | "1" | "yes");
    let created_time = chrono::DateTime::parse_from_rfc3339(&get(10))
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    let on_call_availability = serde_json::from_str(&get(12)).map_err(|e| format!("invalid on_call_availability JSON: {e}"))?;

    let entry = AddressBookEntry {
        id: get(0),
        name: get(1),
        surname: get(2),
        address: get(3),
        zip_code: get(4),
        city: get(5),
        state: get(6),
        country: get(7),
        phone_number: get(8),
        enabled,
        created_time,
        annotations: get(11),
        on_call_availability,
    };

    if entry.phone_number.is_empty() {
        return Err("phone_number is required".to_string());
    }

    db.upsert_entry(&entry).await.map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AvailabilityWindow;
    use chrono::TimeZone;

    #[tokio::test]
    async fn export_then_import_round_trips_an_entry() {
        let db = DirectoryDb::connect_in_memory().await.unwrap();
        let entry = AddressBookEntry {
            id: String::new(),
            name: "Grace".into(),
            surname: "Hopper".into(),
            address: String::new(),
            zip_code: String::new(),
            city: String::new(),
            state: String::new(),
            country: String::new(),
            phone_number: "+15550099".into(),
            enabled: true,
            created_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            annotations: String::new(),
            on_call_availability: vec![AvailabilityWindow {
                start_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                end_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
                priority: 0,
            }],
        };
        db.upsert_entry(&entry).await.unwrap();

        let csv_data = export(&db).await.unwrap();
        assert!(csv_data.contains("Grace"));

        let other_db = DirectoryDb::connect_in_memory().await.unwrap();
        let summary = import(&other_db, &csv_data).await;
        assert_eq!(summary.failed, 0);
        assert_eq!(other_db.list_entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn import_reports_malformed_rows_without_aborting() {
        let db = DirectoryDb::connect_in_memory().await.unwrap();
        let csv_data = "id,name,surname,address,zip_code,city,state,country,phone_number,enabled,created_time,annotations,on_call_availability\n\
                         ,Bad,Row,,,,,,,,,,not-json\n\
                         ,Good,Row,,,,,,+15550001,true,2024-01-01T00:00:00Z,,[]\n";
        let summary = import(&db, csv_data).await;
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.inserted_or_updated, 1);
    }
}
