//! Address book storage and on-call resolution (§4.6).

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{AddressBookEntry, AddressBookRow, AvailabilityWindow, OnCallCandidate};

#[derive(Clone)]
pub struct DirectoryDb {
    pool: SqlitePool,
}

impl DirectoryDb {
    pub async fn connect(database_url: &str, max_connections: u32) -> clarion_core::error::Result<Self> {
        let options: SqliteConnectOptions = database_url.parse()?;
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options.create_if_missing(true))
            .await?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| clarion_core::Error::Fatal(format!("migration failed: {e}")))?;
        Ok(Self { pool })
    }

    pub async fn connect_in_memory() -> clarion_core::error::Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    pub async fn list_entries(&self) -> clarion_core::error::Result<Vec<AddressBookEntry>> {
        let rows = sqlx::query_as::<_, AddressBookRow>("SELECT * FROM address_book").fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| AddressBookEntry::try_from(row).map_err(|e| clarion_core::Error::DataIntegrity(format!("corrupt on_call_availability: {e}"))))
            .collect()
    }

    /// §4.6 selection rule: enabled entries with at least one availability
    /// window covering `at`, ordered `(priority ASC, window.start_at ASC,
    /// created_time ASC, name+surname ASC)`.
    pub async fn oncall(&self, at: DateTime<Utc>) -> clarion_core::error::Result<Vec<OnCallCandidate>> {
        let entries = self.list_entries().await?;
        let mut candidates: Vec<OnCallCandidate> = entries
            .into_iter()
            .filter(|e| e.enabled)
            .flat_map(|e| {
                e.on_call_availability
                    .iter()
                    .filter(|w| w.start_at <= at && at <= w.end_at)
                    .map(|w| OnCallCandidate {
                        entry_id: e.id.clone(),
                        name: e.name.clone(),
                        surname: e.surname.clone(),
                        phone_number: e.phone_number.clone(),
                        priority: w.priority,
                        window_start_at: w.start_at,
                        created_time: e.created_time,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        candidates.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.window_start_at.cmp(&b.window_start_at))
                .then(a.created_time.cmp(&b.created_time))
                .then((&a.name, &a.surname).cmp(&(&b.name, &b.surname)))
        });
        Ok(candidates)
    }

    /// Create or update one entry. Dedup rule (§4.6): by `id` if present,
    /// else by normalized `(phone_number, name, surname)`.
    pub async fn upsert_entry(&self, entry: &AddressBookEntry) -> clarion_core::error::Result<String> {
        let availability = serde_json::to_string(&entry.on_call_availability)
            .map_err(|e| clarion_core::Error::DataIntegrity(format!("cannot serialize on_call_availability: {e}")))?;

        let existing_id = if !entry.id.is_empty() {
            Some(entry.id.clone())
        } else {
            find_by_normalized_identity(&self.pool, &entry.phone_number, &entry.name, &entry.surname).await?
        };

        let id = existing_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        sqlx::query(
            r#"INSERT INTO address_book
               (id, name, surname, address, zip_code, city, state, country, phone_number,
                enabled, created_time, annotations, on_call_availability)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
               ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 surname = excluded.surname,
                 address = excluded.address,
                 zip_code = excluded.zip_code,
                 city = excluded.city,
                 state = excluded.state,
                 country = excluded.country,
                 phone_number = excluded.phone_number,
                 enabled = excluded.enabled,
                 annotations = excluded.annotations,
                 on_call_availability = excluded.on_call_availability"#,
        )
        .bind(&id)
        .bind(&entry.name)
        .bind(&entry.surname)
        .bind(&entry.address)
        .bind(&entry.zip_code)
        .bind(&entry.city)
        .bind(&entry.state)
        .bind(&entry.country)
        .bind(&entry.phone_number)
        .bind(entry.enabled)
        .bind(entry.created_time.to_rfc3339())
        .bind(&entry.annotations)
        .bind(&availability)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }
}

async fn find_by_normalized_identity(
    pool: &SqlitePool,
    phone_number: &str,
    name: &str,
    surname: &str,
) -> clarion_core::error::Result<Option<String>> {
    let row = sqlx::query_as::<_, (String,)>(
        r#"SELECT id FROM address_book
           WHERE lower(trim(phone_number)) = ?1 AND lower(trim(name)) = ?2 AND lower(trim(surname)) = ?3"#,
    )
    .bind(phone_number.trim().to_lowercase())
    .bind(name.trim().to_lowercase())
    .bind(surname.trim().to_lowercase())
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(id,)| id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_entry(phone: &str, priority: i32) -> AddressBookEntry {
        AddressBookEntry {
            id: String::new(),
            name: "Ada".into(),
            surname: "Lovelace".into(),
            address: String::new(),
            zip_code: String::new(),
            city: String::new(),
            state: String::new(),
            country: String::new(),
            phone_number: phone.into(),
            enabled: true,
            created_time: Utc::now(),
            annotations: String::new(),
            on_call_availability: vec![AvailabilityWindow {
                start_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
                end_at: Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap(),
                priority,
            }],
        }
    }

    #[tokio::test]
    async fn upsert_then_oncall_resolves_the_candidate() {
        let db = DirectoryDb::connect_in_memory().await.unwrap();
        db.upsert_entry(&sample_entry("+15550001", 0)).await.unwrap();
        let candidates = db.oncall(Utc::now()).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].phone_number, "+15550001");
    }

    #[tokio::test]
    async fn oncall_orders_by_priority_then_name() {
        let db = DirectoryDb::connect_in_memory().await.unwrap();
        db.upsert_entry(&sample_entry("+15550002", 5)).await.unwrap();
        db.upsert_entry(&sample_entry("+15550001", 0)).await.unwrap();
        let candidates = db.oncall(Utc::now()).await.unwrap();
        assert_eq!(candidates[0].phone_number, "+15550001");
        assert_eq!(candidates[1].phone_number, "+15550002");
    }

    #[tokio::test]
    async fn upsert_dedupes_by_normalized_phone_name_surname() {
        let db = DirectoryDb::connect_in_memory().await.unwrap();
        let id1 = db.upsert_entry(&sample_entry("+15550001", 0)).await.unwrap();
        let mut again = sample_entry(" +15550001 ", 2);
        again.name = "ADA".into();
        let id2 = db.upsert_entry(&again).await.unwrap();
        assert_eq!(id1, id2);
        assert_eq!(db.list_entries().await.unwrap().len(), 1);
    }
}
