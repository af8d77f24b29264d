use std::sync::Arc;

use census_core::{ServiceConfig, ServiceError};
use census_sql::{Row, SQLStore, SqliteStore, Value};
use tracing::{debug, error, info};

use crate::model::{CensusFields, CensusRecord, Field};

/// Journal mode plus schema for the census table. Safe to run repeatedly.
const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS census_data (
    id                INTEGER PRIMARY KEY NOT NULL,
    province          TEXT NOT NULL,
    district          TEXT NOT NULL,
    llg               TEXT NOT NULL,
    ward              TEXT NOT NULL,
    censusUnit        TEXT NOT NULL,
    censusUnitType    TEXT NOT NULL,
    workloadNo        TEXT NOT NULL,
    locality          TEXT NOT NULL,
    section           TEXT NOT NULL,
    structureRecordNo TEXT NOT NULL,
    lot               TEXT NOT NULL,
    householdNo       TEXT NOT NULL
);
";

const INSERT: &str = "INSERT INTO census_data \
    (province, district, llg, ward, censusUnit, censusUnitType, workloadNo, \
     locality, section, structureRecordNo, lot, householdNo) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

const UPDATE: &str = "UPDATE census_data SET \
    province = ?1, district = ?2, llg = ?3, ward = ?4, censusUnit = ?5, \
    censusUnitType = ?6, workloadNo = ?7, locality = ?8, section = ?9, \
    structureRecordNo = ?10, lot = ?11, householdNo = ?12 \
    WHERE id = ?13";

/// Persistent storage for census records, backed by SQLStore (SQLite).
///
/// Constructed once per session and shared with the entry form. Every
/// statement goes through the underlying store's own serialization; this
/// type adds no locking or transactions of its own.
pub struct CensusStore {
    db: Arc<dyn SQLStore>,
}

impl CensusStore {
    /// Wrap an open SQL store. Call [`CensusStore::initialize`] before use.
    pub fn new(db: Arc<dyn SQLStore>) -> Self {
        Self { db }
    }

    /// Open the SQLite file named by `config` and wrap it.
    pub fn open(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let path = config.resolve_sqlite_path();
        let db = SqliteStore::open(&path)
            .map_err(|e| ServiceError::Storage(format!("open {}: {e}", path.display())))?;
        info!(path = %path.display(), "census database opened");
        Ok(Self::new(Arc::new(db)))
    }

    /// Switch the database to WAL and create the census table if absent.
    pub fn initialize(&self) -> Result<(), ServiceError> {
        self.db.exec_batch(SCHEMA).map_err(|e| {
            error!("census schema init failed: {e}");
            ServiceError::Storage(format!("census schema init: {e}"))
        })?;
        debug!("census schema ready");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // CRUD
    // -----------------------------------------------------------------------

    /// Append a row and return the id the database assigned to it.
    pub fn insert(&self, fields: &CensusFields) -> Result<i64, ServiceError> {
        let res = self.db.exec(INSERT, &bind(fields)).map_err(|e| {
            error!("error adding census data: {e}");
            ServiceError::Storage(e.to_string())
        })?;

        debug!(id = res.last_insert_id, "census record inserted");
        Ok(res.last_insert_id)
    }

    /// Overwrite all twelve fields of row `id`.
    ///
    /// Returns the number of rows changed. An unknown id changes nothing
    /// and is not an error.
    pub fn update(&self, id: i64, fields: &CensusFields) -> Result<u64, ServiceError> {
        let mut params = bind(fields);
        params.push(Value::Integer(id));

        let res = self.db.exec(UPDATE, &params).map_err(|e| {
            error!(id, "error updating census data: {e}");
            ServiceError::Storage(e.to_string())
        })?;

        debug!(id, rows = res.rows_affected, "census record updated");
        Ok(res.rows_affected)
    }

    /// Remove row `id`. Returns the number of rows removed (0 if absent).
    pub fn delete(&self, id: i64) -> Result<u64, ServiceError> {
        let res = self
            .db
            .exec("DELETE FROM census_data WHERE id = ?1", &[Value::Integer(id)])
            .map_err(|e| {
                error!(id, "error deleting census data: {e}");
                ServiceError::Storage(e.to_string())
            })?;

        debug!(id, rows = res.rows_affected, "census record deleted");
        Ok(res.rows_affected)
    }

    /// Fetch a single record.
    pub fn get(&self, id: i64) -> Result<Option<CensusRecord>, ServiceError> {
        let rows = self
            .db
            .query("SELECT * FROM census_data WHERE id = ?1", &[Value::Integer(id)])
            .map_err(|e| {
                error!(id, "error getting census record: {e}");
                ServiceError::Storage(e.to_string())
            })?;

        rows.first().map(row_to_record).transpose()
    }

    /// Every stored record, in storage order.
    ///
    /// A failed read is logged and yields an empty list.
    pub fn get_all(&self) -> Vec<CensusRecord> {
        match self.try_get_all() {
            Ok(records) => records,
            Err(e) => {
                error!("error getting census data: {e}");
                Vec::new()
            }
        }
    }

    fn try_get_all(&self) -> Result<Vec<CensusRecord>, ServiceError> {
        let rows = self
            .db
            .query("SELECT * FROM census_data", &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        rows.iter().map(row_to_record).collect()
    }
}

/// Positional parameters ?1..?12 in [`Field::ALL`] order.
fn bind(fields: &CensusFields) -> Vec<Value> {
    fields.values().map(Value::from).collect()
}

fn row_to_record(row: &Row) -> Result<CensusRecord, ServiceError> {
    let id = row
        .get_i64("id")
        .ok_or_else(|| ServiceError::Storage("census row without integer id".into()))?;

    let mut fields = CensusFields::default();
    for field in Field::ALL {
        let value = row.get_str(field.column()).ok_or_else(|| {
            ServiceError::Storage(format!("census row {id}: column {} is not text", field.column()))
        })?;
        fields.set(field, value);
    }

    Ok(CensusRecord { id, fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::kiunga;

    fn test_store() -> CensusStore {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        let store = CensusStore::new(db);
        store.initialize().unwrap();
        store
    }

    fn port_moresby() -> CensusFields {
        CensusFields {
            province: "National Capital District".into(),
            district: "Moresby North-East".into(),
            llg: "NCD Urban".into(),
            ward: "4".into(),
            census_unit: "CU17".into(),
            census_unit_type: "Settlement".into(),
            workload_no: "EA03".into(),
            locality: "Gerehu".into(),
            section: "12".into(),
            structure_record_no: "310".into(),
            lot: "22".into(),
            household_no: "1".into(),
        }
    }

    #[test]
    fn insert_then_get_all_round_trips() {
        let store = test_store();
        let id = store.insert(&kiunga()).unwrap();
        assert_eq!(id, 1);

        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[0].fields, kiunga());
    }

    #[test]
    fn ids_are_distinct_and_storage_ordered() {
        let store = test_store();
        let a = store.insert(&kiunga()).unwrap();
        let b = store.insert(&port_moresby()).unwrap();
        assert_ne!(a, b);

        let ids: Vec<i64> = store.get_all().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn update_overwrites_every_field() {
        let store = test_store();
        let id = store.insert(&kiunga()).unwrap();

        let affected = store.update(id, &port_moresby()).unwrap();
        assert_eq!(affected, 1);

        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].fields, port_moresby());
    }

    #[test]
    fn update_unknown_id_is_silent_noop() {
        let store = test_store();
        store.insert(&kiunga()).unwrap();

        let affected = store.update(99, &port_moresby()).unwrap();
        assert_eq!(affected, 0);

        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].fields, kiunga());
    }

    #[test]
    fn delete_removes_only_that_row() {
        let store = test_store();
        let a = store.insert(&kiunga()).unwrap();
        let b = store.insert(&port_moresby()).unwrap();

        assert_eq!(store.delete(a).unwrap(), 1);
        assert_eq!(store.delete(a).unwrap(), 0);

        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, b);
    }

    #[test]
    fn get_single_record() {
        let store = test_store();
        let id = store.insert(&port_moresby()).unwrap();

        let got = store.get(id).unwrap().unwrap();
        assert_eq!(got.fields, port_moresby());
        assert!(store.get(id + 1).unwrap().is_none());
    }

    #[test]
    fn get_before_initialize_is_storage_error() {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        let store = CensusStore::new(db);
        assert!(store.get(1).unwrap_err().is_storage());
    }

    #[test]
    fn initialize_is_idempotent() {
        let store = test_store();
        store.insert(&kiunga()).unwrap();
        store.initialize().unwrap();
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn get_all_before_initialize_is_empty() {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        let store = CensusStore::new(db);
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn insert_before_initialize_is_storage_error() {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        let store = CensusStore::new(db);
        let err = store.insert(&kiunga()).unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn open_file_store_uses_wal() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServiceConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let store = CensusStore::open(&config).unwrap();
        store.initialize().unwrap();
        let id = store.insert(&kiunga()).unwrap();

        let reader = SqliteStore::open(&config.resolve_sqlite_path()).unwrap();
        assert_eq!(reader.journal_mode().unwrap(), "wal");

        // A second session over the same file sees the row.
        let again = CensusStore::open(&config).unwrap();
        again.initialize().unwrap();
        let all = again.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
    }
}
