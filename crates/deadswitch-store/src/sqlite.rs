//! SQLite implementation of the VaultStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking. Expiry is a single
//! conditional UPDATE; check-in is an IMMEDIATE transaction guarded by the
//! record version, so other processes sharing the file cannot interleave.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};

use deadswitch_core::{
    apply_check_in, AssetRef, CheckInPolicy, Clock, CoreError, Identity, KeyFragment,
    LivenessInterval, NonceHex, SystemClock, TransitionError, VaultRecord, VaultState,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{CreateResult, LivenessUpdate, VaultStore};

const VAULT_COLUMNS: &str = "subject, beneficiary, server_fragment, nonce, asset_ref, asset_name, \
     last_live_signal, liveness_interval_ms, state, version, created_at";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migration::migrate(&mut conn, SystemClock.now_millis())?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn, SystemClock.now_millis())?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

/// Raw column values, before validation.
struct VaultRow {
    subject: String,
    beneficiary: String,
    server_fragment: String,
    nonce: String,
    asset_ref: String,
    asset_name: String,
    last_live_signal: i64,
    liveness_interval_ms: i64,
    state: String,
    version: i64,
    created_at: i64,
}

impl VaultRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            subject: row.get("subject")?,
            beneficiary: row.get("beneficiary")?,
            server_fragment: row.get("server_fragment")?,
            nonce: row.get("nonce")?,
            asset_ref: row.get("asset_ref")?,
            asset_name: row.get("asset_name")?,
            last_live_signal: row.get("last_live_signal")?,
            liveness_interval_ms: row.get("liveness_interval_ms")?,
            state: row.get("state")?,
            version: row.get("version")?,
            created_at: row.get("created_at")?,
        })
    }

    fn into_record(self) -> Result<VaultRecord> {
        let invalid = |e: CoreError| StoreError::InvalidData(e.to_string());
        let interval = u64::try_from(self.liveness_interval_ms)
            .map_err(|_| CoreError::InvalidInterval)
            .and_then(LivenessInterval::from_millis)
            .map_err(invalid)?;
        let version = u64::try_from(self.version)
            .map_err(|_| StoreError::InvalidData(format!("negative version {}", self.version)))?;

        Ok(VaultRecord {
            subject: Identity::new(self.subject).map_err(invalid)?,
            beneficiary: Identity::new(self.beneficiary).map_err(invalid)?,
            server_fragment: KeyFragment::parse(self.server_fragment).map_err(invalid)?,
            nonce: NonceHex::parse(&self.nonce).map_err(invalid)?,
            asset_ref: AssetRef::parse(self.asset_ref).map_err(invalid)?,
            asset_name: self.asset_name,
            last_live_signal: self.last_live_signal,
            liveness_interval: interval,
            state: self.state.parse::<VaultState>().map_err(invalid)?,
            version,
            created_at: self.created_at,
        })
    }
}

fn load_record(conn: &Connection, subject: &Identity) -> Result<Option<VaultRecord>> {
    let sql = format!("SELECT {} FROM vaults WHERE subject = ?1", VAULT_COLUMNS);
    let row = conn
        .query_row(&sql, params![subject.as_str()], VaultRow::from_row)
        .optional()?;
    row.map(VaultRow::into_record).transpose()
}

fn to_i64(value: u64, what: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| StoreError::InvalidData(format!("{} out of range", what)))
}

#[async_trait]
impl VaultStore for SqliteStore {
    async fn create(&self, record: &VaultRecord) -> Result<CreateResult> {
        let record = record.clone();

        self.run(move |conn| {
            let interval = to_i64(record.liveness_interval.as_millis(), "liveness interval")?;
            let version = to_i64(record.version, "version")?;

            let inserted = conn.execute(
                "INSERT INTO vaults (
                    subject, beneficiary, server_fragment, nonce, asset_ref, asset_name,
                    last_live_signal, liveness_interval_ms, state, version, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
                ON CONFLICT(subject) DO NOTHING",
                params![
                    record.subject.as_str(),
                    record.beneficiary.as_str(),
                    record.server_fragment.as_str(),
                    record.nonce.to_hex(),
                    record.asset_ref.as_str(),
                    record.asset_name,
                    record.last_live_signal,
                    interval,
                    record.state.as_str(),
                    version,
                    record.created_at,
                ],
            );

            match inserted {
                Ok(0) => Ok(CreateResult::Duplicate),
                Ok(_) => Ok(CreateResult::Created),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::NonceReuse)
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn get(&self, subject: &Identity) -> Result<Option<VaultRecord>> {
        let subject = subject.clone();
        self.run(move |conn| load_record(conn, &subject)).await
    }

    async fn list_alive(&self) -> Result<Vec<VaultRecord>> {
        self.run(|conn| {
            let sql = format!(
                "SELECT {} FROM vaults WHERE state = 'alive' ORDER BY subject",
                VAULT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], VaultRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(VaultRow::into_record).collect()
        })
        .await
    }

    async fn update_liveness(
        &self,
        subject: &Identity,
        at: i64,
        policy: CheckInPolicy,
    ) -> Result<LivenessUpdate> {
        let subject = subject.clone();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let Some(mut record) = load_record(&tx, &subject)? else {
                return Ok(LivenessUpdate::NotFound);
            };
            let expected_version = to_i64(record.version, "version")?;

            let transition = match apply_check_in(&mut record, at, policy) {
                Ok(transition) => transition,
                Err(TransitionError::AlreadyReleased) => return Ok(LivenessUpdate::Rejected),
                Err(e) => return Err(StoreError::InvalidData(e.to_string())),
            };

            let changed = tx.execute(
                "UPDATE vaults
                 SET last_live_signal = ?1, state = ?2, version = ?3, updated_at = ?4
                 WHERE subject = ?5 AND version = ?6",
                params![
                    record.last_live_signal,
                    record.state.as_str(),
                    to_i64(record.version, "version")?,
                    at,
                    subject.as_str(),
                    expected_version,
                ],
            )?;
            if changed != 1 {
                return Err(StoreError::Conflict(subject.to_string()));
            }

            tx.commit()?;
            Ok(LivenessUpdate::Applied { transition, record })
        })
        .await
    }

    async fn transition_to_released(
        &self,
        subject: &Identity,
        observed_version: u64,
        at: i64,
    ) -> Result<bool> {
        let subject = subject.clone();

        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE vaults
                 SET state = 'released', version = version + 1, updated_at = ?3
                 WHERE subject = ?1 AND state = 'alive' AND version = ?2",
                params![subject.as_str(), to_i64(observed_version, "version")?, at],
            )?;
            Ok(changed == 1)
        })
        .await
    }

    async fn delete(&self, subject: &Identity) -> Result<bool> {
        let subject = subject.clone();

        self.run(move |conn| {
            let changed = conn.execute(
                "DELETE FROM vaults WHERE subject = ?1",
                params![subject.as_str()],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn asset_in_use(&self, asset: &AssetRef) -> Result<bool> {
        let asset = asset.clone();

        self.run(move |conn| {
            Ok(conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM vaults WHERE asset_ref = ?1)",
                params![asset.as_str()],
                |row| row.get(0),
            )?)
        })
        .await
    }
}
