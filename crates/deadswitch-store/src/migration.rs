//! SQLite schema versions.
//!
//! Each entry in [`MIGRATIONS`] moves the schema up by one version. Applied
//! versions are recorded in `schema_migrations`; opening a database runs
//! whatever is missing inside a single transaction.

use rusqlite::{params, Connection};

use crate::error::{Result, StoreError};

/// Ordered schema steps: `(version, sql)`.
const MIGRATIONS: &[(u32, &str)] = &[(1, V1_VAULTS), (2, V2_ASSET_INDEX)];

/// Highest schema version this build understands.
pub const CURRENT_VERSION: u32 = 2;

const V1_VAULTS: &str = r#"
    CREATE TABLE vaults (
        subject TEXT PRIMARY KEY,             -- case-sensitive, as received
        beneficiary TEXT NOT NULL,
        server_fragment TEXT NOT NULL,        -- 32 hex chars, high-order key half
        nonce TEXT NOT NULL UNIQUE,           -- 24 hex chars, never reused
        asset_ref TEXT NOT NULL,              -- Blake3 hex of the ciphertext
        asset_name TEXT NOT NULL,
        last_live_signal INTEGER NOT NULL,    -- Unix ms
        liveness_interval_ms INTEGER NOT NULL CHECK (liveness_interval_ms > 0),
        state TEXT NOT NULL CHECK (state IN ('alive', 'released')),
        version INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    -- The reaper scans by state on every tick
    CREATE INDEX idx_vaults_state ON vaults(state);
"#;

// Blob removal asks whether any other vault still points at the asset.
const V2_ASSET_INDEX: &str = r#"
    CREATE INDEX idx_vaults_asset ON vaults(asset_ref);
"#;

/// Bring the schema up to [`CURRENT_VERSION`]. Safe to call on every open.
pub fn migrate(conn: &mut Connection, now: i64) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        );",
    )?;

    let applied = schema_version(conn)?;
    if applied > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{} is newer than supported v{}",
            applied, CURRENT_VERSION
        )));
    }

    let pending: Vec<&(u32, &str)> = MIGRATIONS.iter().filter(|(v, _)| *v > applied).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in pending {
        tx.execute_batch(sql)
            .map_err(|e| StoreError::Migration(format!("v{}: {}", version, e)))?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            params![version, now],
        )?;
        tracing::info!(version, "applied schema migration");
    }
    tx.commit()?;

    Ok(())
}

/// Highest applied version, or 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<u32> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?)
}
