//! Embedded PostgreSQL for the Diesel adapter suites.
//!
//! One cluster is shared per test binary. Every test gets its own temporary
//! database with the application's migrations applied through
//! [`run_migrations`], so the schema under test is exactly the one `main`
//! installs.

use std::time::Duration;

use pawresq::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use tokio::runtime::Runtime;

const SHARED_CLUSTER_RETRIES: usize = 5;
const SHARED_CLUSTER_RETRY_DELAY: Duration = Duration::from_millis(500);

/// A migrated temporary database and a small pool over it.
///
/// The database is dropped with this value, so keep it alive for the test.
pub struct MigratedDatabase {
    pub runtime: Runtime,
    pub pool: DbPool,
    _database: TemporaryDatabase,
}

fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    let mut attempt = 1;
    loop {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(error) if attempt < SHARED_CLUSTER_RETRIES => {
                eprintln!("pg-embed: attempt {attempt}/{SHARED_CLUSTER_RETRIES} failed: {error:?}");
                std::thread::sleep(SHARED_CLUSTER_RETRY_DELAY);
                attempt += 1;
            }
            Err(error) => return Err(format!("{error:?}")),
        }
    }
}

/// Provision a fresh database on the shared cluster and bring its schema up
/// to date.
pub fn migrated_database() -> Result<MigratedDatabase, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = cluster
        .temporary_database(format!("test_{}", uuid::Uuid::new_v4().simple()))
        .map_err(|err| format!("create database: {err:?}"))?;
    let url = database.url().to_string();

    let pool = runtime.block_on(async {
        run_migrations(&url).await.map_err(|err| err.to_string())?;
        let config = PoolConfig::new(url.as_str())
            .with_max_size(4)
            .with_min_idle(Some(1));
        DbPool::new(config).await.map_err(|err| err.to_string())
    })?;

    Ok(MigratedDatabase {
        runtime,
        pool,
        _database: database,
    })
}
