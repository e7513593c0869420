//! Database connection and initialization.

use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Database connection wrapper.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    spatial_index: bool,
}

impl Database {
    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Whether the R*Tree zone index is available in this SQLite build.
    pub fn has_spatial_index(&self) -> bool {
        self.spatial_index
    }
}

/// Initialize the SQLite database.
///
/// Creates the database file if it doesn't exist, runs migrations,
/// and returns a connection pool.
pub async fn init_database(db_path: &str, max_connections: u32) -> Result<Database> {
    // Ensure parent directory exists
    if let Some(parent) = Path::new(db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path);

    info!("Connecting to database: {}", db_path);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(&db_url)
        .await?;

    run_migrations(&pool).await?;
    let spatial_index = ensure_spatial_index(&pool).await;

    Ok(Database {
        pool,
        spatial_index,
    })
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let migration_sql = include_str!("../../migrations/001_init.sql");

    info!("Running database migrations...");

    for statement in migration_sql.split(';') {
        // Remove comment lines and trim whitespace
        let statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }

        if let Err(e) = sqlx::query(statement).execute(pool).await {
            if e.to_string().contains("already exists") {
                continue;
            }
            anyhow::bail!("Migration failed: {}", e);
        }
    }

    info!("Database migrations complete");
    Ok(())
}

/// Create the R*Tree over zone bounding boxes and backfill rows missing from it.
///
/// Returns false when the SQLite build lacks the rtree module; the zone store
/// then answers containment queries with a bounding-box range scan instead.
async fn ensure_spatial_index(pool: &SqlitePool) -> bool {
    let created = sqlx::query(
        "CREATE VIRTUAL TABLE IF NOT EXISTS zone_rtree USING rtree(zone_seq, min_lon, max_lon, min_lat, max_lat)",
    )
    .execute(pool)
    .await;
    if let Err(err) = created {
        warn!("R*Tree unavailable, zone lookups fall back to bounding-box scans: {}", err);
        return false;
    }

    let backfill = sqlx::query(
        r#"
        INSERT INTO zone_rtree (zone_seq, min_lon, max_lon, min_lat, max_lat)
        SELECT seq, min_lon, max_lon, min_lat, max_lat FROM zones
        WHERE seq NOT IN (SELECT zone_seq FROM zone_rtree)
        "#,
    )
    .execute(pool)
    .await;
    match backfill {
        Ok(result) if result.rows_affected() > 0 => {
            info!("Indexed {} zones into zone_rtree", result.rows_affected());
            true
        }
        Ok(_) => true,
        Err(err) => {
            warn!("Failed to backfill zone_rtree, using bounding-box scans: {}", err);
            false
        }
    }
}
