//! Zone persistence operations.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use utm_core::{
    NewZone, Position, SortField, SortOrder, StatusFilter, StoreError, Zone, ZoneGeometry,
    ZonePage, ZoneQuery, ZoneStatus, ZoneStore, ZoneType,
};

use super::db::Database;

const ZONE_COLUMNS: &str = "id, name, description, zone_type, status, geometry, min_altitude, \
    max_altitude, effective_from, effective_to, created_by, created_at, updated_at";

/// SQLite-backed [`ZoneStore`].
///
/// Containment lookups go through the `zone_rtree` index when the SQLite
/// build provides it, otherwise through an indexed range scan on the
/// bounding-box columns of `zones`.
#[derive(Clone)]
pub struct SqliteZoneStore {
    pool: SqlitePool,
    spatial_index: bool,
}

impl SqliteZoneStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            spatial_index: db.has_spatial_index(),
        }
    }

    /// Store that never touches `zone_rtree`.
    pub fn without_spatial_index(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
            spatial_index: false,
        }
    }
}

#[async_trait]
impl ZoneStore for SqliteZoneStore {
    async fn insert(&self, zone: NewZone) -> Result<Zone, StoreError> {
        insert_zone(&self.pool, zone, self.spatial_index)
            .await
            .map_err(StoreError::new)
    }

    async fn get(&self, id: &str) -> Result<Option<Zone>, StoreError> {
        load_zone(&self.pool, id).await.map_err(StoreError::new)
    }

    async fn list(&self, query: &ZoneQuery) -> Result<ZonePage, StoreError> {
        list_zones(&self.pool, query).await.map_err(StoreError::new)
    }

    async fn archive(&self, id: &str, at: DateTime<Utc>) -> Result<Option<Zone>, StoreError> {
        archive_zone(&self.pool, id, at).await.map_err(StoreError::new)
    }

    async fn find_candidates(&self, point: Position) -> Result<Vec<Zone>, StoreError> {
        find_containing_zones(&self.pool, point, self.spatial_index)
            .await
            .map_err(StoreError::new)
    }
}

/// Insert a validated zone and its index entry in one transaction.
pub async fn insert_zone(pool: &SqlitePool, zone: NewZone, spatial_index: bool) -> Result<Zone> {
    let bbox = zone.bbox();
    let mut zone = zone.into_zone(Uuid::new_v4().to_string());
    // Match what a later read returns.
    zone.created_at = zone.created_at.trunc_subsecs(6);
    zone.updated_at = zone.updated_at.trunc_subsecs(6);
    zone.effective_from = zone.effective_from.map(|ts| ts.trunc_subsecs(6));
    zone.effective_to = zone.effective_to.map(|ts| ts.trunc_subsecs(6));
    let geometry_json = serde_json::to_string(&zone.geometry)?;

    let mut tx = pool.begin().await?;

    let seq = sqlx::query(
        r#"
        INSERT INTO zones (
            id, name, name_search, description, zone_type, status, geometry,
            min_lon, max_lon, min_lat, max_lat, min_altitude, max_altitude,
            effective_from, effective_to, created_by, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        "#,
    )
    .bind(&zone.id)
    .bind(&zone.name)
    .bind(zone.name.to_lowercase())
    .bind(&zone.description)
    .bind(zone.zone_type.as_str())
    .bind(zone.status.as_str())
    .bind(&geometry_json)
    .bind(bbox.min_lon)
    .bind(bbox.max_lon)
    .bind(bbox.min_lat)
    .bind(bbox.max_lat)
    .bind(zone.min_altitude)
    .bind(zone.max_altitude)
    .bind(zone.effective_from.map(encode_timestamp))
    .bind(zone.effective_to.map(encode_timestamp))
    .bind(&zone.created_by)
    .bind(encode_timestamp(zone.created_at))
    .bind(encode_timestamp(zone.updated_at))
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    if spatial_index {
        sqlx::query(
            "INSERT INTO zone_rtree (zone_seq, min_lon, max_lon, min_lat, max_lat) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(seq)
        .bind(bbox.min_lon)
        .bind(bbox.max_lon)
        .bind(bbox.min_lat)
        .bind(bbox.max_lat)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(zone)
}

/// Load a zone by id, whatever its status.
pub async fn load_zone(pool: &SqlitePool, id: &str) -> Result<Option<Zone>> {
    let sql = format!("SELECT {ZONE_COLUMNS} FROM zones WHERE id = ?1");
    let row = sqlx::query_as::<_, ZoneRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(Zone::try_from).transpose()
}

/// One page of zones plus the total matching the filters.
///
/// Count and page are read in the same transaction so they agree.
pub async fn list_zones(pool: &SqlitePool, query: &ZoneQuery) -> Result<ZonePage> {
    let mut tx = pool.begin().await?;

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM zones");
    push_filters(&mut count, query);
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(&mut *tx).await?;

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {ZONE_COLUMNS} FROM zones"));
    push_filters(&mut select, query);
    let direction = match query.sort_order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    select.push(format!(
        " ORDER BY {} {direction}, seq {direction}",
        sort_column(query.sort_by)
    ));
    select.push(" LIMIT ").push_bind(i64::from(query.limit));
    select.push(" OFFSET ").push_bind(query.offset() as i64);

    let rows = select.build_query_as::<ZoneRow>().fetch_all(&mut *tx).await?;
    tx.commit().await?;

    let items = rows
        .into_iter()
        .map(Zone::try_from)
        .collect::<Result<Vec<_>>>()?;

    Ok(ZonePage {
        items,
        total_count: total.max(0) as u64,
    })
}

/// Mark a zone archived. `None` when no zone has this id.
pub async fn archive_zone(pool: &SqlitePool, id: &str, at: DateTime<Utc>) -> Result<Option<Zone>> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE zones SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(ZoneStatus::Archived.as_str())
        .bind(encode_timestamp(at))
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    let sql = format!("SELECT {ZONE_COLUMNS} FROM zones WHERE id = ?1");
    let row = sqlx::query_as::<_, ZoneRow>(&sql)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;

    Zone::try_from(row).map(Some)
}

/// Active zones whose polygon contains `point`.
///
/// The bounding-box prefilter runs in SQL; the exact point-in-polygon test
/// runs here on the survivors.
pub async fn find_containing_zones(
    pool: &SqlitePool,
    point: Position,
    spatial_index: bool,
) -> Result<Vec<Zone>> {
    let [lon, lat] = point;
    let sql = if spatial_index {
        format!(
            r#"
            SELECT {ZONE_COLUMNS} FROM zones
            WHERE status = 'active' AND seq IN (
                SELECT zone_seq FROM zone_rtree
                WHERE min_lon <= ?1 AND max_lon >= ?1 AND min_lat <= ?2 AND max_lat >= ?2
            )
            "#
        )
    } else {
        format!(
            r#"
            SELECT {ZONE_COLUMNS} FROM zones
            WHERE status = 'active'
              AND min_lon <= ?1 AND max_lon >= ?1 AND min_lat <= ?2 AND max_lat >= ?2
            "#
        )
    };

    let rows = sqlx::query_as::<_, ZoneRow>(&sql)
        .bind(lon)
        .bind(lat)
        .fetch_all(pool)
        .await?;

    let mut zones = Vec::with_capacity(rows.len());
    for row in rows {
        let zone = Zone::try_from(row)?;
        if zone.geometry.contains(point) {
            zones.push(zone);
        }
    }
    Ok(zones)
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &ZoneQuery) {
    match query.status {
        StatusFilter::Unarchived => {
            builder.push(" WHERE status != 'archived'");
        }
        StatusFilter::Only(status) => {
            builder.push(" WHERE status = ").push_bind(status.as_str());
        }
    }
    if let Some(zone_type) = query.zone_type {
        builder.push(" AND zone_type = ").push_bind(zone_type.as_str());
    }
    if let Some(search) = &query.search {
        builder
            .push(" AND instr(name_search, ")
            .push_bind(search.to_lowercase())
            .push(") > 0");
    }
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::CreatedAt => "created_at",
        SortField::UpdatedAt => "updated_at",
        SortField::Name => "name",
        SortField::Type => "zone_type",
        SortField::MinAltitude => "min_altitude",
        SortField::MaxAltitude => "max_altitude",
    }
}

/// Fixed-width UTC so text order is chronological order.
fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| anyhow::anyhow!("Invalid {column} timestamp `{value}`: {e}"))
}

// Internal row type for SQLx
#[derive(sqlx::FromRow)]
struct ZoneRow {
    id: String,
    name: String,
    description: Option<String>,
    zone_type: String,
    status: String,
    geometry: String,
    min_altitude: f64,
    max_altitude: f64,
    effective_from: Option<String>,
    effective_to: Option<String>,
    created_by: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ZoneRow> for Zone {
    type Error = anyhow::Error;

    fn try_from(row: ZoneRow) -> Result<Self> {
        let zone_type = ZoneType::parse(&row.zone_type)
            .ok_or_else(|| anyhow::anyhow!("Unknown zone type: {}", row.zone_type))?;
        let status = ZoneStatus::parse(&row.status)
            .ok_or_else(|| anyhow::anyhow!("Unknown zone status: {}", row.status))?;
        let geometry: ZoneGeometry = serde_json::from_str(&row.geometry)?;

        Ok(Zone {
            id: row.id,
            name: row.name,
            description: row.description,
            zone_type,
            status,
            geometry,
            min_altitude: row.min_altitude,
            max_altitude: row.max_altitude,
            effective_from: row
                .effective_from
                .as_deref()
                .map(|v| decode_timestamp("effective_from", v))
                .transpose()?,
            effective_to: row
                .effective_to
                .as_deref()
                .map(|v| decode_timestamp("effective_to", v))
                .transpose()?,
            created_by: row.created_by,
            created_at: decode_timestamp("created_at", &row.created_at)?,
            updated_at: decode_timestamp("updated_at", &row.updated_at)?,
        })
    }
}
