//! Zone store contract and the zone operations built on it.
//!
//! Backends implement [`ZoneStore`]; validation lives in this crate so every
//! backend receives only [`NewZone`] values that already satisfy the zone
//! invariants.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, ZoneError};
use crate::geometry::Position;
use crate::models::{NewZone, Zone, ZoneDraft, ZoneStatus, ZoneType};
use crate::principal::Principal;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Persistent zone storage with a spatial index.
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// Assign an id and persist atomically. The zone is never visible half-written.
    async fn insert(&self, zone: NewZone) -> Result<Zone, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Zone>, StoreError>;

    async fn list(&self, query: &ZoneQuery) -> Result<ZonePage, StoreError>;

    /// Set status to archived. `None` when the id is unknown.
    async fn archive(&self, id: &str, at: DateTime<Utc>) -> Result<Option<Zone>, StoreError>;

    /// Active zones whose footprint covers `point` (boundary included).
    async fn find_candidates(&self, point: Position) -> Result<Vec<Zone>, StoreError>;
}

// ========== LIST QUERIES ==========

/// Raw list parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub zone_type: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Everything except archived zones
    #[default]
    Unarchived,
    Only(ZoneStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: ZoneStatus) -> bool {
        match self {
            StatusFilter::Unarchived => status != ZoneStatus::Archived,
            StatusFilter::Only(expected) => status == *expected,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    Type,
    MinAltitude,
    MaxAltitude,
}

impl SortField {
    /// Unrecognized values fall back to `createdAt`.
    pub fn from_param(value: &str) -> Self {
        match value {
            "updatedAt" => SortField::UpdatedAt,
            "name" => SortField::Name,
            "type" => SortField::Type,
            "minAltitude" => SortField::MinAltitude,
            "maxAltitude" => SortField::MaxAltitude,
            _ => SortField::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// A normalized list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneQuery {
    pub status: StatusFilter,
    pub zone_type: Option<ZoneType>,
    pub search: Option<String>,
    pub page: u32,
    pub limit: u32,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl Default for ZoneQuery {
    fn default() -> Self {
        Self {
            status: StatusFilter::Unarchived,
            zone_type: None,
            search: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            sort_by: SortField::CreatedAt,
            sort_order: SortOrder::Desc,
        }
    }
}

impl ZoneQuery {
    pub fn from_params(params: &ListParams) -> Result<Self, ZoneError> {
        let status = match non_empty(&params.status) {
            Some(raw) => StatusFilter::Only(ZoneStatus::parse(raw).ok_or_else(|| {
                ZoneError::InvalidQuery(format!(
                    "status must be one of active, inactive, archived (got `{raw}`)"
                ))
            })?),
            None => StatusFilter::Unarchived,
        };

        let zone_type = match non_empty(&params.zone_type) {
            Some(raw) => Some(ZoneType::parse(raw).ok_or_else(|| {
                ZoneError::InvalidQuery(format!(
                    "type must be one of no_fly, restricted (got `{raw}`)"
                ))
            })?),
            None => None,
        };

        let page = match non_empty(&params.page).and_then(parse_leading_int) {
            Some(n) if n != 0 => n.clamp(1, u32::MAX as i64) as u32,
            _ => 1,
        };
        let limit = match non_empty(&params.limit).and_then(parse_leading_int) {
            Some(n) if n != 0 => n.clamp(1, MAX_PAGE_LIMIT as i64) as u32,
            _ => DEFAULT_PAGE_LIMIT,
        };

        let sort_by = non_empty(&params.sort_by)
            .map(SortField::from_param)
            .unwrap_or_default();
        let sort_order = match params.sort_order.as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        };

        Ok(Self {
            status,
            zone_type,
            search: non_empty(&params.search).map(str::to_string),
            page,
            limit,
            sort_by,
            sort_order,
        })
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    /// Filter predicate shared by backends that filter in memory.
    pub fn matches(&self, zone: &Zone) -> bool {
        if !self.status.matches(zone.status) {
            return false;
        }
        if matches!(self.zone_type, Some(t) if t != zone.zone_type) {
            return false;
        }
        match &self.search {
            Some(needle) => zone.name.to_lowercase().contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Integer prefix of a string, the way lenient query parsers read "12abc" as 12.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let digits_start = usize::from(raw.starts_with(['-', '+']));
    let digits_len = raw[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    raw[..digits_start + digits_len].parse().ok()
}

/// One page of zones plus the total number matching the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonePage {
    pub items: Vec<Zone>,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_count: u64,
    pub limit: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(limit.max(1) as u64);
        Self {
            current_page: page,
            total_pages,
            total_count,
            limit,
            has_next_page: (page as u64) < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneListing {
    pub data: Vec<Zone>,
    pub pagination: Pagination,
}

// ========== OPERATIONS ==========

/// Validate a draft and persist it on behalf of `principal`.
///
/// Nothing reaches the store unless every invariant holds.
pub async fn create_zone<S: ZoneStore + ?Sized>(
    store: &S,
    draft: ZoneDraft,
    principal: &Principal,
    now: DateTime<Utc>,
) -> Result<Zone, ZoneError> {
    let zone = NewZone::validate(draft, Some(principal.id.clone()), now)?;
    Ok(store.insert(zone).await?)
}

pub async fn list_zones<S: ZoneStore + ?Sized>(
    store: &S,
    params: &ListParams,
) -> Result<ZoneListing, ZoneError> {
    let query = ZoneQuery::from_params(params)?;
    let page = store.list(&query).await?;
    Ok(ZoneListing {
        data: page.items,
        pagination: Pagination::new(query.page, query.limit, page.total_count),
    })
}

pub async fn get_zone<S: ZoneStore + ?Sized>(store: &S, id: &str) -> Result<Zone, ZoneError> {
    store
        .get(id)
        .await?
        .ok_or_else(|| ZoneError::NotFound(id.to_string()))
}

/// Soft-delete a zone. Archiving an archived zone succeeds.
pub async fn archive_zone<S: ZoneStore + ?Sized>(
    store: &S,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Zone, ZoneError> {
    store
        .archive(id, now)
        .await?
        .ok_or_else(|| ZoneError::NotFound(id.to_string()))
}


#[cfg(test)]
mod tests {
    use super::memory::MemoryZoneStore;
    use super::*;
    use crate::models::GeometryDraft;
    use crate::principal::Role;
    use chrono::Duration;

    fn draft(name: &str, zone_type: &str, min: f64, max: f64) -> ZoneDraft {
        ZoneDraft {
            name: Some(name.to_string()),
            zone_type: Some(zone_type.to_string()),
            geometry: Some(GeometryDraft::polygon(&[
                [10.0, 10.0],
                [10.0, 20.0],
                [20.0, 20.0],
                [20.0, 10.0],
                [10.0, 10.0],
            ])),
            min_altitude: Some(min),
            max_altitude: Some(max),
            ..ZoneDraft::default()
        }
    }

    fn operator() -> Principal {
        Principal::new("operator-7", Role::IndividualOperator)
    }

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let mut params = ListParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "status" => params.status = value,
                "type" => params.zone_type = value,
                "search" => params.search = value,
                "page" => params.page = value,
                "limit" => params.limit = value,
                "sortBy" => params.sort_by = value,
                "sortOrder" => params.sort_order = value,
                other => panic!("unknown param {other}"),
            }
        }
        params
    }

    #[test]
    fn query_defaults() {
        let query = ZoneQuery::from_params(&ListParams::default()).unwrap();
        assert_eq!(query, ZoneQuery::default());
    }

    #[test]
    fn limit_is_clamped_and_page_floored() {
        let query = ZoneQuery::from_params(&params(&[("limit", "500"), ("page", "-3")])).unwrap();
        assert_eq!(query.limit, 100);
        assert_eq!(query.page, 1);

        let query = ZoneQuery::from_params(&params(&[("limit", "-5"), ("page", "abc")])).unwrap();
        assert_eq!(query.limit, 1);
        assert_eq!(query.page, 1);

        let query = ZoneQuery::from_params(&params(&[("limit", "0"), ("page", "3x")])).unwrap();
        assert_eq!(query.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(query.page, 3);
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn unknown_sort_falls_back_to_created_at() {
        let query = ZoneQuery::from_params(&params(&[
            ("sortBy", "geometry"),
            ("sortOrder", "sideways"),
        ]))
        .unwrap();
        assert_eq!(query.sort_by, SortField::CreatedAt);
        assert_eq!(query.sort_order, SortOrder::Desc);

        let query =
            ZoneQuery::from_params(&params(&[("sortBy", "maxAltitude"), ("sortOrder", "asc")]))
                .unwrap();
        assert_eq!(query.sort_by, SortField::MaxAltitude);
        assert_eq!(query.sort_order, SortOrder::Asc);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = ZoneQuery::from_params(&params(&[("status", "deleted")])).unwrap_err();
        assert_eq!(err.code(), "invalid_query");
        let err = ZoneQuery::from_params(&params(&[("type", "advisory")])).unwrap_err();
        assert_eq!(err.code(), "invalid_query");
    }

    #[test]
    fn pagination_metadata() {
        let page = Pagination::new(1, 10, 50);
        assert_eq!(page.total_pages, 5);
        assert!(page.has_next_page);
        assert!(!page.has_prev_page);

        let last = Pagination::new(5, 10, 50);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);

        let partial = Pagination::new(1, 10, 51);
        assert_eq!(partial.total_pages, 6);

        let empty = Pagination::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }

    #[tokio::test]
    async fn create_records_principal() {
        let store = MemoryZoneStore::default();
        let zone = create_zone(&store, draft("A", "no_fly", 0.0, 100.0), &operator(), Utc::now())
            .await
            .unwrap();
        assert_eq!(zone.created_by.as_deref(), Some("operator-7"));
        assert_eq!(zone.status, ZoneStatus::Active);
    }

    #[tokio::test]
    async fn invalid_drafts_never_reach_the_store() {
        let store = MemoryZoneStore::default();
        let err = create_zone(&store, draft("A", "no_fly", 200.0, 100.0), &operator(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ZoneError::InvalidAltitudeRange { .. }));

        let mut bowtie = draft("B", "no_fly", 0.0, 100.0);
        bowtie.geometry = Some(GeometryDraft::polygon(&[
            [0.0, 0.0],
            [10.0, 10.0],
            [0.0, 10.0],
            [10.0, 0.0],
            [0.0, 0.0],
        ]));
        let err = create_zone(&store, bowtie, &operator(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ZoneError::SelfIntersectingPolygon { .. }));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn list_paginates_fifty_zones() {
        let store = MemoryZoneStore::default();
        let start = Utc::now();
        for i in 0..50 {
            create_zone(
                &store,
                draft(&format!("Zone {i:02}"), "restricted", 0.0, 100.0),
                &operator(),
                start + Duration::seconds(i),
            )
            .await
            .unwrap();
        }

        let listing = list_zones(&store, &params(&[("limit", "10"), ("page", "1")]))
            .await
            .unwrap();
        assert_eq!(listing.data.len(), 10);
        assert_eq!(listing.pagination.total_pages, 5);
        assert_eq!(listing.pagination.total_count, 50);
        assert!(listing.pagination.has_next_page);
        assert!(!listing.pagination.has_prev_page);
        // Newest first by default.
        assert_eq!(listing.data[0].name, "Zone 49");

        let listing = list_zones(&store, &params(&[("limit", "500")])).await.unwrap();
        assert_eq!(listing.pagination.limit, 100);
        assert_eq!(listing.data.len(), 50);
    }

    #[tokio::test]
    async fn list_filters_by_type_and_search() {
        let store = MemoryZoneStore::default();
        let now = Utc::now();
        create_zone(&store, draft("Harbor Approach", "no_fly", 0.0, 100.0), &operator(), now)
            .await
            .unwrap();
        create_zone(&store, draft("Stadium", "restricted", 0.0, 100.0), &operator(), now)
            .await
            .unwrap();

        let listing = list_zones(&store, &params(&[("type", "no_fly")])).await.unwrap();
        assert_eq!(listing.data.len(), 1);
        assert_eq!(listing.data[0].name, "Harbor Approach");

        let listing = list_zones(&store, &params(&[("search", "STAD")])).await.unwrap();
        assert_eq!(listing.data.len(), 1);
        assert_eq!(listing.data[0].name, "Stadium");
    }

    #[tokio::test]
    async fn archive_hides_zone_and_is_idempotent() {
        let store = MemoryZoneStore::default();
        let zone = create_zone(&store, draft("A", "no_fly", 0.0, 100.0), &operator(), Utc::now())
            .await
            .unwrap();

        let archived = archive_zone(&store, &zone.id, Utc::now()).await.unwrap();
        assert_eq!(archived.status, ZoneStatus::Archived);
        let again = archive_zone(&store, &zone.id, Utc::now()).await.unwrap();
        assert_eq!(again.status, ZoneStatus::Archived);

        let listing = list_zones(&store, &ListParams::default()).await.unwrap();
        assert!(listing.data.is_empty());
        let listing = list_zones(&store, &params(&[("status", "archived")])).await.unwrap();
        assert_eq!(listing.data.len(), 1);

        let err = archive_zone(&store, "missing", Utc::now()).await.unwrap_err();
        assert!(matches!(err, ZoneError::NotFound(_)));
        let err = get_zone(&store, "missing").await.unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn leading_integer_parsing() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int("  7px"), Some(7));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("x1"), None);
        assert_eq!(parse_leading_int("-"), None);
    }
}
