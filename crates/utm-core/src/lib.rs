pub mod error;
pub mod evaluator;
pub mod geometry;
pub mod models;
pub mod principal;
pub mod store;

pub use error::{StoreError, ZoneError};
pub use evaluator::{applicable_zones, resolve_verdict, AirspaceEvaluator};
pub use geometry::{validate_ring, BoundingBox, GeometryError, Position};
pub use models::{
    AirspacePoint, GeometryDraft, NewZone, Verdict, VerdictStatus, Zone, ZoneDraft, ZoneGeometry,
    ZoneStatus, ZoneSummary, ZoneType,
};
pub use principal::{Principal, Role};
pub use store::{
    archive_zone, create_zone, get_zone, list_zones, ListParams, Pagination, SortField, SortOrder,
    StatusFilter, ZoneListing, ZonePage, ZoneQuery, ZoneStore,
};
