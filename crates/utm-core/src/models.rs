//! Core data models for airspace zones and point checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ZoneError;
use crate::geometry::{validate_ring, BoundingBox, Position};

// ========== ZONE MODELS ==========

/// Kind of airspace restriction. Determines priority at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    /// No flights allowed
    NoFly,
    /// Flights allowed with authorization
    Restricted,
}

impl ZoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneType::NoFly => "no_fly",
            ZoneType::Restricted => "restricted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "no_fly" => Some(ZoneType::NoFly),
            "restricted" => Some(ZoneType::Restricted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    /// Participates in point checks
    #[default]
    Active,
    /// Listed but ignored by point checks
    Inactive,
    /// Soft-deleted
    Archived,
}

impl ZoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneStatus::Active => "active",
            ZoneStatus::Inactive => "inactive",
            ZoneStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(ZoneStatus::Active),
            "inactive" => Some(ZoneStatus::Inactive),
            "archived" => Some(ZoneStatus::Archived),
            _ => None,
        }
    }
}

/// GeoJSON geometry of a zone. Only single-ring polygons are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ZoneGeometry {
    Polygon { coordinates: Vec<Vec<Position>> },
}

impl ZoneGeometry {
    pub fn polygon(ring: Vec<Position>) -> Self {
        ZoneGeometry::Polygon {
            coordinates: vec![ring],
        }
    }

    /// The outer ring, `[lng, lat]` ordered.
    pub fn exterior(&self) -> &[Position] {
        match self {
            ZoneGeometry::Polygon { coordinates } => {
                coordinates.first().map(Vec::as_slice).unwrap_or(&[])
            }
        }
    }

    pub fn contains(&self, point: Position) -> bool {
        crate::geometry::ring_contains(self.exterior(), point)
    }
}

/// A registered airspace region: 2D footprint, altitude band and validity window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub status: ZoneStatus,
    pub geometry: ZoneGeometry,
    /// Floor of the band in meters
    pub min_altitude: f64,
    /// Ceiling of the band in meters
    pub max_altitude: f64,
    #[serde(default)]
    pub effective_from: Option<DateTime<Utc>>,
    /// Absent means open-ended
    #[serde(default)]
    pub effective_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Zone {
    /// Inclusive altitude band check.
    pub fn covers_altitude(&self, altitude: f64) -> bool {
        altitude >= self.min_altitude && altitude <= self.max_altitude
    }

    /// Inclusive temporal window check; missing bounds are unbounded.
    pub fn is_effective_at(&self, at: DateTime<Utc>) -> bool {
        if matches!(self.effective_from, Some(from) if at < from) {
            return false;
        }
        if matches!(self.effective_to, Some(to) if at > to) {
            return false;
        }
        true
    }

    pub fn summary(&self) -> ZoneSummary {
        ZoneSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            zone_type: self.zone_type,
            min_altitude: self.min_altitude,
            max_altitude: self.max_altitude,
        }
    }
}

/// Zone reference returned with a verdict (no geometry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub min_altitude: f64,
    pub max_altitude: f64,
}

/// Geometry exactly as submitted by a client, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryDraft {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Vec<Vec<Vec<f64>>>>,
}

impl GeometryDraft {
    pub fn polygon(ring: &[Position]) -> Self {
        Self {
            kind: Some("Polygon".to_string()),
            coordinates: Some(vec![ring.iter().map(|p| p.to_vec()).collect()]),
        }
    }

    /// Extract the single outer ring. Holes are not supported.
    fn into_ring(self) -> Result<Vec<Position>, ZoneError> {
        match self.kind.as_deref() {
            Some("Polygon") => {}
            Some(other) => {
                return Err(ZoneError::MalformedGeometry(format!(
                    "Invalid Polygon: geometry type must be \"Polygon\", got \"{other}\"."
                )))
            }
            None => return Err(ZoneError::MissingField("geometry.type")),
        }

        let mut rings = self
            .coordinates
            .ok_or(ZoneError::MissingField("geometry.coordinates"))?;
        if rings.len() != 1 {
            return Err(ZoneError::MalformedGeometry(format!(
                "Invalid Polygon: exactly one ring is supported, got {}.",
                rings.len()
            )));
        }

        rings
            .remove(0)
            .into_iter()
            .enumerate()
            .map(|(idx, position)| match position.as_slice() {
                [lng, lat, ..] => Ok([*lng, *lat]),
                _ => Err(ZoneError::MalformedGeometry(format!(
                    "Invalid Polygon: position {idx} must have at least two numbers."
                ))),
            })
            .collect()
    }
}

/// Request to create a new zone.
///
/// Every field is optional on the wire so missing values surface as
/// [`ZoneError::MissingField`] instead of a generic decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub zone_type: Option<String>,
    #[serde(default)]
    pub geometry: Option<GeometryDraft>,
    #[serde(default)]
    pub min_altitude: Option<f64>,
    #[serde(default)]
    pub max_altitude: Option<f64>,
    #[serde(default)]
    pub effective_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub effective_to: Option<DateTime<Utc>>,
}

/// A zone that has passed every write-time invariant and has no id yet.
///
/// The only way to obtain one is [`NewZone::validate`], so a store accepting
/// `NewZone` can never persist an invalid zone.
#[derive(Debug, Clone, PartialEq)]
pub struct NewZone {
    name: String,
    description: Option<String>,
    zone_type: ZoneType,
    ring: Vec<Position>,
    bbox: BoundingBox,
    min_altitude: f64,
    max_altitude: f64,
    effective_from: DateTime<Utc>,
    effective_to: Option<DateTime<Utc>>,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl NewZone {
    /// Check a draft against the zone invariants.
    ///
    /// Order: required fields, enum membership, altitude band, validity
    /// window, then polygon closure and self-intersection.
    pub fn validate(
        draft: ZoneDraft,
        created_by: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ZoneError> {
        let name = draft
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or(ZoneError::MissingField("name"))?;
        let type_raw = draft.zone_type.ok_or(ZoneError::MissingField("type"))?;
        let geometry = draft.geometry.ok_or(ZoneError::MissingField("geometry"))?;
        let max_altitude = draft
            .max_altitude
            .ok_or(ZoneError::MissingField("maxAltitude"))?;
        let min_altitude = draft.min_altitude.unwrap_or(0.0);

        let zone_type = ZoneType::parse(type_raw.trim()).ok_or_else(|| ZoneError::InvalidField {
            field: "type",
            reason: format!("`{type_raw}` is not one of no_fly, restricted"),
        })?;

        if !min_altitude.is_finite()
            || !max_altitude.is_finite()
            || min_altitude < 0.0
            || max_altitude < min_altitude
        {
            return Err(ZoneError::InvalidAltitudeRange {
                min: min_altitude,
                max: max_altitude,
            });
        }

        let effective_from = draft.effective_from.unwrap_or(now);
        if matches!(draft.effective_to, Some(to) if to < effective_from) {
            return Err(ZoneError::InvalidEffectiveWindow);
        }

        let ring = geometry.into_ring()?;
        validate_ring(&ring)?;
        let bbox = BoundingBox::of_ring(&ring).ok_or_else(|| {
            ZoneError::MalformedGeometry("Invalid Polygon: ring is empty.".to_string())
        })?;

        let description = draft
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            name,
            description,
            zone_type,
            ring,
            bbox,
            min_altitude,
            max_altitude,
            effective_from,
            effective_to: draft.effective_to,
            created_by,
            created_at: now,
        })
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Materialize the zone under a store-assigned id.
    pub fn into_zone(self, id: String) -> Zone {
        Zone {
            id,
            name: self.name,
            description: self.description,
            zone_type: self.zone_type,
            status: ZoneStatus::Active,
            geometry: ZoneGeometry::polygon(self.ring),
            min_altitude: self.min_altitude,
            max_altitude: self.max_altitude,
            effective_from: Some(self.effective_from),
            effective_to: self.effective_to,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

// ========== POINT CHECKS ==========

/// A validated 3D point to check against the registered airspace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirspacePoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters, same reference as zone altitude bands
    pub altitude: f64,
}

impl AirspacePoint {
    /// Build a point from possibly-missing inputs.
    pub fn from_parts(
        lat: Option<f64>,
        lng: Option<f64>,
        altitude: Option<f64>,
    ) -> Result<Self, ZoneError> {
        let (Some(latitude), Some(longitude), Some(altitude)) = (lat, lng, altitude) else {
            return Err(ZoneError::InvalidQuery(
                "lat, lng, and altitude are required".to_string(),
            ));
        };
        Self::new(latitude, longitude, altitude)
    }

    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Result<Self, ZoneError> {
        if !latitude.is_finite() || !longitude.is_finite() || !altitude.is_finite() {
            return Err(ZoneError::InvalidQuery(
                "lat, lng, and altitude must be finite numbers".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ZoneError::InvalidQuery("lat must be within [-90, 90]".to_string()));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ZoneError::InvalidQuery("lng must be within [-180, 180]".to_string()));
        }
        Ok(Self {
            latitude,
            longitude,
            altitude,
        })
    }

    /// GeoJSON-ordered `[lng, lat]` position.
    pub fn position(&self) -> Position {
        [self.longitude, self.latitude]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Allowed,
    NoFly,
    Restricted,
}

impl VerdictStatus {
    pub fn message(&self) -> &'static str {
        match self {
            VerdictStatus::Allowed => "Use caution",
            VerdictStatus::NoFly => "No Fly Zone Detected",
            VerdictStatus::Restricted => "Restricted Zone Detected",
        }
    }
}

/// Aggregate result of checking a point against every applicable zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub message: String,
    pub zones: Vec<ZoneSummary>,
}
