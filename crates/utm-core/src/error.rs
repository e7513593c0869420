//! Error types shared by the zone store and the airspace evaluator.

use thiserror::Error;

use crate::geometry::GeometryError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure inside a [`ZoneStore`](crate::store::ZoneStore) backend.
///
/// Always treated as transient infrastructure trouble; the caller may retry.
#[derive(Debug, Error)]
#[error("zone store failure: {source}")]
pub struct StoreError {
    #[source]
    source: BoxError,
}

impl StoreError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Errors surfaced by zone operations.
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("maxAltitude ({max}) must be greater than or equal to minAltitude ({min}), and both must be non-negative")]
    InvalidAltitudeRange { min: f64, max: f64 },

    #[error("effectiveFrom must not be later than effectiveTo")]
    InvalidEffectiveWindow,

    #[error("{0}")]
    MalformedGeometry(String),

    #[error("Invalid Polygon: Self-intersection detected.")]
    SelfIntersectingPolygon { first_edge: usize, second_edge: usize },

    #[error("{0}")]
    InvalidQuery(String),

    #[error("Zone not found")]
    NotFound(String),

    #[error("Spatial check failed")]
    EvaluationFailed(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ZoneError {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            ZoneError::MissingField(_) => "missing_field",
            ZoneError::InvalidField { .. } => "invalid_field",
            ZoneError::InvalidAltitudeRange { .. } => "invalid_altitude_range",
            ZoneError::InvalidEffectiveWindow => "invalid_effective_window",
            ZoneError::MalformedGeometry(_) => "malformed_polygon",
            ZoneError::SelfIntersectingPolygon { .. } => "self_intersecting_polygon",
            ZoneError::InvalidQuery(_) => "invalid_query",
            ZoneError::NotFound(_) => "not_found",
            ZoneError::EvaluationFailed(_) => "evaluation_failed",
            ZoneError::Store(_) => "internal_error",
        }
    }

    /// Whether the caller can fix the request; everything else is infrastructure.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ZoneError::EvaluationFailed(_) | ZoneError::Store(_))
    }
}

impl From<GeometryError> for ZoneError {
    fn from(err: GeometryError) -> Self {
        match err {
            GeometryError::Malformed(_) => ZoneError::MalformedGeometry(err.to_string()),
            GeometryError::SelfIntersecting { first, second } => {
                ZoneError::SelfIntersectingPolygon {
                    first_edge: first,
                    second_edge: second,
                }
            }
        }
    }
}
