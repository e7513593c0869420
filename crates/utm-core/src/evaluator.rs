//! Point-in-airspace evaluation.
//!
//! The store supplies the zones whose footprint covers the point; this module
//! narrows them by altitude band and validity window and resolves a single
//! verdict. `no_fly` outranks `restricted`.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::ZoneError;
use crate::models::{AirspacePoint, Verdict, VerdictStatus, Zone, ZoneType};
use crate::store::ZoneStore;

/// Evaluates points against the zones held by a [`ZoneStore`].
pub struct AirspaceEvaluator<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for AirspaceEvaluator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ZoneStore + ?Sized> AirspaceEvaluator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check `point` against every zone in effect at `at`.
    ///
    /// Store failures surface as [`ZoneError::EvaluationFailed`]; they are
    /// transient and safe to retry.
    pub async fn evaluate(&self, point: &AirspacePoint, at: DateTime<Utc>) -> Result<Verdict, ZoneError> {
        let candidates = self
            .store
            .find_candidates(point.position())
            .await
            .map_err(ZoneError::EvaluationFailed)?;
        Ok(resolve_verdict(point, at, candidates))
    }
}

/// Keep the candidates whose altitude band and validity window cover the query.
pub fn applicable_zones(
    point: &AirspacePoint,
    at: DateTime<Utc>,
    candidates: impl IntoIterator<Item = Zone>,
) -> Vec<Zone> {
    candidates
        .into_iter()
        .filter(|zone| zone.covers_altitude(point.altitude))
        .filter(|zone| zone.is_effective_at(at))
        .collect()
}

/// Reduce geometric candidates to a verdict.
pub fn resolve_verdict(
    point: &AirspacePoint,
    at: DateTime<Utc>,
    candidates: impl IntoIterator<Item = Zone>,
) -> Verdict {
    let matching = applicable_zones(point, at, candidates);

    let status = if matching.is_empty() {
        VerdictStatus::Allowed
    } else if matching.iter().any(|zone| zone.zone_type == ZoneType::NoFly) {
        VerdictStatus::NoFly
    } else {
        VerdictStatus::Restricted
    };

    Verdict {
        status,
        message: status.message().to_string(),
        zones: matching.iter().map(Zone::summary).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeometryDraft, ZoneDraft, ZoneStatus};
    use crate::principal::{Principal, Role};
    use crate::store::create_zone;
    use crate::store::memory::MemoryZoneStore;
    use chrono::Duration;

    const SQUARE: [[f64; 2]; 5] = [[10.0, 10.0], [10.0, 20.0], [20.0, 20.0], [20.0, 10.0], [10.0, 10.0]];

    fn draft(name: &str, zone_type: &str, min: f64, max: f64) -> ZoneDraft {
        ZoneDraft {
            name: Some(name.to_string()),
            zone_type: Some(zone_type.to_string()),
            geometry: Some(GeometryDraft::polygon(&SQUARE)),
            min_altitude: Some(min),
            max_altitude: Some(max),
            ..ZoneDraft::default()
        }
    }

    async fn setup(drafts: Vec<ZoneDraft>) -> (Arc<MemoryZoneStore>, AirspaceEvaluator<MemoryZoneStore>) {
        let store = Arc::new(MemoryZoneStore::default());
        let principal = Principal::new("admin", Role::UtmAdmin);
        let created = Utc::now() - Duration::minutes(5);
        for draft in drafts {
            create_zone(store.as_ref(), draft, &principal, created).await.unwrap();
        }
        let evaluator = AirspaceEvaluator::new(store.clone());
        (store, evaluator)
    }

    fn point(lat: f64, lng: f64, altitude: f64) -> AirspacePoint {
        AirspacePoint::new(lat, lng, altitude).unwrap()
    }

    #[tokio::test]
    async fn point_inside_band_matches() {
        let (_store, evaluator) = setup(vec![draft("Square", "restricted", 0.0, 100.0)]).await;

        let verdict = evaluator.evaluate(&point(15.0, 15.0, 50.0), Utc::now()).await.unwrap();
        assert_eq!(verdict.status, VerdictStatus::Restricted);
        assert_eq!(verdict.message, "Restricted Zone Detected");
        assert_eq!(verdict.zones.len(), 1);
        assert_eq!(verdict.zones[0].name, "Square");
    }

    #[tokio::test]
    async fn point_above_band_is_excluded() {
        let (_store, evaluator) = setup(vec![draft("Square", "no_fly", 0.0, 100.0)]).await;

        let verdict = evaluator.evaluate(&point(15.0, 15.0, 150.0), Utc::now()).await.unwrap();
        assert_eq!(verdict.status, VerdictStatus::Allowed);
        assert_eq!(verdict.message, "Use caution");
        assert!(verdict.zones.is_empty());
    }

    #[tokio::test]
    async fn band_edges_are_inclusive() {
        let (_store, evaluator) = setup(vec![draft("Band", "restricted", 30.0, 100.0)]).await;
        for altitude in [30.0, 100.0] {
            let verdict = evaluator.evaluate(&point(15.0, 15.0, altitude), Utc::now()).await.unwrap();
            assert_eq!(verdict.status, VerdictStatus::Restricted, "altitude {altitude}");
        }
        let verdict = evaluator.evaluate(&point(15.0, 15.0, 29.5), Utc::now()).await.unwrap();
        assert_eq!(verdict.status, VerdictStatus::Allowed);
    }

    #[tokio::test]
    async fn no_fly_outranks_restricted() {
        let (_store, evaluator) = setup(vec![
            draft("Restricted", "restricted", 0.0, 100.0),
            draft("No Fly", "no_fly", 0.0, 100.0),
            draft("Restricted 2", "restricted", 0.0, 400.0),
        ])
        .await;

        let verdict = evaluator.evaluate(&point(15.0, 15.0, 50.0), Utc::now()).await.unwrap();
        assert_eq!(verdict.status, VerdictStatus::NoFly);
        assert_eq!(verdict.message, "No Fly Zone Detected");
        assert_eq!(verdict.zones.len(), 3);

        // Above the no-fly ceiling only the tall restricted zone applies.
        let verdict = evaluator.evaluate(&point(15.0, 15.0, 200.0), Utc::now()).await.unwrap();
        assert_eq!(verdict.status, VerdictStatus::Restricted);
        assert_eq!(verdict.zones.len(), 1);
        assert_eq!(verdict.zones[0].name, "Restricted 2");
    }

    #[tokio::test]
    async fn point_outside_footprint_is_allowed() {
        let (_store, evaluator) = setup(vec![draft("Square", "no_fly", 0.0, 100.0)]).await;
        let verdict = evaluator.evaluate(&point(25.0, 15.0, 50.0), Utc::now()).await.unwrap();
        assert_eq!(verdict.status, VerdictStatus::Allowed);
    }

    #[tokio::test]
    async fn archived_and_inactive_zones_do_not_apply() {
        let (store, evaluator) = setup(vec![
            draft("Archived", "no_fly", 0.0, 100.0),
            draft("Inactive", "restricted", 0.0, 100.0),
        ])
        .await;
        store.set_status("zone-1", ZoneStatus::Archived);
        store.set_status("zone-2", ZoneStatus::Inactive);

        let verdict = evaluator.evaluate(&point(15.0, 15.0, 50.0), Utc::now()).await.unwrap();
        assert_eq!(verdict.status, VerdictStatus::Allowed);
    }

    #[tokio::test]
    async fn validity_window_is_respected() {
        let now = Utc::now();
        let mut future = draft("Future", "no_fly", 0.0, 100.0);
        future.effective_from = Some(now + Duration::hours(1));
        let mut expired = draft("Expired", "no_fly", 0.0, 100.0);
        expired.effective_from = Some(now - Duration::hours(3));
        expired.effective_to = Some(now - Duration::hours(1));
        let mut current = draft("Current", "restricted", 0.0, 100.0);
        current.effective_to = Some(now + Duration::hours(1));

        let (_store, evaluator) = setup(vec![future, expired, current]).await;

        let verdict = evaluator.evaluate(&point(15.0, 15.0, 50.0), now).await.unwrap();
        assert_eq!(verdict.status, VerdictStatus::Restricted);
        assert_eq!(verdict.zones.len(), 1);
        assert_eq!(verdict.zones[0].name, "Current");

        let later = now + Duration::minutes(90);
        let verdict = evaluator.evaluate(&point(15.0, 15.0, 50.0), later).await.unwrap();
        assert_eq!(verdict.status, VerdictStatus::NoFly);
        assert_eq!(verdict.zones[0].name, "Future");
    }

    #[tokio::test]
    async fn store_failure_is_evaluation_failure() {
        let evaluator = AirspaceEvaluator::new(Arc::new(MemoryZoneStore::failing()));
        let err = evaluator
            .evaluate(&point(15.0, 15.0, 50.0), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, ZoneError::EvaluationFailed(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn summaries_carry_band_but_not_geometry() {
        let zone = crate::models::NewZone::validate(
            draft("Square", "no_fly", 5.0, 60.0),
            None,
            Utc::now() - Duration::minutes(1),
        )
        .unwrap()
        .into_zone("z-1".into());

        let verdict = resolve_verdict(&point(15.0, 15.0, 10.0), Utc::now(), vec![zone]);
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["status"], "no_fly");
        let summary = &json["zones"][0];
        assert_eq!(summary["id"], "z-1");
        assert_eq!(summary["type"], "no_fly");
        assert_eq!(summary["minAltitude"], 5.0);
        assert_eq!(summary["maxAltitude"], 60.0);
        assert!(summary.get("geometry").is_none());
    }
}
