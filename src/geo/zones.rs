use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

use super::polygon::{close_ring, distinct_vertex_count};
use crate::entity::zone;
use crate::model::global_error::{AppError, ErrorCode, ValidationFieldError};
use crate::model::zone::ZoneRequest;
use crate::repository::{ZoneFields, ZoneRepository};

fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn valid_vertex([lat, lng]: [f64; 2]) -> bool {
    lat.is_finite() && lng.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)
}

/// Normalizes a zone request: trimmed name, closed ring, blank group ids dropped.
pub fn validate_zone(request: &ZoneRequest) -> Result<ZoneFields, AppError> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::ValidationError(vec![ValidationFieldError::new(
            "name",
            "กรุณาระบุชื่อโซน",
        )]));
    }

    if let Some(bad) = request.polygon.iter().find(|v| !valid_vertex(**v)) {
        return Err(AppError::with_detail(
            ErrorCode::InvalidPolygon,
            format!("vertex {:?} is out of range", bad),
        ));
    }
    if distinct_vertex_count(&request.polygon) < 3 {
        return Err(AppError::with_detail(
            ErrorCode::InvalidPolygon,
            format!("{} distinct vertices", distinct_vertex_count(&request.polygon)),
        ));
    }

    Ok(ZoneFields {
        name,
        polygon: close_ring(request.polygon.clone()),
        line_group_id: blank_to_none(request.line_group_id.as_deref()),
        telegram_group_id: blank_to_none(request.telegram_group_id.as_deref()),
    })
}

#[derive(Clone)]
pub struct ZoneAdmin {
    zones: Arc<dyn ZoneRepository>,
}

impl ZoneAdmin {
    pub fn new(zones: Arc<dyn ZoneRepository>) -> Self {
        Self { zones }
    }

    pub async fn list_zones(&self) -> Result<Vec<zone::Model>, AppError> {
        Ok(self.zones.list_zones().await?)
    }

    async fn ensure_unique_name(&self, name: &str, except: Option<i32>) -> Result<(), AppError> {
        match self.zones.find_zone_by_name(name).await? {
            Some(existing) if Some(existing.id) != except => Err(AppError::with_detail(
                ErrorCode::DuplicateZoneName,
                name.to_string(),
            )),
            _ => Ok(()),
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_zone(&self, request: ZoneRequest, now: DateTime<Utc>) -> Result<zone::Model, AppError> {
        let fields = validate_zone(&request)?;
        self.ensure_unique_name(&fields.name, None).await?;

        let zone = self.zones.create_zone(fields, now).await?;
        info!(zone_id = zone.id, "zone created");
        Ok(zone)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn update_zone(
        &self,
        id: i32,
        request: ZoneRequest,
        now: DateTime<Utc>,
    ) -> Result<zone::Model, AppError> {
        let fields = validate_zone(&request)?;
        if self.zones.find_zone_by_id(id).await?.is_none() {
            return Err(AppError::new(ErrorCode::ZoneNotFound));
        }
        self.ensure_unique_name(&fields.name, Some(id)).await?;

        let zone = self
            .zones
            .update_zone(id, fields, now)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::ZoneNotFound))?;
        info!(zone_id = zone.id, "zone updated");
        Ok(zone)
    }

    #[instrument(skip(self))]
    pub async fn delete_zone(&self, id: i32) -> Result<(), AppError> {
        if !self.zones.delete_zone(id).await? {
            return Err(AppError::new(ErrorCode::ZoneNotFound));
        }
        info!(zone_id = id, "zone deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::global_error::ErrorKind;
    use crate::testing::MemoryStore;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 7, 0, 0).unwrap()
    }

    fn request(name: &str, polygon: Vec<[f64; 2]>) -> ZoneRequest {
        ZoneRequest {
            name: name.to_string(),
            polygon,
            line_group_id: Some(" C-line ".to_string()),
            telegram_group_id: Some("  ".to_string()),
        }
    }

    fn triangle() -> Vec<[f64; 2]> {
        vec![[13.0, 100.0], [13.0, 101.0], [14.0, 100.5]]
    }

    #[tokio::test]
    async fn open_ring_is_closed_on_create() {
        let store = Arc::new(MemoryStore::default());
        let admin = ZoneAdmin::new(store.clone());

        let zone = admin.create_zone(request(" เขต 1 ", triangle()), now()).await.unwrap();

        let ring = &zone.polygon.0;
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[0], ring[ring.len() - 1]);
        assert_eq!(zone.name, "เขต 1");
        assert_eq!(zone.line_group_id.as_deref(), Some("C-line"));
        assert_eq!(zone.telegram_group_id, None);
    }

    #[test]
    fn closed_ring_is_kept_as_is() {
        let mut ring = triangle();
        ring.push(ring[0]);
        let fields = validate_zone(&request("z", ring.clone())).unwrap();
        assert_eq!(fields.polygon, ring);
    }

    #[test]
    fn degenerate_or_out_of_range_polygons_are_rejected() {
        let two_points = vec![[13.0, 100.0], [13.0, 101.0], [13.0, 100.0]];
        let err = validate_zone(&request("z", two_points)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidPolygon);

        let off_planet = vec![[13.0, 100.0], [95.0, 101.0], [14.0, 100.5]];
        assert_eq!(validate_zone(&request("z", off_planet)).unwrap_err().code(), ErrorCode::InvalidPolygon);

        let nan = vec![[13.0, 100.0], [f64::NAN, 101.0], [14.0, 100.5]];
        assert_eq!(validate_zone(&request("z", nan)).unwrap_err().code(), ErrorCode::InvalidPolygon);

        let err = validate_zone(&request("  ", triangle())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn names_must_be_unique() {
        let store = Arc::new(MemoryStore::default());
        let admin = ZoneAdmin::new(store.clone());
        let first = admin.create_zone(request("A", triangle()), now()).await.unwrap();
        let second = admin.create_zone(request("B", triangle()), now()).await.unwrap();

        let err = admin.create_zone(request("A", triangle()), now()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateZoneName);

        let err = admin.update_zone(second.id, request("A", triangle()), now()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateZoneName);

        // renaming a zone to its own name is fine
        admin.update_zone(first.id, request("A", triangle()), now()).await.unwrap();
        assert_eq!(store.zone_count(), 2);
    }

    #[tokio::test]
    async fn unknown_zone_is_not_found() {
        let admin = ZoneAdmin::new(Arc::new(MemoryStore::default()));

        let err = admin.update_zone(7, request("A", triangle()), now()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = admin.delete_zone(7).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ZoneNotFound);
    }

    #[tokio::test]
    async fn update_replaces_fields_and_delete_removes() {
        let store = Arc::new(MemoryStore::default());
        let admin = ZoneAdmin::new(store.clone());
        let zone = admin.create_zone(request("A", triangle()), now()).await.unwrap();

        let mut change = request("A2", vec![[12.0, 99.0], [12.0, 100.0], [13.0, 100.0], [13.0, 99.0]]);
        change.telegram_group_id = Some("T-9".to_string());
        let later = now() + chrono::Duration::minutes(5);
        let updated = admin.update_zone(zone.id, change, later).await.unwrap();

        assert_eq!(updated.name, "A2");
        assert_eq!(updated.telegram_group_id.as_deref(), Some("T-9"));
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.created_at, zone.created_at);
        let ring = &updated.polygon.0;
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());

        admin.delete_zone(zone.id).await.unwrap();
        assert!(admin.list_zones().await.unwrap().is_empty());
    }
}
