use sea_orm::DbErr;
use std::sync::Arc;
use tracing::debug;

use super::{polygon, LatLng};
use crate::entity::zone;
use crate::notify::Channel;
use crate::repository::ZoneRepository;

pub const DEFAULT_CENTRAL_ZONE: &str = "โซนกลาง";

/// Where a channel message for a zone goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTarget {
    pub channel: Channel,
    pub zone_id: i32,
    pub zone_name: String,
    pub group_id: String,
}

impl GroupTarget {
    fn from_zone(zone: &zone::Model, channel: Channel) -> Option<Self> {
        let group_id = match channel {
            Channel::Line => zone.line_group_id.as_deref(),
            Channel::Telegram => zone.telegram_group_id.as_deref(),
        }?;
        let group_id = group_id.trim();
        if group_id.is_empty() {
            return None;
        }

        Some(Self {
            channel,
            zone_id: zone.id,
            zone_name: zone.name.clone(),
            group_id: group_id.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneTargets {
    pub line: Option<GroupTarget>,
    pub telegram: Option<GroupTarget>,
}

/// First zone in stored order whose polygon contains the point.
pub fn find_containing(zones: &[zone::Model], point: LatLng) -> Option<&zone::Model> {
    zones.iter().find(|zone| polygon::contains(&zone.polygon.0, point))
}

/// The zone's own group, then the central zone's, then nothing.
pub fn pick_group(
    zone: Option<&zone::Model>,
    central: Option<&zone::Model>,
    channel: Channel,
) -> Option<GroupTarget> {
    [zone, central]
        .into_iter()
        .flatten()
        .find_map(|candidate| GroupTarget::from_zone(candidate, channel))
}

#[derive(Clone)]
pub struct ZoneResolver {
    zones: Arc<dyn ZoneRepository>,
    central_zone_name: String,
}

impl ZoneResolver {
    pub fn new(zones: Arc<dyn ZoneRepository>, central_zone_name: impl Into<String>) -> Self {
        Self {
            zones,
            central_zone_name: central_zone_name.into(),
        }
    }

    pub fn central_zone_name(&self) -> &str {
        &self.central_zone_name
    }

    /// Geofence lookup, falling back to the central zone when no polygon matches.
    pub async fn locate(&self, point: LatLng) -> Result<Option<zone::Model>, DbErr> {
        let zones = self.zones.list_zones().await?;
        if let Some(found) = find_containing(&zones, point) {
            debug!(zone_id = found.id, zone = %found.name, "point matched zone polygon");
            return Ok(Some(found.clone()));
        }

        debug!(lat = point.lat, lng = point.lng, "no polygon matched, using central zone");
        Ok(zones.into_iter().find(|zone| zone.name == self.central_zone_name))
    }

    pub async fn targets_for(&self, zone: Option<&zone::Model>) -> Result<ZoneTargets, DbErr> {
        let central = self.zones.find_zone_by_name(&self.central_zone_name).await?;
        Ok(ZoneTargets {
            line: pick_group(zone, central.as_ref(), Channel::Line),
            telegram: pick_group(zone, central.as_ref(), Channel::Telegram),
        })
    }

    /// Targets for a complaint's denormalized zone id. A zone deleted since
    /// creation falls through to the central zone.
    pub async fn targets_for_zone_id(&self, zone_id: Option<i32>) -> Result<ZoneTargets, DbErr> {
        let zone = match zone_id {
            Some(id) => self.zones.find_zone_by_id(id).await?,
            None => None,
        };
        self.targets_for(zone.as_ref()).await
    }

    /// Geofence lookup followed by the channel fallback chain.
    pub async fn resolve(&self, point: LatLng, channel: Channel) -> Result<Option<GroupTarget>, DbErr> {
        let zone = self.locate(point).await?;
        let targets = self.targets_for(zone.as_ref()).await?;
        Ok(match channel {
            Channel::Line => targets.line,
            Channel::Telegram => targets.telegram,
        })
    }
}
