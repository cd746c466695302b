use std::time::Instant;

use crate::net::RelayChannel;
use crate::physics::GeometryQuery;
use crate::player::ViewRay;
use crate::state::PlayerId;
use crate::sync::SyncEngine;

/// Height a knocked-out player is thrown to; well above any platform.
pub const KNOCKOUT_HEIGHT: f32 = 50.0;
pub const MAX_SHOT_RANGE: f32 = 1000.0;

#[derive(Debug, Clone)]
pub struct HitResolver {
    range: f32,
    knockout_height: f32,
}

impl Default for HitResolver {
    fn default() -> Self {
        Self {
            range: MAX_SHOT_RANGE,
            knockout_height: KNOCKOUT_HEIGHT,
        }
    }
}

impl HitResolver {
    pub fn new(range: f32, knockout_height: f32) -> Self {
        Self {
            range,
            knockout_height,
        }
    }

    /// Owners of every weapon marker along the ray, nearest first, each listed once.
    pub fn resolve<G: GeometryQuery>(&self, ray: &ViewRay, geometry: &G) -> Vec<PlayerId> {
        let mut owners: Vec<PlayerId> = Vec::new();

        for hit in geometry.cast(ray.origin, ray.direction, 0.0, self.range) {
            if let Some(owner) = hit.tag.weapon_owner() {
                if !owners.contains(owner) {
                    owners.push(owner.clone());
                }
            }
        }
        owners
    }

    /// Knocks out everyone the shot hits and pushes the result to the channel at once.
    pub fn fire<G: GeometryQuery, R: RelayChannel>(
        &self,
        ray: &ViewRay,
        geometry: &G,
        sync: &mut SyncEngine<R>,
        now: Instant,
    ) -> Vec<PlayerId> {
        let height = self.knockout_height;
        let knocked: Vec<PlayerId> = self
            .resolve(ray, geometry)
            .into_iter()
            .filter(|owner| sync.edit_entry(owner, |state| state.position.y = height))
            .collect();

        if knocked.is_empty() {
            log::debug!("Shot hit nobody");
            return knocked;
        }

        log::info!(
            "Shot knocked out {}",
            knocked
                .iter()
                .map(PlayerId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        sync.broadcast_full(now);
        knocked
    }
}
