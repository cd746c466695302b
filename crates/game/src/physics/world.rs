use std::collections::HashMap;

use glam::Vec3;
use log::{debug, trace};
use rapier3d::prelude::*;

use super::{GeometryQuery, ObjectTag, RayHit};
use crate::map::ArenaLayout;
use crate::state::{PlayerId, PlayerState};
use crate::sync::{RosterEvent, RosterSink};

/// Placeholder geometry for a remote player: a body column with the weapon marker on top.
#[derive(Debug, Clone)]
pub struct ActorShape {
    pub body_radius: f32,
    pub body_half_height: f32,
    pub marker_radius: f32,
    pub marker_height: f32,
}

impl Default for ActorShape {
    fn default() -> Self {
        Self {
            body_radius: 0.4,
            body_half_height: 0.5,
            marker_radius: 0.6,
            marker_height: 1.5,
        }
    }
}

struct ActorColliders {
    body: ColliderHandle,
    marker: ColliderHandle,
}

/// Static arena geometry plus one set of colliders per remote player.
///
/// Colliders are never stepped; ray casts test every collider directly, so
/// moves are visible to the next query without a broad-phase update.
pub struct ArenaWorld {
    islands: IslandManager,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    tags: HashMap<ColliderHandle, ObjectTag>,
    actors: HashMap<PlayerId, ActorColliders>,
    actor_shape: ActorShape,
}

impl Default for ArenaWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaWorld {
    pub fn new() -> Self {
        Self {
            islands: IslandManager::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            tags: HashMap::new(),
            actors: HashMap::new(),
            actor_shape: ActorShape::default(),
        }
    }

    pub fn from_layout(layout: &ArenaLayout) -> Self {
        let mut world = Self::new();
        for platform in layout.platforms() {
            world.add_platform(platform.center, platform.half_extents);
        }
        debug!("Arena built with {} platforms", layout.platforms().len());
        world
    }

    pub fn add_platform(&mut self, center: Vec3, half_extents: Vec3) -> ColliderHandle {
        self.add_box(center, half_extents, ObjectTag::Platform)
    }

    pub fn add_scenery(&mut self, center: Vec3, half_extents: Vec3) -> ColliderHandle {
        self.add_box(center, half_extents, ObjectTag::Scenery)
    }

    fn add_box(&mut self, center: Vec3, half_extents: Vec3, tag: ObjectTag) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(Vector::new(center.x, center.y, center.z))
            .build();
        let handle = self.colliders.insert(collider);
        self.tags.insert(handle, tag);
        handle
    }

    pub fn has_actor(&self, id: &PlayerId) -> bool {
        self.actors.contains_key(id)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn spawn_actor(&mut self, id: &PlayerId, state: &PlayerState) {
        if self.actors.contains_key(id) {
            self.move_actor(id, state);
            return;
        }

        let (body_center, marker_center) = self.actor_centers(state.position);

        let body = ColliderBuilder::cylinder(
            self.actor_shape.body_half_height,
            self.actor_shape.body_radius,
        )
        .translation(Vector::new(body_center.x, body_center.y, body_center.z))
        .build();
        let body = self.colliders.insert(body);
        self.tags.insert(body, ObjectTag::Actor { owner: id.clone() });

        let marker = ColliderBuilder::ball(self.actor_shape.marker_radius)
            .translation(Vector::new(marker_center.x, marker_center.y, marker_center.z))
            .build();
        let marker = self.colliders.insert(marker);
        self.tags
            .insert(marker, ObjectTag::WeaponMarker { owner: id.clone() });

        self.actors.insert(id.clone(), ActorColliders { body, marker });
        debug!("Spawned actor {}", id);
    }

    /// Moves an actor's colliders, creating them if the actor is unknown.
    pub fn move_actor(&mut self, id: &PlayerId, state: &PlayerState) {
        let Some(actor) = self.actors.get(id) else {
            self.spawn_actor(id, state);
            return;
        };

        let (body_center, marker_center) = self.actor_centers(state.position);
        if let Some(collider) = self.colliders.get_mut(actor.body) {
            collider.set_translation(Vector::new(body_center.x, body_center.y, body_center.z));
        }
        if let Some(collider) = self.colliders.get_mut(actor.marker) {
            collider.set_translation(Vector::new(
                marker_center.x,
                marker_center.y,
                marker_center.z,
            ));
        }
        trace!("Moved actor {} to {}", id, state.position);
    }

    pub fn remove_actor(&mut self, id: &PlayerId) -> bool {
        let Some(actor) = self.actors.remove(id) else {
            return false;
        };

        for handle in [actor.body, actor.marker] {
            self.colliders
                .remove(handle, &mut self.islands, &mut self.bodies, true);
            self.tags.remove(&handle);
        }
        debug!("Removed actor {}", id);
        true
    }

    fn actor_centers(&self, position: Vec3) -> (Vec3, Vec3) {
        let body = position + Vec3::Y * self.actor_shape.body_half_height;
        let marker = position + Vec3::Y * self.actor_shape.marker_height;
        (body, marker)
    }
}

impl GeometryQuery for ArenaWorld {
    fn cast(&self, origin: Vec3, direction: Vec3, min: f32, max: f32) -> Vec<RayHit> {
        if max < min {
            return Vec::new();
        }

        let ray = Ray::new(
            Vector::new(origin.x, origin.y, origin.z),
            Vector::new(direction.x, direction.y, direction.z),
        );

        let mut hits: Vec<RayHit> = self
            .colliders
            .iter()
            .filter_map(|(handle, collider)| {
                let toi = collider
                    .shape()
                    .cast_ray(collider.position(), &ray, max, true)?;
                if toi < min {
                    return None;
                }
                let tag = self.tags.get(&handle)?.clone();
                Some(RayHit {
                    tag,
                    distance: toi,
                    point: origin + direction * toi,
                })
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

impl RosterSink for ArenaWorld {
    fn on_roster_event(&mut self, event: &RosterEvent) {
        match event {
            RosterEvent::Joined { id, state } => self.spawn_actor(id, state),
            RosterEvent::Moved { id, state } => self.move_actor(id, state),
            RosterEvent::Left { id } => {
                self.remove_actor(id);
            }
        }
    }
}
