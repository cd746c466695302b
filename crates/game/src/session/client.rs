use std::time::Instant;

use rand::rngs::StdRng;

use super::Session;
use crate::combat::HitResolver;
use crate::map::SpawnArea;
use crate::net::RelayChannel;
use crate::physics::{GeometryQuery, PhysicsConfig, PhysicsSimulator};
use crate::player::{CameraRig, InputFlags, InputState, LocalPlayer};
use crate::state::PlayerId;
use crate::sync::{RosterEvent, RosterSink, SyncConfig, SyncEngine};

#[derive(Debug, Clone, Default)]
pub struct ClientSettings {
    pub sync: SyncConfig,
    pub physics: PhysicsConfig,
    pub camera: CameraRig,
    pub combat: HitResolver,
}

/// What one tick did, for the caller to log or render.
#[derive(Debug, Default)]
pub struct TickReport {
    pub tick: u64,
    pub messages: usize,
    pub events: Vec<RosterEvent>,
    pub knocked_out: Vec<PlayerId>,
    pub teleported: bool,
    pub respawned: bool,
    pub grounded: bool,
    pub broadcast: bool,
}

/// One player's view of the game: local simulation wired to the channel and the arena.
pub struct GameClient<R, G> {
    sync: SyncEngine<R>,
    geometry: G,
    player: LocalPlayer,
    physics: PhysicsSimulator,
    hits: HitResolver,
    camera: CameraRig,
    spawn: SpawnArea,
    rng: StdRng,
}

impl<R, G> GameClient<R, G>
where
    R: RelayChannel,
    G: GeometryQuery + RosterSink,
{
    pub fn new(
        relay: R,
        session: Session,
        geometry: G,
        spawn: SpawnArea,
        settings: ClientSettings,
        mut rng: StdRng,
    ) -> Self {
        let player = LocalPlayer::new(spawn.sample(&mut rng));
        log::info!(
            "Player {} spawning at {} on channel {}",
            session.player_id(),
            player.transform.position,
            session.channel()
        );

        let sync = SyncEngine::new(relay, session, player.state(), settings.sync);

        Self {
            sync,
            geometry,
            player,
            physics: PhysicsSimulator::new(settings.physics),
            hits: settings.combat,
            camera: settings.camera,
            spawn,
            rng,
        }
    }

    /// Tells peers we exist; their snapshot replies fill in the rest of the world.
    pub fn start(&mut self, now: Instant) -> bool {
        self.sync.announce(now)
    }

    pub fn tick(&mut self, input: &mut InputState, now: Instant) -> TickReport {
        let mut report = TickReport {
            messages: self.sync.pump(now),
            ..Default::default()
        };

        if let Some(pose) = self.sync.take_override() {
            self.player.teleport(&pose);
            self.physics.reset_velocity();
            report.teleported = true;
        }

        let look = input.take_look();
        self.player.apply_look(look, &self.camera);

        let step = self
            .physics
            .step(input, &mut self.player.transform, &self.geometry);
        report.grounded = step.grounded;

        if step.fell_out {
            self.respawn();
            report.respawned = true;
        }

        if input.consume(InputFlags::FIRE) {
            let ray = self.player.view_ray(&self.camera);
            report.knocked_out = self.hits.fire(&ray, &self.geometry, &mut self.sync, now);
        }

        let live = self.player.state();
        report.broadcast = self.sync.broadcast_if_drifted(&live, now);
        self.sync.housekeeping(&live, now);

        report.events = self.sync.drain_events().collect();
        for event in &report.events {
            self.geometry.on_roster_event(event);
        }

        report.tick = self.sync.session_mut().advance_tick();
        report
    }

    pub fn respawn(&mut self) {
        self.player.transform = self.spawn.sample(&mut self.rng);
        self.physics.reset_velocity();
        log::info!("Respawned at {}", self.player.transform.position);
    }

    pub fn shutdown(&mut self) {
        log::info!(
            "Leaving channel {} after {} ticks",
            self.sync.session().channel(),
            self.sync.session().tick()
        );
        self.sync.close();
    }

    pub fn session(&self) -> &Session {
        self.sync.session()
    }

    pub fn sync(&self) -> &SyncEngine<R> {
        &self.sync
    }

    pub fn sync_mut(&mut self) -> &mut SyncEngine<R> {
        &mut self.sync
    }

    pub fn player(&self) -> &LocalPlayer {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut LocalPlayer {
        &mut self.player
    }

    pub fn physics(&self) -> &PhysicsSimulator {
        &self.physics
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }
}
