mod bot;
mod config;

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;

use arena::{
    ArenaLayout, ArenaWorld, FixedTimestep, GameClient, HitResolver, InputState, KNOCKOUT_HEIGHT,
    MergePolicy, RosterEvent, Session, TcpRelay, TickReport, UuidIds,
};
use bot::WanderBot;
use config::ClientConfig;

#[derive(Parser)]
#[command(name = "arena-client")]
#[command(about = "Headless arena client driven by a wandering bot")]
struct Args {
    #[arg(short, long, help = "Relay address (e.g., 127.0.0.1:27016)")]
    relay: Option<String>,

    #[arg(short, long, default_value = "arena")]
    channel: String,

    #[arg(short, long, default_value_t = arena::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(long, help = "Merge state by per-player sequence numbers")]
    versioned: bool,

    #[arg(long, help = "Forget players silent for this many seconds")]
    reap_after_secs: Option<u64>,

    #[arg(long, help = "Re-send our state after this many idle seconds")]
    heartbeat_secs: Option<u64>,

    #[arg(long, help = "Longest distance a shot reaches")]
    shot_range: Option<f32>,

    #[arg(long, help = "Stop after this many ticks")]
    ticks: Option<u64>,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        let mut config = ClientConfig {
            channel: self.channel.as_str().into(),
            tick_rate: self.tick_rate,
            max_ticks: self.ticks,
            ..Default::default()
        };

        if let Some(relay) = self.relay {
            config.relay_addr = relay;
        }
        if self.versioned {
            config.settings.sync.policy = MergePolicy::Versioned;
        }
        config.settings.sync.reap_after = self.reap_after_secs.map(Duration::from_secs);
        config.settings.sync.heartbeat = self.heartbeat_secs.map(Duration::from_secs);
        if let Some(range) = self.shot_range {
            config.settings.combat = HitResolver::new(range, KNOCKOUT_HEIGHT);
        }
        config
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config();

    let relay = TcpRelay::connect(config.relay_addr.as_str(), config.connect_timeout)
        .with_context(|| format!("connecting to relay at {}", config.relay_addr))?;

    let layout = ArenaLayout::arena();
    let session = Session::generate(config.channel.clone(), &mut UuidIds);
    let mut client = GameClient::new(
        relay,
        session,
        ArenaWorld::from_layout(&layout),
        *layout.spawn(),
        config.settings.clone(),
        StdRng::from_entropy(),
    );

    run(&mut client, &config);

    client.shutdown();
    let stats = client.sync().stats();
    log::info!(
        "Sent {} messages ({} bytes), received {} ({} bytes), {} filtered, {} malformed",
        stats.messages_sent,
        stats.bytes_sent,
        stats.messages_received,
        stats.bytes_received,
        stats.filtered,
        stats.malformed
    );

    Ok(())
}

fn run(client: &mut GameClient<TcpRelay, ArenaWorld>, config: &ClientConfig) {
    let mut bot = WanderBot::new(StdRng::from_entropy());
    let mut input = InputState::new();
    let mut timestep = FixedTimestep::new(config.tick_rate);
    let mut last_frame = Instant::now();

    client.start(last_frame);

    loop {
        let now = Instant::now();
        timestep.accumulate(now.duration_since(last_frame).as_secs_f32());
        last_frame = now;

        while timestep.consume_tick() {
            bot.drive(client.session().tick(), &mut input);
            let report = client.tick(&mut input, now);
            log_report(&report);

            if config.finished(report.tick) {
                return;
            }
        }

        thread::sleep(Duration::from_millis(1));
    }
}

fn log_report(report: &TickReport) {
    for event in &report.events {
        match event {
            RosterEvent::Joined { id, state } => {
                log::info!("{} joined at {}", id, state.position);
            }
            RosterEvent::Moved { id, state } => {
                log::trace!("{} moved to {}", id, state.position);
            }
            RosterEvent::Left { id } => log::info!("{} left", id),
        }
    }

    if !report.knocked_out.is_empty() {
        log::info!("Tick {}: knocked out {:?}", report.tick, report.knocked_out);
    }
    if report.teleported {
        log::info!("Tick {}: knocked out by a peer", report.tick);
    }
    if report.respawned {
        log::info!("Tick {}: fell out of the arena", report.tick);
    }
}
