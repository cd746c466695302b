mod config;
mod hub;
mod server;

use anyhow::Result;
use clap::Parser;

use config::RelayConfig;
use server::RelayServer;

#[derive(Parser)]
#[command(name = "arena-relay")]
#[command(about = "Channel relay for arena clients")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = arena::DEFAULT_RELAY_PORT)]
    port: u16,

    #[arg(long, default_value_t = 256, help = "Lines buffered per channel")]
    channel_capacity: usize,

    #[arg(long, default_value_t = 256, help = "Lines queued per connection")]
    outbound_queue: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = RelayConfig {
        bind: args.bind,
        port: args.port,
        channel_capacity: args.channel_capacity,
        outbound_queue: args.outbound_queue,
    };

    let server = RelayServer::bind(config).await?;
    log::info!("Relay listening on {}", server.local_addr()?);

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => log::info!("Relay shutting down"),
    }

    Ok(())
}
