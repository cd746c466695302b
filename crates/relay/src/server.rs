use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use arena::{ChannelEnvelope, MAX_LINE_BYTES};

use crate::config::RelayConfig;
use crate::hub::{ChannelHub, Line};

pub struct RelayServer {
    listener: TcpListener,
    hub: Arc<ChannelHub>,
    config: RelayConfig,
    next_connection: u64,
}

impl RelayServer {
    pub async fn bind(config: RelayConfig) -> io::Result<Self> {
        let listener = TcpListener::bind((config.bind.as_str(), config.port)).await?;

        Ok(Self {
            listener,
            hub: Arc::new(ChannelHub::new(config.channel_capacity)),
            config,
            next_connection: 0,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn hub(&self) -> Arc<ChannelHub> {
        Arc::clone(&self.hub)
    }

    pub async fn run(mut self) -> io::Result<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            self.next_connection += 1;
            let id = self.next_connection;

            log::info!("Connection {} from {}", id, addr);
            let connection = Connection {
                id,
                hub: Arc::clone(&self.hub),
                outbound_queue: self.config.outbound_queue,
                joined: HashMap::new(),
            };
            tokio::spawn(connection.serve(stream));
        }
    }
}

struct Membership {
    sender: broadcast::Sender<Line>,
    forwarder: JoinHandle<()>,
}

struct Connection {
    id: u64,
    hub: Arc<ChannelHub>,
    outbound_queue: usize,
    joined: HashMap<String, Membership>,
}

impl Connection {
    async fn serve(mut self, stream: TcpStream) {
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("Connection {}: nodelay unavailable: {}", self.id, e);
        }

        let (reader, writer) = stream.into_split();
        let (outbound, queue) = mpsc::channel(self.outbound_queue.max(1));
        let writer = tokio::spawn(write_lines(self.id, writer, queue));

        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => self.route(line, &outbound),
                Ok(None) => break,
                Err(e) => {
                    log::warn!("Connection {} read failed: {}", self.id, e);
                    break;
                }
            }
        }

        for (_, membership) in self.joined.drain() {
            membership.forwarder.abort();
            // Resolves once the task is dropped, releasing its channel receiver.
            let _ = membership.forwarder.await;
        }
        writer.abort();
        self.hub.prune();
        log::info!("Connection {} closed", self.id);
    }

    fn route(&mut self, line: String, outbound: &mpsc::Sender<Line>) {
        if line.len() > MAX_LINE_BYTES {
            log::warn!(
                "Connection {} sent an oversized line ({} bytes), dropping",
                self.id,
                line.len()
            );
            return;
        }

        let channel = match ChannelEnvelope::decode(&line) {
            Ok(envelope) => envelope.game,
            Err(e) => {
                log::debug!("Connection {} sent an unroutable line: {}", self.id, e);
                return;
            }
        };

        let sender = match self.joined.entry(channel) {
            Entry::Occupied(entry) => entry.get().sender.clone(),
            Entry::Vacant(slot) => {
                let (sender, receiver) = self.hub.subscribe(slot.key());
                let forwarder = tokio::spawn(forward(
                    self.id,
                    slot.key().clone(),
                    receiver,
                    outbound.clone(),
                ));
                log::info!(
                    "Connection {} joined channel {} ({} members)",
                    self.id,
                    slot.key(),
                    self.hub.member_count(slot.key())
                );
                slot.insert(Membership {
                    sender: sender.clone(),
                    forwarder,
                });
                sender
            }
        };

        // There is always at least our own receiver, so this only fails during teardown.
        let _ = sender.send(Line::from(line));
    }
}

async fn forward(
    id: u64,
    channel: String,
    mut receiver: broadcast::Receiver<Line>,
    outbound: mpsc::Sender<Line>,
) {
    loop {
        match receiver.recv().await {
            Ok(line) => {
                if outbound.send(line).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                log::warn!(
                    "Connection {} lagged on channel {}, skipped {} lines",
                    id,
                    channel,
                    skipped
                );
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn write_lines(id: u64, mut writer: OwnedWriteHalf, mut queue: mpsc::Receiver<Line>) {
    while let Some(line) = queue.recv().await {
        let written = async {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await
        };
        if let Err(e) = written.await {
            log::debug!("Connection {} write failed: {}", id, e);
            break;
        }
    }
}
