//! TCP Game Server
//!
//! Async TCP server for the arena. Accepts raw socket connections, assigns
//! each one a player, and runs the authoritative simulation loop: drain
//! client input until the tick deadline, advance the game once, broadcast a
//! snapshot to every connection.
//!
//! All game state lives in the single loop task. Per-connection reader and
//! writer tasks only shuttle bytes; they never touch the simulation.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::game::state::{GameState, PlayerId};
use crate::game::tick::tick;
use crate::network::framer::InputFramer;
use crate::network::protocol::SnapshotEncoder;

/// Port the server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 15466;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Tick rate for game simulation (Hz).
    pub tick_rate: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            tick_rate: 60,
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind or inspect the listening socket.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),
}

/// Requests a running server to stop. Cheap to clone; safe to drop unused.
#[derive(Debug, Clone)]
pub struct ShutdownHandle(broadcast::Sender<()>);

impl ShutdownHandle {
    /// Ask the server loop to exit after its current tick.
    pub fn shutdown(&self) {
        let _ = self.0.send(());
    }
}

/// Everything the game loop hears about from the outside world.
enum ConnEvent {
    /// Listener accepted a new socket.
    Accepted { stream: TcpStream, addr: SocketAddr },
    /// A connection's reader pulled bytes off the wire.
    Data { id: PlayerId, bytes: Bytes },
    /// A connection's reader saw EOF or a socket error.
    Closed { id: PlayerId },
}

/// One live client connection, owned by the game loop.
struct Connection {
    addr: SocketAddr,
    framer: InputFramer,
    /// Outbound frames; the writer task drains this onto the socket.
    frames: mpsc::UnboundedSender<Bytes>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

/// The game server.
pub struct GameServer {
    config: ServerConfig,
    listener: TcpListener,
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Bind the listening socket.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            listener,
            shutdown_tx,
        })
    }

    /// Address the server is actually listening on (resolves port 0 binds).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(self.shutdown_tx.clone())
    }

    /// Run the server until shutdown.
    pub async fn run(self) -> Result<(), ServerError> {
        let Self {
            config,
            listener,
            shutdown_tx,
        } = self;

        info!(
            addr = %listener.local_addr()?,
            tick_rate = config.tick_rate,
            "server listening"
        );

        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        // Accept task: hands fresh sockets to the game loop and nothing else.
        let accept_tx = event_tx.clone();
        let accept_task = tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        if accept_tx.send(ConnEvent::Accepted { stream, addr }).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                }
            }
        });

        let mut game = GameLoop {
            state: GameState::new(),
            connections: BTreeMap::new(),
            event_tx,
        };

        let mut shutdown_rx = shutdown_tx.subscribe();
        let tick_duration = Duration::from_micros(1_000_000 / config.tick_rate as u64);
        let mut last_tick = Instant::now();
        let mut deadline = last_tick + tick_duration;

        'server: loop {
            // Drain connection events until the tick deadline. A deadline
            // already in the past falls through immediately, so a busy wire
            // can delay a tick but never skip one.
            loop {
                tokio::select! {
                    event = event_rx.recv() => match event {
                        Some(event) => game.handle_event(event),
                        None => break 'server,
                    },
                    _ = time::sleep_until(deadline) => break,
                    _ = shutdown_rx.recv() => {
                        info!("shutdown requested");
                        break 'server;
                    }
                }
            }

            let now = Instant::now();
            let cooldown_before = game.state.cooldown;
            tick(&mut game.state, now.duration_since(last_tick).as_secs_f32());
            last_tick = now;
            deadline += tick_duration;

            if cooldown_before <= 0.0 && game.state.cooldown > 0.0 {
                info!(
                    red = game.state.red_zone_health,
                    blue = game.state.blue_zone_health,
                    "round over, cooldown started"
                );
            }

            game.broadcast();
        }

        accept_task.abort();
        for conn in game.connections.into_values() {
            conn.reader.abort();
            conn.writer.abort();
        }

        Ok(())
    }
}

/// The simulation loop's working state: the authoritative game plus every
/// live connection, keyed by player so broadcast order matches roster order.
struct GameLoop {
    state: GameState,
    connections: BTreeMap<PlayerId, Connection>,
    event_tx: mpsc::UnboundedSender<ConnEvent>,
}

impl GameLoop {
    fn handle_event(&mut self, event: ConnEvent) {
        match event {
            ConnEvent::Accepted { stream, addr } => self.accept(stream, addr),
            ConnEvent::Data { id, bytes } => self.receive(id, &bytes),
            ConnEvent::Closed { id } => {
                if self.connections.contains_key(&id) {
                    info!(%id, "client disconnected");
                    self.drop_connection(id);
                }
            }
        }
    }

    /// Register a socket as a player and spawn its I/O tasks.
    fn accept(&mut self, stream: TcpStream, addr: SocketAddr) {
        // Snapshots are tiny and latency matters more than throughput
        if let Err(e) = stream.set_nodelay(true) {
            debug!(%addr, error = %e, "set_nodelay failed");
        }

        let id = self.state.connect();
        let team = self.state.players[&id].team;
        info!(%id, %addr, ?team, "client connected");

        let (read_half, mut write_half) = stream.into_split();

        let event_tx = self.event_tx.clone();
        let reader = tokio::spawn(async move {
            let mut read_half = read_half;
            let mut buf = [0u8; 256];
            loop {
                match read_half.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        let bytes = Bytes::copy_from_slice(&buf[..n]);
                        if event_tx.send(ConnEvent::Data { id, bytes }).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!(%id, error = %e, "read failed");
                        break;
                    }
                }
            }
            let _ = event_tx.send(ConnEvent::Closed { id });
        });

        let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<Bytes>();
        let writer = tokio::spawn(async move {
            while let Some(frame) = frame_rx.recv().await {
                if write_half.write_all(&frame).await.is_err() {
                    break;
                }
            }
        });

        self.connections.insert(
            id,
            Connection {
                addr,
                framer: InputFramer::new(),
                frames: frame_tx,
                reader,
                writer,
            },
        );
    }

    /// Feed received bytes through the connection's framer and apply every
    /// complete input message. A malformed frame kills the connection.
    fn receive(&mut self, id: PlayerId, bytes: &[u8]) {
        // Bytes racing a disconnect land here with no connection; drop them
        let Some(conn) = self.connections.get_mut(&id) else {
            return;
        };

        conn.framer.extend(bytes);
        let violation = loop {
            match conn.framer.next_input() {
                Ok(Some(input)) => self.state.apply_input(id, input),
                Ok(None) => break None,
                Err(e) => break Some(e),
            }
        };

        if let Some(e) = violation {
            warn!(%id, addr = %conn.addr, error = %e, "protocol violation, disconnecting");
            self.drop_connection(id);
        }
    }

    /// Encode this tick's snapshot once and send each recipient its frame.
    fn broadcast(&mut self) {
        let encoder = SnapshotEncoder::from_state(&self.state);

        let mut dead = Vec::new();
        for (&id, conn) in &self.connections {
            let just_stunned = self
                .state
                .players
                .get(&id)
                .is_some_and(|p| p.just_stunned);
            if conn.frames.send(encoder.frame_for(just_stunned)).is_err() {
                dead.push(id);
            }
        }

        for id in dead {
            debug!(%id, "writer gone, dropping connection");
            self.drop_connection(id);
        }
    }

    /// Remove a connection and its player, stopping both I/O tasks.
    fn drop_connection(&mut self, id: PlayerId) {
        if let Some(conn) = self.connections.remove(&id) {
            conn.reader.abort();
            conn.writer.abort();
            self.state.disconnect(id);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
