//! Server network layer handling UDP communications and game loop coordination

use crate::actions::{ActionResolver, Event};
use crate::client_manager::ClientManager;
use crate::game::GameState;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, FLY_COUNT, WORLD_HEIGHT, WORLD_WIDTH};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

/// Connections silent for this long are treated as disconnected.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
/// Cap on per-tick delta time so a stall cannot fling the simulation.
const MAX_DELTA_TIME: f32 = 1.0 / 20.0;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientTimeout {
        client_id: u32,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from game loop to network tasks
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
        exclude: Option<u32>,
    },
}

/// Main server coordinating networking and the authoritative simulation.
///
/// Game state and the resolver live on this task only; receiver, sender,
/// and timeout sweeping run as separate tasks connected by channels.
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    state: GameState,
    resolver: ActionResolver,
    tick_duration: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        max_clients: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", addr);

        // World generation happens here, before any connection is accepted
        let state = GameState::new(WORLD_WIDTH, WORLD_HEIGHT, FLY_COUNT);
        info!(
            "World ready: {} lily pads, {} flies",
            state.pads.len(),
            state.flies.len()
        );

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
            state,
            resolver: ActionResolver::new(),
            tick_duration,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 4096];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet, exclude } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if Some(client_id) == exclude {
                                continue;
                            }

                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that sweeps out silent clients
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts(CLIENT_TIMEOUT)
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: Packet, exclude: Option<u32>) {
        if let Err(e) = self
            .game_tx
            .send(GameMessage::BroadcastPacket { packet, exclude })
        {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Delivers the outbound events a resolver call produced.
    async fn dispatch(&mut self, events: Vec<Event>) {
        for event in events {
            match event {
                Event::Unicast { client_id, packet } => {
                    let addr = {
                        let clients = self.clients.read().await;
                        clients.addr_of(client_id)
                    };
                    if let Some(addr) = addr {
                        self.send_packet(packet, addr);
                    }
                }
                Event::Broadcast { packet } => {
                    self.broadcast_packet(packet, None);
                }
                Event::BroadcastExcept { client_id, packet } => {
                    self.broadcast_packet(packet, Some(client_id));
                }
                Event::Kick { client_id, reason } => {
                    let addr = {
                        let clients = self.clients.read().await;
                        clients.addr_of(client_id)
                    };
                    if let Some(addr) = addr {
                        self.send_packet(Packet::Kicked { reason }, addr);
                    }
                    {
                        let mut clients = self.clients.write().await;
                        clients.remove_client(client_id);
                    }
                    // Drop whatever the connection had reserved or scheduled.
                    // Cleanup only ever produces broadcasts.
                    for follow_up in self.resolver.handle_disconnect(&mut self.state, client_id) {
                        if let Event::Broadcast { packet } = follow_up {
                            self.broadcast_packet(packet, None);
                        }
                    }
                }
            }
        }
    }

    /// Processes a single inbound packet against the authoritative state.
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        if let Packet::Connect { client_version } = packet {
            info!(
                "Client connecting from {} (version: {})",
                addr, client_version
            );

            // A reconnect from the same address replaces the old session
            let existing_client_id = {
                let clients = self.clients.read().await;
                clients.find_client_by_addr(addr)
            };
            if let Some(existing_id) = existing_client_id {
                info!("Removing existing client {} from {}", existing_id, addr);
                {
                    let mut clients = self.clients.write().await;
                    clients.remove_client(existing_id);
                }
                let events = self.resolver.handle_disconnect(&mut self.state, existing_id);
                self.dispatch(events).await;
            }

            let client_id = {
                let mut clients = self.clients.write().await;
                clients.add_client(addr)
            };

            match client_id {
                Some(client_id) => self.send_packet(Packet::Connected { client_id }, addr),
                None => self.send_packet(
                    Packet::Kicked {
                        reason: "Server full".to_string(),
                    },
                    addr,
                ),
            }
            return;
        }

        // Everything else requires an established session
        let client_id = {
            let clients = self.clients.read().await;
            clients.find_client_by_addr(addr)
        };
        let Some(client_id) = client_id else {
            warn!("Packet from unknown address {}", addr);
            return;
        };
        {
            let mut clients = self.clients.write().await;
            clients.touch(client_id);
        }

        let events = match packet {
            Packet::CheckName { name } => {
                self.resolver.handle_check_name(&self.state, client_id, &name)
            }
            Packet::NewPlayer { name } => {
                self.resolver
                    .handle_new_player(&mut self.state, client_id, &name)
            }
            Packet::Respawn => self.resolver.handle_respawn(&mut self.state, client_id),
            Packet::MoveToLilyPad { pad_id } => {
                self.resolver
                    .handle_move(&mut self.state, client_id, pad_id, Instant::now())
            }
            Packet::TongueAttack { target_id } => {
                self.resolver
                    .handle_attack(&mut self.state, client_id, target_id, Instant::now())
            }
            Packet::CatchFly { fly_id } => {
                self.resolver.handle_catch(&mut self.state, client_id, fly_id)
            }
            Packet::Ping => Vec::new(),
            Packet::Disconnect => {
                let events = self.resolver.handle_disconnect(&mut self.state, client_id);
                let mut clients = self.clients.write().await;
                clients.remove_client(client_id);
                events
            }
            other => {
                warn!(
                    "Unexpected packet {:?} from client {} at {}",
                    other, client_id, addr
                );
                Vec::new()
            }
        };

        self.dispatch(events).await;
    }

    /// One fixed-rate simulation step: fly motion, swim recovery, broadcast.
    async fn run_tick(&mut self, dt: f32) {
        let dt = dt.min(MAX_DELTA_TIME);

        self.state.flies.tick(dt);
        self.state.tick += 1;

        let recovered = self.resolver.expire_swimmers(&mut self.state, Instant::now());
        self.dispatch(recovered).await;

        let client_count = {
            let clients = self.clients.read().await;
            clients.len()
        };
        if client_count == 0 {
            return;
        }

        self.broadcast_packet(
            Packet::FliesUpdated {
                flies: self.state.flies.poses(),
            },
            None,
        );

        if self.state.tick % 60 == 0 {
            debug!(
                "Tick {}: {} clients, {} players, {} flies",
                self.state.tick,
                client_count,
                self.state.registry.len(),
                self.state.flies.len()
            );
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut tick_interval = interval(self.tick_duration);
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tokio::select! {
                // Handle network events
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            info!("Client {} timed out", client_id);
                            let events = self.resolver.handle_disconnect(&mut self.state, client_id);
                            self.dispatch(events).await;
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                // Fixed-rate simulation tick
                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    self.run_tick(dt).await;
                },
            }
        }

        Ok(())
    }
}
