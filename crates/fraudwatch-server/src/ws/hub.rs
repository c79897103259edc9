//! WebSocket fan-out hub
//!
//! Owns the registry of live connections and room memberships. Each client
//! gets an unbounded outbound queue so a slow consumer never blocks the
//! write path; a failed send deregisters the client. The heartbeat task
//! pings every client on a fixed interval and terminates any client that
//! did not answer the previous ping, removing it from all rooms.

use super::protocol::{broadcast_frame, now, ClientFrame, ServerFrame};
use axum::extract::ws::{Message, WebSocket};
use fraudwatch_core::DomainEvent;
use futures::{SinkExt, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

struct ClientHandle {
    sender: mpsc::UnboundedSender<Message>,
    /// Subscribed channels; empty means "receive everything"
    subscriptions: HashSet<String>,
    /// Cleared before each ping, set again by the pong
    alive: bool,
}

/// Connection registry and broadcaster
pub struct StreamHub {
    clients: RwLock<HashMap<String, ClientHandle>>,
    rooms: RwLock<HashMap<String, HashSet<String>>>,
    heartbeat: Duration,
}

impl StreamHub {
    pub fn new(heartbeat: Duration) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
            heartbeat,
        }
    }

    /// Number of connected clients
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Number of active rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Drive one upgraded socket until it disconnects
    pub async fn handle_socket(self: Arc<Self>, socket: WebSocket) {
        let (client_id, mut outbound) = self.register().await;
        info!(client_id = %client_id, "websocket client connected");

        let (mut sink, mut stream) = socket.split();
        let forward = tokio::spawn(async move {
            while let Some(message) = outbound.recv().await {
                if sink.send(message).await.is_err() {
                    break;
                }
            }
        });

        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => self.handle_frame(&client_id, &text).await,
                Message::Pong(_) => self.mark_alive(&client_id).await,
                Message::Close(_) => break,
                _ => {}
            }
        }

        forward.abort();
        self.disconnect(&client_id).await;
        info!(client_id = %client_id, "websocket client disconnected");
    }

    /// Broadcast a domain event to subscribed clients
    ///
    /// Fire-and-forget: dead clients are pruned, nothing is awaited on the
    /// socket itself.
    pub async fn broadcast(&self, event: &DomainEvent) {
        let frame = broadcast_frame(event);
        let channel = event.channel();
        let mut dead = Vec::new();

        {
            let clients = self.clients.read().await;
            for (id, client) in clients.iter() {
                if !client.subscriptions.is_empty() && !client.subscriptions.contains(channel) {
                    continue;
                }
                if client
                    .sender
                    .send(Message::Text(frame.clone()))
                    .is_err()
                {
                    dead.push(id.clone());
                }
            }
        }

        for id in dead {
            warn!(client_id = %id, "dropping dead websocket client");
            self.disconnect(&id).await;
        }
    }

    /// Send a raw frame to every member of a room
    pub async fn broadcast_to_room(&self, room: &str, frame: &str) -> usize {
        let members: Vec<String> = {
            let rooms = self.rooms.read().await;
            match rooms.get(room) {
                Some(members) => members.iter().cloned().collect(),
                None => return 0,
            }
        };

        let clients = self.clients.read().await;
        let mut sent = 0;
        for id in members {
            if let Some(client) = clients.get(&id) {
                if client
                    .sender
                    .send(Message::Text(frame.to_string()))
                    .is_ok()
                {
                    sent += 1;
                }
            }
        }
        sent
    }

    /// Spawn the heartbeat task for this hub
    pub fn spawn_heartbeat(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let hub = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(hub.heartbeat);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                hub.heartbeat_sweep().await;
            }
        })
    }

    /// One heartbeat pass: terminate unresponsive clients, ping the rest
    pub async fn heartbeat_sweep(&self) {
        let mut stale = Vec::new();
        {
            let mut clients = self.clients.write().await;
            for (id, client) in clients.iter_mut() {
                if !client.alive {
                    stale.push(id.clone());
                    continue;
                }
                client.alive = false;
                if client.sender.send(Message::Ping(Vec::new())).is_err() {
                    stale.push(id.clone());
                }
            }
        }

        for id in stale {
            debug!(client_id = %id, "terminating unresponsive websocket client");
            self.disconnect(&id).await;
        }
    }

    async fn register(&self) -> (String, mpsc::UnboundedReceiver<Message>) {
        let client_id = format!("client_{}", Uuid::new_v4().simple());
        let (sender, receiver) = mpsc::unbounded_channel();

        let welcome = ServerFrame::Connection {
            status: "connected",
            client_id: client_id.clone(),
            timestamp: now(),
        };
        let _ = sender.send(Message::Text(welcome.to_json()));

        self.clients.write().await.insert(
            client_id.clone(),
            ClientHandle {
                sender,
                subscriptions: HashSet::new(),
                alive: true,
            },
        );

        (client_id, receiver)
    }

    async fn disconnect(&self, client_id: &str) {
        self.clients.write().await.remove(client_id);

        let mut rooms = self.rooms.write().await;
        rooms.retain(|_, members| {
            members.remove(client_id);
            !members.is_empty()
        });
    }

    async fn handle_frame(&self, client_id: &str, text: &str) {
        let frame = match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => frame,
            Err(_) => {
                self.send_to_client(client_id, ServerFrame::error("Invalid message format"))
                    .await;
                return;
            }
        };

        match frame {
            ClientFrame::Ping => {
                self.mark_alive(client_id).await;
                self.send_to_client(client_id, ServerFrame::Pong { timestamp: now() })
                    .await;
            }
            ClientFrame::Subscribe { channels } => {
                {
                    let mut clients = self.clients.write().await;
                    if let Some(client) = clients.get_mut(client_id) {
                        client.subscriptions.extend(channels.iter().cloned());
                    }
                }
                debug!(client_id = %client_id, ?channels, "client subscribed");
                self.send_to_client(
                    client_id,
                    ServerFrame::Subscribed {
                        channels,
                        timestamp: now(),
                    },
                )
                .await;
            }
            ClientFrame::Unsubscribe { channels } => {
                {
                    let mut clients = self.clients.write().await;
                    if let Some(client) = clients.get_mut(client_id) {
                        for channel in &channels {
                            client.subscriptions.remove(channel);
                        }
                    }
                }
                self.send_to_client(
                    client_id,
                    ServerFrame::Unsubscribed {
                        channels,
                        timestamp: now(),
                    },
                )
                .await;
            }
            ClientFrame::JoinRoom { room } => {
                self.rooms
                    .write()
                    .await
                    .entry(room.clone())
                    .or_default()
                    .insert(client_id.to_string());
                debug!(client_id = %client_id, room = %room, "client joined room");
                self.send_to_client(
                    client_id,
                    ServerFrame::RoomJoined {
                        room,
                        timestamp: now(),
                    },
                )
                .await;
            }
            ClientFrame::LeaveRoom { room } => {
                {
                    let mut rooms = self.rooms.write().await;
                    if let Some(members) = rooms.get_mut(&room) {
                        members.remove(client_id);
                        if members.is_empty() {
                            rooms.remove(&room);
                        }
                    }
                }
                self.send_to_client(
                    client_id,
                    ServerFrame::RoomLeft {
                        room,
                        timestamp: now(),
                    },
                )
                .await;
            }
        }
    }

    async fn mark_alive(&self, client_id: &str) {
        if let Some(client) = self.clients.write().await.get_mut(client_id) {
            client.alive = true;
        }
    }

    async fn send_to_client(&self, client_id: &str, frame: ServerFrame) {
        let clients = self.clients.read().await;
        if let Some(client) = clients.get(client_id) {
            let _ = client.sender.send(Message::Text(frame.to_json()));
        }
    }
}
