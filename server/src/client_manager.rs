//! Connected-socket bookkeeping for the session layer
//!
//! Tracks which addresses hold a session, hands out connection ids, and
//! sweeps out clients that have gone silent. Game-level player state
//! lives in the registry; this is purely the transport roster.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A connected socket. The id doubles as the player id once the client
/// joins the game.
#[derive(Debug)]
pub struct Client {
    pub id: u32,
    pub addr: SocketAddr,
    /// Last time any packet arrived from this address.
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Roster of live connections with a capacity limit.
pub struct ClientManager {
    clients: HashMap<u32, Client>,
    next_client_id: u32,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Registers a connection, or None when the server is full.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Drops a connection. Returns true if it existed.
    pub fn remove_client(&mut self, client_id: u32) -> bool {
        if let Some(client) = self.clients.remove(&client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    pub fn addr_of(&self, client_id: u32) -> Option<SocketAddr> {
        self.clients.get(&client_id).map(|client| client.addr)
    }

    /// Marks the connection alive; any inbound packet counts.
    pub fn touch(&mut self, client_id: u32) {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.last_seen = Instant::now();
        }
    }

    /// Removes every connection silent for longer than `timeout` and
    /// returns their ids for game-state cleanup.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<u32> {
        let timed_out: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(*client_id);
        }

        timed_out
    }

    /// Every (id, address) pair, for broadcast fan-out.
    pub fn get_client_addrs(&self) -> Vec<(u32, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_add_client_assigns_sequential_ids() {
        let mut manager = ClientManager::new(4);

        assert_eq!(manager.add_client(test_addr()), Some(1));
        assert_eq!(manager.add_client(test_addr2()), Some(2));
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_capacity_limit() {
        let mut manager = ClientManager::new(1);

        assert!(manager.add_client(test_addr()).is_some());
        assert!(manager.add_client(test_addr2()).is_none());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_remove_client() {
        let mut manager = ClientManager::new(2);
        let id = manager.add_client(test_addr()).unwrap();

        assert!(manager.remove_client(id));
        assert!(!manager.remove_client(id));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_find_client_by_addr() {
        let mut manager = ClientManager::new(2);
        let id = manager.add_client(test_addr()).unwrap();

        assert_eq!(manager.find_client_by_addr(test_addr()), Some(id));
        assert_eq!(manager.find_client_by_addr(test_addr2()), None);
        assert_eq!(manager.addr_of(id), Some(test_addr()));
    }

    #[test]
    fn test_timeout_sweep() {
        let mut manager = ClientManager::new(2);
        let stale = manager.add_client(test_addr()).unwrap();
        let fresh = manager.add_client(test_addr2()).unwrap();

        if let Some(client) = manager.clients.get_mut(&stale) {
            client.last_seen = Instant::now() - Duration::from_secs(30);
        }

        let removed = manager.check_timeouts(Duration::from_secs(10));
        assert_eq!(removed, vec![stale]);
        assert_eq!(manager.len(), 1);
        assert!(manager.addr_of(fresh).is_some());
    }

    #[test]
    fn test_touch_refreshes_liveness() {
        let mut manager = ClientManager::new(2);
        let id = manager.add_client(test_addr()).unwrap();

        if let Some(client) = manager.clients.get_mut(&id) {
            client.last_seen = Instant::now() - Duration::from_secs(30);
        }
        manager.touch(id);

        let removed = manager.check_timeouts(Duration::from_secs(10));
        assert!(removed.is_empty());
    }
}
