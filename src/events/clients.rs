//! Client Registry
//!
//! Tracks the open application instances the proxy can message, focus,
//! open and claim.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::{ProxyError, Result};

/// Messages queued per client before the client drains them.
const MAX_PENDING_MESSAGES: usize = 64;

// == Client Message ==
/// A message posted from the proxy to an application instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Connectivity came back; `timestamp` is RFC 3339
    #[serde(rename = "BACK_ONLINE")]
    BackOnline { timestamp: String },
}

// == Client Info ==
/// Public view of one open application instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    pub id: u64,
    pub url: String,
    pub focused: bool,
    /// Worker generation controlling this client, if claimed
    pub controlled_by: Option<u64>,
}

#[derive(Debug)]
struct ClientSlot {
    info: ClientInfo,
    outbox: VecDeque<ClientMessage>,
}

// == Client Registry ==
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<BTreeMap<u64, ClientSlot>>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an already-open instance showing `url`.
    pub async fn register(&self, url: impl Into<String>) -> ClientInfo {
        self.insert(url.into(), false).await
    }

    async fn insert(&self, url: String, focused: bool) -> ClientInfo {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let info = ClientInfo {
            id,
            url,
            focused,
            controlled_by: None,
        };
        let mut clients = self.clients.write().await;
        if focused {
            clients.values_mut().for_each(|c| c.info.focused = false);
        }
        clients.insert(
            id,
            ClientSlot {
                info: info.clone(),
                outbox: VecDeque::new(),
            },
        );
        info
    }

    pub async fn unregister(&self, id: u64) -> bool {
        self.clients.write().await.remove(&id).is_some()
    }

    /// Every open instance, in registration order.
    pub async fn match_all(&self) -> Vec<ClientInfo> {
        self.clients
            .read()
            .await
            .values()
            .map(|c| c.info.clone())
            .collect()
    }

    /// Queues a message for a client; the oldest message is dropped when
    /// the queue is full.
    pub async fn post_message(&self, id: u64, message: ClientMessage) -> Result<()> {
        let mut clients = self.clients.write().await;
        let slot = clients
            .get_mut(&id)
            .ok_or_else(|| ProxyError::NotFound(format!("client {}", id)))?;
        if slot.outbox.len() >= MAX_PENDING_MESSAGES {
            slot.outbox.pop_front();
        }
        slot.outbox.push_back(message);
        Ok(())
    }

    /// Drains and returns the messages queued for a client.
    pub async fn take_messages(&self, id: u64) -> Result<Vec<ClientMessage>> {
        let mut clients = self.clients.write().await;
        let slot = clients
            .get_mut(&id)
            .ok_or_else(|| ProxyError::NotFound(format!("client {}", id)))?;
        Ok(slot.outbox.drain(..).collect())
    }

    /// Gives focus to one client and takes it from every other.
    pub async fn focus(&self, id: u64) -> Result<ClientInfo> {
        let mut clients = self.clients.write().await;
        if !clients.contains_key(&id) {
            return Err(ProxyError::NotFound(format!("client {}", id)));
        }
        for (cid, slot) in clients.iter_mut() {
            slot.info.focused = *cid == id;
        }
        Ok(clients[&id].info.clone())
    }

    /// Opens a new focused instance at `url`.
    pub async fn open_window(&self, url: impl Into<String>) -> ClientInfo {
        self.insert(url.into(), true).await
    }

    /// First client whose url equals `url`.
    pub async fn find_by_url(&self, url: &str) -> Option<ClientInfo> {
        self.clients
            .read()
            .await
            .values()
            .find(|c| c.info.url == url)
            .map(|c| c.info.clone())
    }

    /// Marks every client as controlled by `generation`; returns the count.
    pub async fn claim(&self, generation: u64) -> usize {
        let mut clients = self.clients.write().await;
        clients
            .values_mut()
            .for_each(|c| c.info.controlled_by = Some(generation));
        clients.len()
    }
}
