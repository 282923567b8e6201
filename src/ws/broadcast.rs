//! The broadcast gateway: turns the hub's outbound instructions into
//! WebSocket text frames and fans them out.
//!
//! Delivery is fire-and-forget. A failed send means the receiving actor is
//! already shutting down; the hub will observe the disconnect on its own.

use axum::extract::ws::Message;

use crate::hub::events::{Outbound, Recipients};

use super::SenderMap;

/// Deliver one outbound instruction to its recipients.
pub fn deliver(senders: &SenderMap, outbound: Outbound) {
    let text = match serde_json::to_string(&outbound.frame) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode server frame");
            return;
        }
    };
    let msg = Message::Text(text.into());

    match outbound.to {
        Recipients::Connection(id) => {
            if let Some(sender) = senders.get(&id) {
                let _ = sender.send(msg);
            }
        }
        Recipients::Room { members, .. } => {
            for id in &members {
                if let Some(sender) = senders.get(id) {
                    let _ = sender.send(msg.clone());
                }
            }
        }
        Recipients::All => {
            for entry in senders.iter() {
                let _ = entry.value().send(msg.clone());
            }
        }
    }
}

/// Deliver a whole transition's emissions in order.
pub fn deliver_all(senders: &SenderMap, batch: Vec<Outbound>) {
    for outbound in batch {
        deliver(senders, outbound);
    }
}
