// src/notify.rs
use log::{info, warn};
use tokio::sync::broadcast;

use crate::domain::BidEvent;

/// Outbound event delivery, fire-and-forget. `emit` must not block and must
/// not fail the commit it follows; delivery problems are logged and dropped.
pub trait Notifier: Send + Sync {
    fn emit(&self, event: BidEvent);
}

/// Writes accepted-bid events to the application log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn emit(&self, event: BidEvent) {
        let BidEvent::BidAccepted { listing_id, dealer_id, amount, previous_bidder, .. } = &event;
        match previous_bidder {
            Some(previous) => info!(
                "bid accepted: listing {} now at {} by dealer {} (outbid {})",
                listing_id, amount, dealer_id, previous
            ),
            None => info!(
                "bid accepted: listing {} opened at {} by dealer {}",
                listing_id, amount, dealer_id
            ),
        }
    }
}

/// Fans events out to in-process subscribers over a broadcast channel.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<BidEvent>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        BroadcastNotifier { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BidEvent> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn emit(&self, event: BidEvent) {
        if self.tx.send(event).is_err() {
            warn!("no subscribers for bid event, dropping");
        }
    }
}
