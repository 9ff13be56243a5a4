// src/domain/events.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::money::Amount;
use super::core::{DealerId, ListingId};

/// Events the engine hands to the notifier after a commit. Carries the
/// previous bidder so the notifier can tell them they were outbid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum BidEvent {
    #[serde(rename = "BidAccepted")]
    BidAccepted {
        #[serde(rename = "at")]
        at: DateTime<Utc>,
        #[serde(rename = "listingId")]
        listing_id: ListingId,
        #[serde(rename = "dealerId")]
        dealer_id: DealerId,
        amount: Amount,
        #[serde(rename = "previousBidder")]
        previous_bidder: Option<DealerId>,
    },
}
