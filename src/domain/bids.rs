// src/domain/bids.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::money::Amount;
use super::core::{BidId, DealerId, ListingId};

/// How a submitted bid was judged. Rejections are business outcomes, not
/// errors; every one of them is recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidOutcome {
    Accepted,
    RejectedStale,
    RejectedInvalidAmount,
    RejectedListingClosed,
    RejectedDealerInactive,
}

impl BidOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, BidOutcome::Accepted)
    }
}

/// One bid attempt as recorded in the ledger. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    #[serde(rename = "listingId")]
    pub listing_id: ListingId,
    #[serde(rename = "dealerId")]
    pub dealer_id: DealerId,
    pub amount: Amount,
    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,
    pub outcome: BidOutcome,
}

/// What the engine hands back for every judged bid: the outcome together
/// with the authoritative highest bid after evaluation, so a losing dealer
/// can re-bid without a second read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidReceipt {
    #[serde(rename = "bidId")]
    pub bid_id: BidId,
    pub outcome: BidOutcome,
    #[serde(rename = "currentHighestBid")]
    pub current_highest_bid: Option<Amount>,
    #[serde(rename = "currentHighestBidder")]
    pub current_highest_bidder: Option<DealerId>,
}
