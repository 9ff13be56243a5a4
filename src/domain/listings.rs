// src/domain/listings.rs
use serde::{Deserialize, Serialize};
use crate::money::{Amount, Currency};
use super::core::{DealerId, ListingId, SellerRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus {
    Active,
    Sold,
    Withdrawn,
}

impl ListingStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ListingStatus::Active)
    }
}

/// Display metadata owned by the listing CRUD side. The bid engine never
/// reads these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarSummary {
    pub make: String,
    pub model: String,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub seller: SellerRef,
    pub car: CarSummary,
    pub currency: Currency,
    pub status: ListingStatus,
    #[serde(rename = "currentHighestBid")]
    pub current_highest_bid: Option<Amount>,
    #[serde(rename = "currentHighestBidder")]
    pub current_highest_bidder: Option<DealerId>,
    pub version: u64,
}

impl Listing {
    /// A fresh listing is biddable immediately, with no bid on record.
    pub fn new(id: ListingId, seller: SellerRef, car: CarSummary, currency: Currency) -> Self {
        Listing {
            id,
            seller,
            car,
            currency,
            status: ListingStatus::Active,
            current_highest_bid: None,
            current_highest_bidder: None,
            version: 0,
        }
    }

    pub fn snapshot(&self) -> ListingSnapshot {
        ListingSnapshot {
            status: self.status,
            currency: self.currency,
            current_highest_bid: self.current_highest_bid,
            current_highest_bidder: self.current_highest_bidder,
            version: self.version,
        }
    }
}

/// The bid-relevant projection of a listing, read under the version that a
/// commit must later match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingSnapshot {
    pub status: ListingStatus,
    pub currency: Currency,
    pub current_highest_bid: Option<Amount>,
    pub current_highest_bidder: Option<DealerId>,
    pub version: u64,
}
