// src/persistence/mod.rs
pub mod json_file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Bid, BidId, DealerId, Listing, ListingId, ListingSnapshot, ListingStatus};
use crate::money::Amount;

pub use self::memory::{InMemoryBidLedger, InMemoryListingStore};

/// Infrastructure failure of a backing store. Business rejections never take
/// this shape; callers use it to tell "your bid lost" from "the system could
/// not process your bid".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result of a conditional bid commit against a listing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Another writer changed the listing since the snapshot was read; the
    /// caller must re-read and re-evaluate.
    VersionConflict,
}

/// Durable record of each listing's bid-relevant state. `commit_bid` is the
/// only mutation path for the bid fields; the plain CRUD operations belong to
/// the listing subsystem and never touch them.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn get_for_bid(&self, listing_id: ListingId) -> Result<Option<ListingSnapshot>, StoreError>;

    /// Conditional write: applies the new highest bid only if the row version
    /// still equals `expected_version`, bumping the version on success.
    async fn commit_bid(
        &self,
        listing_id: ListingId,
        expected_version: u64,
        new_highest_bid: Amount,
        new_highest_bidder: DealerId,
    ) -> Result<CommitOutcome, StoreError>;

    async fn insert(&self, listing: Listing) -> Result<(), StoreError>;

    async fn fetch(&self, listing_id: ListingId) -> Result<Option<Listing>, StoreError>;

    async fn set_status(&self, listing_id: ListingId, status: ListingStatus) -> Result<bool, StoreError>;

    async fn list(&self) -> Result<Vec<Listing>, StoreError>;
}

/// Append-only history of every bid attempt and its outcome. Records
/// outcomes, never judges them.
#[async_trait]
pub trait BidLedger: Send + Sync {
    async fn record(&self, bid: Bid) -> Result<BidId, StoreError>;

    async fn bids_for(&self, listing_id: ListingId) -> Result<Vec<Bid>, StoreError>;

    /// The accepted bid with the greatest amount, for audit and for
    /// reconstructing a listing's highest bid if the cached field is suspect.
    async fn highest_accepted(&self, listing_id: ListingId) -> Result<Option<Bid>, StoreError>;
}
