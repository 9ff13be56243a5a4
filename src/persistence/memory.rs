// src/persistence/memory.rs
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::{Bid, BidId, DealerId, Listing, ListingId, ListingSnapshot, ListingStatus};
use crate::money::Amount;
use super::{BidLedger, CommitOutcome, ListingStore, StoreError};

/// Listing rows behind a single RwLock. The conditional write in
/// `commit_bid` carries the per-listing serialization; readers of other
/// listings are never blocked by a commit beyond the map lock itself.
#[derive(Debug, Default)]
pub struct InMemoryListingStore {
    listings: RwLock<HashMap<ListingId, Listing>>,
}

impl InMemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn get_for_bid(&self, listing_id: ListingId) -> Result<Option<ListingSnapshot>, StoreError> {
        let listings = self.listings.read().await;
        Ok(listings.get(&listing_id).map(Listing::snapshot))
    }

    async fn commit_bid(
        &self,
        listing_id: ListingId,
        expected_version: u64,
        new_highest_bid: Amount,
        new_highest_bidder: DealerId,
    ) -> Result<CommitOutcome, StoreError> {
        let mut listings = self.listings.write().await;
        let listing = match listings.get_mut(&listing_id) {
            Some(listing) => listing,
            // Row vanished since the read; let the engine re-read and see why.
            None => return Ok(CommitOutcome::VersionConflict),
        };

        if listing.version != expected_version {
            return Ok(CommitOutcome::VersionConflict);
        }

        listing.current_highest_bid = Some(new_highest_bid);
        listing.current_highest_bidder = Some(new_highest_bidder);
        listing.version += 1;

        Ok(CommitOutcome::Committed)
    }

    async fn insert(&self, listing: Listing) -> Result<(), StoreError> {
        let mut listings = self.listings.write().await;
        listings.insert(listing.id, listing);
        Ok(())
    }

    async fn fetch(&self, listing_id: ListingId) -> Result<Option<Listing>, StoreError> {
        let listings = self.listings.read().await;
        Ok(listings.get(&listing_id).cloned())
    }

    async fn set_status(&self, listing_id: ListingId, status: ListingStatus) -> Result<bool, StoreError> {
        let mut listings = self.listings.write().await;
        match listings.get_mut(&listing_id) {
            Some(listing) => {
                listing.status = status;
                listing.version += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<Listing>, StoreError> {
        let listings = self.listings.read().await;
        Ok(listings.values().cloned().collect())
    }
}

/// Bid history per listing, append-only.
#[derive(Debug, Default)]
pub struct InMemoryBidLedger {
    bids: RwLock<HashMap<ListingId, Vec<Bid>>>,
}

impl InMemoryBidLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every bid across all listings, in no particular order. Used when
    /// archiving the ledger to a file.
    pub async fn all_bids(&self) -> Vec<Bid> {
        let bids = self.bids.read().await;
        bids.values().flatten().cloned().collect()
    }
}

#[async_trait]
impl BidLedger for InMemoryBidLedger {
    async fn record(&self, bid: Bid) -> Result<BidId, StoreError> {
        let mut bids = self.bids.write().await;
        let id = bid.id;
        bids.entry(bid.listing_id).or_default().push(bid);
        Ok(id)
    }

    async fn bids_for(&self, listing_id: ListingId) -> Result<Vec<Bid>, StoreError> {
        let bids = self.bids.read().await;
        Ok(bids.get(&listing_id).cloned().unwrap_or_default())
    }

    async fn highest_accepted(&self, listing_id: ListingId) -> Result<Option<Bid>, StoreError> {
        let bids = self.bids.read().await;
        Ok(bids
            .get(&listing_id)
            .and_then(|bids| {
                bids.iter()
                    .filter(|bid| bid.outcome.is_accepted())
                    .max_by_key(|bid| bid.amount)
                    .cloned()
            }))
    }
}
