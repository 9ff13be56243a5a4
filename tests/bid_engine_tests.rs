use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use car_bidding::domain::{BidEngine, BidEvent, BidOutcome, DealerId, EngineError, ListingId, ListingSnapshot, ListingStatus};
use car_bidding::money::Amount;
use car_bidding::persistence::{
    BidLedger, CommitOutcome, InMemoryBidLedger, ListingStore, StoreError,
};
use car_bidding::domain::{Bid, BidId, Listing};

#[path = "utils/mod.rs"]
mod utils;
use utils::*;

#[tokio::test]
async fn test_first_bid_is_accepted() {
    let h = harness().await;
    let listing_id = with_active_listing(&h).await;

    let receipt = h.engine.place_bid(listing_id, dealer_a(), 5000.0).await.unwrap();

    assert_eq!(receipt.outcome, BidOutcome::Accepted);
    assert_eq!(receipt.current_highest_bid, Some(gbp(500_000)));
    assert_eq!(receipt.current_highest_bidder, Some(dealer_a()));

    let listing = h.listings.fetch(listing_id).await.unwrap().unwrap();
    assert_eq!(listing.current_highest_bid, Some(gbp(500_000)));
    assert_eq!(listing.current_highest_bidder, Some(dealer_a()));
    assert_eq!(listing.version, 1);
}

// The end-to-end flow: first bid, equal bid, outbid, late low bid, sale.
#[tokio::test]
async fn test_bidding_scenario() {
    let h = harness().await;
    let listing_id = with_active_listing(&h).await;

    // Dealer A opens at 5000
    let receipt = h.engine.place_bid(listing_id, dealer_a(), 5000.0).await.unwrap();
    assert_eq!(receipt.outcome, BidOutcome::Accepted);

    // Dealer B matches 5000: equal is stale, not a tie to break
    let receipt = h.engine.place_bid(listing_id, dealer_b(), 5000.0).await.unwrap();
    assert_eq!(receipt.outcome, BidOutcome::RejectedStale);
    assert_eq!(receipt.current_highest_bid, Some(gbp(500_000)));
    assert_eq!(receipt.current_highest_bidder, Some(dealer_a()));

    // Dealer B raises to 5500
    let receipt = h.engine.place_bid(listing_id, dealer_b(), 5500.0).await.unwrap();
    assert_eq!(receipt.outcome, BidOutcome::Accepted);
    assert_eq!(receipt.current_highest_bid, Some(gbp(550_000)));

    // Dealer A comes back below the highest
    let receipt = h.engine.place_bid(listing_id, dealer_a(), 5200.0).await.unwrap();
    assert_eq!(receipt.outcome, BidOutcome::RejectedStale);
    assert_eq!(receipt.current_highest_bid, Some(gbp(550_000)));
    assert_eq!(receipt.current_highest_bidder, Some(dealer_b()));

    // The listing sells
    assert!(h.listings.set_status(listing_id, ListingStatus::Sold).await.unwrap());

    // Dealer C arrives too late
    let receipt = h.engine.place_bid(listing_id, dealer_c(), 6000.0).await.unwrap();
    assert_eq!(receipt.outcome, BidOutcome::RejectedListingClosed);

    // The sale left the winning bid untouched
    let listing = h.listings.fetch(listing_id).await.unwrap().unwrap();
    assert_eq!(listing.current_highest_bid, Some(gbp(550_000)));
    assert_eq!(listing.current_highest_bidder, Some(dealer_b()));

    // Every attempt is on the ledger, accepted amounts strictly increasing
    let bids = h.ledger.bids_for(listing_id).await.unwrap();
    assert_eq!(bids.len(), 5);
    let accepted: Vec<i64> = bids
        .iter()
        .filter(|b| b.outcome.is_accepted())
        .map(|b| b.amount.value())
        .collect();
    assert_eq!(accepted, vec![500_000, 550_000]);
}

#[tokio::test]
async fn test_invalid_amounts_are_rejected() {
    let h = harness().await;
    let listing_id = with_active_listing(&h).await;

    for bad in [0.0, -5000.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 5000.123] {
        let receipt = h.engine.place_bid(listing_id, dealer_a(), bad).await.unwrap();
        assert_eq!(receipt.outcome, BidOutcome::RejectedInvalidAmount, "amount {}", bad);
    }

    // Nothing was committed
    let listing = h.listings.fetch(listing_id).await.unwrap().unwrap();
    assert_eq!(listing.current_highest_bid, None);
    assert_eq!(listing.version, 0);

    // But every attempt is on the ledger
    let bids = h.ledger.bids_for(listing_id).await.unwrap();
    assert_eq!(bids.len(), 6);
    assert!(bids.iter().all(|b| b.outcome == BidOutcome::RejectedInvalidAmount));
}

#[tokio::test]
async fn test_two_fraction_digits_are_valid() {
    let h = harness().await;
    let listing_id = with_active_listing(&h).await;

    let receipt = h.engine.place_bid(listing_id, dealer_a(), 5000.55).await.unwrap();

    assert_eq!(receipt.outcome, BidOutcome::Accepted);
    assert_eq!(receipt.current_highest_bid, Some(gbp(500_055)));
}

#[tokio::test]
async fn test_unknown_dealer_is_rejected() {
    let h = harness().await;
    let listing_id = with_active_listing(&h).await;

    let receipt = h.engine.place_bid(listing_id, unknown_dealer(), 5000.0).await.unwrap();

    assert_eq!(receipt.outcome, BidOutcome::RejectedDealerInactive);
    let listing = h.listings.fetch(listing_id).await.unwrap().unwrap();
    assert_eq!(listing.version, 0);
}

#[tokio::test]
async fn test_suspended_dealer_is_rejected() {
    let h = harness().await;
    let listing_id = with_active_listing(&h).await;

    assert!(h.directory.set_active(dealer_a(), false).await);

    let receipt = h.engine.place_bid(listing_id, dealer_a(), 5000.0).await.unwrap();
    assert_eq!(receipt.outcome, BidOutcome::RejectedDealerInactive);

    // Reinstated dealers can bid again
    assert!(h.directory.set_active(dealer_a(), true).await);
    let receipt = h.engine.place_bid(listing_id, dealer_a(), 5000.0).await.unwrap();
    assert_eq!(receipt.outcome, BidOutcome::Accepted);
}

#[tokio::test]
async fn test_missing_listing_is_closed_to_bidders() {
    let h = harness().await;

    let receipt = h.engine.place_bid(sample_listing_id(), dealer_a(), 5000.0).await.unwrap();

    assert_eq!(receipt.outcome, BidOutcome::RejectedListingClosed);
    assert_eq!(receipt.current_highest_bid, None);
    assert_eq!(receipt.current_highest_bidder, None);
}

#[tokio::test]
async fn test_withdrawn_listing_rejects_bids() {
    let h = harness().await;
    let listing_id = with_active_listing(&h).await;
    h.listings.set_status(listing_id, ListingStatus::Withdrawn).await.unwrap();

    let receipt = h.engine.place_bid(listing_id, dealer_a(), 5000.0).await.unwrap();

    assert_eq!(receipt.outcome, BidOutcome::RejectedListingClosed);
    let listing = h.listings.fetch(listing_id).await.unwrap().unwrap();
    assert_eq!(listing.current_highest_bid, None);
}

// Replaying an accepted bid must be rejected as stale, never re-accepted.
#[tokio::test]
async fn test_replayed_bid_is_stale() {
    let h = harness().await;
    let listing_id = with_active_listing(&h).await;

    let first = h.engine.place_bid(listing_id, dealer_a(), 5000.0).await.unwrap();
    assert_eq!(first.outcome, BidOutcome::Accepted);

    let replay = h.engine.place_bid(listing_id, dealer_a(), 5000.0).await.unwrap();
    assert_eq!(replay.outcome, BidOutcome::RejectedStale);
    assert_ne!(replay.bid_id, first.bid_id);

    // Still one accepted bid on the books
    let bids = h.ledger.bids_for(listing_id).await.unwrap();
    assert_eq!(bids.iter().filter(|b| b.outcome.is_accepted()).count(), 1);
}

#[tokio::test]
async fn test_events_carry_previous_bidder() {
    let h = harness().await;
    let listing_id = with_active_listing(&h).await;

    h.engine.place_bid(listing_id, dealer_a(), 5000.0).await.unwrap();
    h.engine.place_bid(listing_id, dealer_b(), 4000.0).await.unwrap(); // stale, no event
    h.engine.place_bid(listing_id, dealer_b(), 5500.0).await.unwrap();

    let events = h.notifier.events();
    assert_eq!(events.len(), 2);

    let BidEvent::BidAccepted { dealer_id, amount, previous_bidder, .. } = &events[0];
    assert_eq!(*dealer_id, dealer_a());
    assert_eq!(*amount, gbp(500_000));
    assert_eq!(*previous_bidder, None);

    let BidEvent::BidAccepted { dealer_id, amount, previous_bidder, .. } = &events[1];
    assert_eq!(*dealer_id, dealer_b());
    assert_eq!(*amount, gbp(550_000));
    assert_eq!(*previous_bidder, Some(dealer_a()));
}

#[tokio::test]
async fn test_ledger_reconstructs_listing_highest() {
    let h = harness().await;
    let listing_id = with_active_listing(&h).await;

    h.engine.place_bid(listing_id, dealer_a(), 5000.0).await.unwrap();
    h.engine.place_bid(listing_id, dealer_b(), 5500.0).await.unwrap();
    h.engine.place_bid(listing_id, dealer_c(), 5200.0).await.unwrap(); // stale

    let rebuilt = h.engine.reconstruct_highest(listing_id).await.unwrap().unwrap();
    let listing = h.listings.fetch(listing_id).await.unwrap().unwrap();

    assert_eq!(Some(rebuilt.amount), listing.current_highest_bid);
    assert_eq!(Some(rebuilt.dealer_id), listing.current_highest_bidder);
}

/// Listing store whose commits always lose the version race.
struct ContendedStore {
    inner: Arc<car_bidding::persistence::InMemoryListingStore>,
    commit_calls: AtomicU32,
}

#[async_trait]
impl ListingStore for ContendedStore {
    async fn get_for_bid(&self, listing_id: ListingId) -> Result<Option<ListingSnapshot>, StoreError> {
        self.inner.get_for_bid(listing_id).await
    }

    async fn commit_bid(
        &self,
        _listing_id: ListingId,
        _expected_version: u64,
        _new_highest_bid: Amount,
        _new_highest_bidder: DealerId,
    ) -> Result<CommitOutcome, StoreError> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(CommitOutcome::VersionConflict)
    }

    async fn insert(&self, listing: Listing) -> Result<(), StoreError> {
        self.inner.insert(listing).await
    }

    async fn fetch(&self, listing_id: ListingId) -> Result<Option<Listing>, StoreError> {
        self.inner.fetch(listing_id).await
    }

    async fn set_status(&self, listing_id: ListingId, status: ListingStatus) -> Result<bool, StoreError> {
        self.inner.set_status(listing_id, status).await
    }

    async fn list(&self) -> Result<Vec<Listing>, StoreError> {
        self.inner.list().await
    }
}

#[tokio::test]
async fn test_commit_retry_budget_is_bounded() {
    let h = harness().await;
    let store = Arc::new(ContendedStore {
        inner: h.listings.clone(),
        commit_calls: AtomicU32::new(0),
    });
    store.insert(sample_listing()).await.unwrap();

    let engine = BidEngine::new(
        store.clone(),
        h.ledger.clone(),
        h.directory.clone(),
        h.notifier.clone(),
    )
    .with_commit_attempts(3);

    let result = engine.place_bid(sample_listing_id(), dealer_a(), 5000.0).await;

    match result {
        Err(EngineError::Contention(id)) => assert_eq!(id, sample_listing_id()),
        other => panic!("Expected Contention error, got {:?}", other.map(|r| r.outcome)),
    }
    assert_eq!(store.commit_calls.load(Ordering::SeqCst), 3);
}

/// Ledger that is never reachable.
struct UnavailableLedger;

#[async_trait]
impl BidLedger for UnavailableLedger {
    async fn record(&self, _bid: Bid) -> Result<BidId, StoreError> {
        Err(StoreError::Unavailable("ledger down".to_string()))
    }

    async fn bids_for(&self, _listing_id: ListingId) -> Result<Vec<Bid>, StoreError> {
        Err(StoreError::Unavailable("ledger down".to_string()))
    }

    async fn highest_accepted(&self, _listing_id: ListingId) -> Result<Option<Bid>, StoreError> {
        Err(StoreError::Unavailable("ledger down".to_string()))
    }
}

#[tokio::test]
async fn test_ledger_outage_is_a_storage_failure() {
    let h = harness().await;
    let listing_id = with_active_listing(&h).await;

    let engine = BidEngine::new(
        h.listings.clone(),
        Arc::new(UnavailableLedger),
        h.directory.clone(),
        h.notifier.clone(),
    );

    let result = engine.place_bid(listing_id, dealer_a(), 5000.0).await;
    assert!(matches!(result, Err(EngineError::Storage(StoreError::Unavailable(_)))));
}

/// Store that never answers within a bid's time budget.
struct StalledStore;

#[async_trait]
impl ListingStore for StalledStore {
    async fn get_for_bid(&self, _listing_id: ListingId) -> Result<Option<ListingSnapshot>, StoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(None)
    }

    async fn commit_bid(
        &self,
        _listing_id: ListingId,
        _expected_version: u64,
        _new_highest_bid: Amount,
        _new_highest_bidder: DealerId,
    ) -> Result<CommitOutcome, StoreError> {
        Ok(CommitOutcome::VersionConflict)
    }

    async fn insert(&self, _listing: Listing) -> Result<(), StoreError> {
        Ok(())
    }

    async fn fetch(&self, _listing_id: ListingId) -> Result<Option<Listing>, StoreError> {
        Ok(None)
    }

    async fn set_status(&self, _listing_id: ListingId, _status: ListingStatus) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn list(&self) -> Result<Vec<Listing>, StoreError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_bid_timeout_reports_unknown_outcome() {
    let h = harness().await;

    let engine = BidEngine::new(
        Arc::new(StalledStore),
        Arc::new(InMemoryBidLedger::new()),
        h.directory.clone(),
        h.notifier.clone(),
    );

    let result = engine
        .place_bid_within(sample_listing_id(), dealer_a(), 5000.0, Duration::from_millis(20))
        .await;

    match result {
        Err(EngineError::TimedOut(id)) => assert_eq!(id, sample_listing_id()),
        other => panic!("Expected TimedOut error, got {:?}", other.map(|r| r.outcome)),
    }
}
