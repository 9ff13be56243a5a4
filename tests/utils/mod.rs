use std::sync::{Arc, Mutex};
use uuid::Uuid;

use car_bidding::directory::InMemoryDealerDirectory;
use car_bidding::domain::{
    BidEngine, BidEvent, CarSummary, DealerId, Listing, ListingId, SellerId, SellerRef,
};
use car_bidding::money::{Amount, Currency};
use car_bidding::notify::Notifier;
use car_bidding::persistence::{InMemoryBidLedger, InMemoryListingStore, ListingStore};
// See https://users.rust-lang.org/t/sharing-code-and-macros-in-tests-directory/3098/7

// Sample data for tests
pub fn sample_listing_id() -> ListingId {
    Uuid::from_u128(0x11)
}

pub fn other_listing_id() -> ListingId {
    Uuid::from_u128(0x12)
}

pub fn sample_seller_id() -> SellerId {
    Uuid::from_u128(0x51)
}

pub fn dealer_a() -> DealerId {
    Uuid::from_u128(0xA1)
}

pub fn dealer_b() -> DealerId {
    Uuid::from_u128(0xB1)
}

pub fn dealer_c() -> DealerId {
    Uuid::from_u128(0xC1)
}

pub fn unknown_dealer() -> DealerId {
    Uuid::from_u128(0xDEAD)
}

pub fn gbp(minor: i64) -> Amount {
    Amount::new(Currency::GBP, minor)
}

pub fn sample_car() -> CarSummary {
    CarSummary {
        make: "Audi".to_string(),
        model: "A4".to_string(),
        year: 2019,
    }
}

pub fn sample_listing() -> Listing {
    Listing::new(
        sample_listing_id(),
        SellerRef::Private { seller_id: sample_seller_id() },
        sample_car(),
        Currency::GBP,
    )
}

pub fn other_listing() -> Listing {
    Listing::new(
        other_listing_id(),
        SellerRef::Dealer { dealer_id: dealer_c() },
        CarSummary {
            make: "Volvo".to_string(),
            model: "V60".to_string(),
            year: 2021,
        },
        Currency::GBP,
    )
}

/// Captures emitted events for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<BidEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<BidEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn emit(&self, event: BidEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub engine: Arc<BidEngine>,
    pub listings: Arc<InMemoryListingStore>,
    pub ledger: Arc<InMemoryBidLedger>,
    pub directory: Arc<InMemoryDealerDirectory>,
    pub notifier: Arc<RecordingNotifier>,
}

/// Engine over fresh in-memory stores, with dealers A, B and C registered.
pub async fn harness() -> Harness {
    let listings = Arc::new(InMemoryListingStore::new());
    let ledger = Arc::new(InMemoryBidLedger::new());
    let directory = Arc::new(InMemoryDealerDirectory::new());
    let notifier = Arc::new(RecordingNotifier::default());

    directory.register(dealer_a(), "Dealer A").await;
    directory.register(dealer_b(), "Dealer B").await;
    directory.register(dealer_c(), "Dealer C").await;

    let engine = BidEngine::new(
        listings.clone(),
        ledger.clone(),
        directory.clone(),
        notifier.clone(),
    );

    Harness {
        engine: Arc::new(engine),
        listings,
        ledger,
        directory,
        notifier,
    }
}

/// Insert the sample listing and return its id.
pub async fn with_active_listing(harness: &Harness) -> ListingId {
    let listing = sample_listing();
    let id = listing.id;
    harness.listings.insert(listing).await.unwrap();
    id
}
