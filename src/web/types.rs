// src/web/types.rs
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::directory::InMemoryDealerDirectory;
use crate::domain::{
    Bid, BidEngine, CarSummary, DealerId, Listing, ListingId, ListingStatus, SellerId, SellerRef,
};
use crate::money::{Amount, Currency};
use crate::persistence::{BidLedger, ListingStore};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<BidEngine>,
    pub listings: Arc<dyn ListingStore>,
    pub ledger: Arc<dyn BidLedger>,
    pub directory: Arc<InMemoryDealerDirectory>,
    pub bid_timeout: Duration,
}

/// Server-validated caller identity, decoded from the request headers. The
/// engine never sees a dealer id that did not come through here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Dealer { dealer_id: DealerId },
    Seller { seller_id: SellerId },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        ApiError { message: message.into() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BidRequest {
    /// Decimal amount in the listing currency's major unit, e.g. 5000.50.
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateListingRequest {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub currency: Option<Currency>,
}

impl CreateListingRequest {
    pub fn to_listing(&self, seller: SellerRef) -> Listing {
        let currency = self.currency.unwrap_or(Currency::GBP);
        let car = CarSummary {
            make: self.make.clone(),
            model: self.model.clone(),
            year: self.year,
        };

        Listing::new(Uuid::new_v4(), seller, car, currency)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CloseListingRequest {
    pub status: ListingStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterDealerRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisteredDealer {
    #[serde(rename = "dealerId")]
    pub dealer_id: DealerId,
}

#[derive(Debug, Serialize)]
pub struct ListingItem {
    pub id: ListingId,
    pub car: CarSummary,
    pub status: ListingStatus,
    pub currency: Currency,
    #[serde(rename = "currentHighestBid")]
    pub current_highest_bid: Option<Amount>,
}

impl From<&Listing> for ListingItem {
    fn from(listing: &Listing) -> Self {
        ListingItem {
            id: listing.id,
            car: listing.car.clone(),
            status: listing.status,
            currency: listing.currency,
            current_highest_bid: listing.current_highest_bid,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListingDetail {
    pub id: ListingId,
    pub seller: SellerRef,
    pub car: CarSummary,
    pub status: ListingStatus,
    pub currency: Currency,
    #[serde(rename = "currentHighestBid")]
    pub current_highest_bid: Option<Amount>,
    #[serde(rename = "currentHighestBidder")]
    pub current_highest_bidder: Option<DealerId>,
    pub bids: Vec<Bid>,
}

impl ListingDetail {
    pub fn from_parts(listing: &Listing, bids: Vec<Bid>) -> Self {
        ListingDetail {
            id: listing.id,
            seller: listing.seller,
            car: listing.car.clone(),
            status: listing.status,
            currency: listing.currency,
            current_highest_bid: listing.current_highest_bid,
            current_highest_bidder: listing.current_highest_bidder,
            bids,
        }
    }
}
