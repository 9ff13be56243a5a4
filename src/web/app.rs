// src/web/app.rs
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Result};
use base64::{engine::general_purpose, Engine as _};
use log::info;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::directory::InMemoryDealerDirectory;
use crate::domain::{BidEngine, BidOutcome, EngineError, ListingId, ListingStatus, SellerRef};
use crate::notify::LogNotifier;
use crate::persistence::{BidLedger, InMemoryBidLedger, InMemoryListingStore, ListingStore};
use super::types::{
    ApiError, AppState, BidRequest, CloseListingRequest, CreateListingRequest, Identity,
    ListingDetail, ListingItem, RegisterDealerRequest, RegisteredDealer,
};

// Initialize application state
pub fn init_app_state(config: &Config) -> AppState {
    let listings = Arc::new(InMemoryListingStore::new());
    let ledger = Arc::new(InMemoryBidLedger::new());
    let directory = Arc::new(InMemoryDealerDirectory::new());

    let engine = BidEngine::new(
        listings.clone(),
        ledger.clone(),
        directory.clone(),
        Arc::new(LogNotifier),
    )
    .with_commit_attempts(config.commit_attempts);

    AppState {
        engine: Arc::new(engine),
        listings,
        ledger,
        directory,
        bid_timeout: config.bid_timeout(),
    }
}

// Read x-jwt-payload header and extract the caller identity
fn get_auth_identity(req: &HttpRequest) -> Option<Identity> {
    let auth_header = req.headers().get("x-jwt-payload")?;
    let auth_str = auth_header.to_str().ok()?;

    // Decode base64
    let decoded = general_purpose::STANDARD.decode(auth_str).ok()?;
    let json_str = String::from_utf8(decoded).ok()?;

    // Parse JSON
    let json: Value = serde_json::from_str(&json_str).ok()?;

    let sub = json.get("sub")?.as_str()?;
    let typ = json.get("typ")?.as_str()?;
    let id = Uuid::parse_str(sub).ok()?;

    match typ {
        "dealer" => Some(Identity::Dealer { dealer_id: id }),
        "seller" => Some(Identity::Seller { seller_id: id }),
        _ => None,
    }
}

// A dealer identity is required to place bids
fn require_dealer(req: &HttpRequest) -> std::result::Result<Uuid, HttpResponse> {
    match get_auth_identity(req) {
        Some(Identity::Dealer { dealer_id }) => Ok(dealer_id),
        Some(_) => Err(HttpResponse::Forbidden().json(ApiError::new("Dealers only"))),
        None => Err(HttpResponse::Unauthorized().json(ApiError::new("Unauthorized"))),
    }
}

// Get all listings
async fn get_listings(data: web::Data<AppState>) -> Result<HttpResponse> {
    match data.listings.list().await {
        Ok(listings) => {
            let items: Vec<ListingItem> = listings.iter().map(ListingItem::from).collect();
            Ok(HttpResponse::Ok().json(items))
        }
        Err(err) => Ok(HttpResponse::ServiceUnavailable().json(ApiError::new(err.to_string()))),
    }
}

// Get listing by ID, with its bid history
async fn get_listing(path: web::Path<ListingId>, data: web::Data<AppState>) -> Result<HttpResponse> {
    let listing_id = path.into_inner();

    let listing = match data.listings.fetch(listing_id).await {
        Ok(Some(listing)) => listing,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiError::new("Listing not found")));
        }
        Err(err) => {
            return Ok(HttpResponse::ServiceUnavailable().json(ApiError::new(err.to_string())));
        }
    };

    match data.ledger.bids_for(listing_id).await {
        Ok(bids) => Ok(HttpResponse::Ok().json(ListingDetail::from_parts(&listing, bids))),
        Err(err) => Ok(HttpResponse::ServiceUnavailable().json(ApiError::new(err.to_string()))),
    }
}

// Create a new listing
async fn create_listing(
    req: HttpRequest,
    listing_req: web::Json<CreateListingRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let seller = match get_auth_identity(&req) {
        Some(Identity::Seller { seller_id }) => SellerRef::Private { seller_id },
        Some(Identity::Dealer { dealer_id }) => SellerRef::Dealer { dealer_id },
        None => return Ok(HttpResponse::Unauthorized().json(ApiError::new("Unauthorized"))),
    };

    let listing = listing_req.to_listing(seller);

    match data.listings.insert(listing.clone()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(listing)),
        Err(err) => Ok(HttpResponse::ServiceUnavailable().json(ApiError::new(err.to_string()))),
    }
}

// Transition a listing out of Active. Owned by the listing side, not the
// bid engine; only the listing's seller may do it.
async fn close_listing(
    req: HttpRequest,
    path: web::Path<ListingId>,
    close_req: web::Json<CloseListingRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let listing_id = path.into_inner();

    let identity = match get_auth_identity(&req) {
        Some(identity) => identity,
        None => return Ok(HttpResponse::Unauthorized().json(ApiError::new("Unauthorized"))),
    };

    if close_req.status == ListingStatus::Active {
        return Ok(HttpResponse::BadRequest().json(ApiError::new("Cannot close a listing to Active")));
    }

    let listing = match data.listings.fetch(listing_id).await {
        Ok(Some(listing)) => listing,
        Ok(None) => return Ok(HttpResponse::NotFound().json(ApiError::new("Listing not found"))),
        Err(err) => {
            return Ok(HttpResponse::ServiceUnavailable().json(ApiError::new(err.to_string())));
        }
    };

    let authorized = match (identity, listing.seller) {
        (Identity::Seller { seller_id }, SellerRef::Private { seller_id: owner }) => seller_id == owner,
        (Identity::Dealer { dealer_id }, SellerRef::Dealer { dealer_id: owner }) => dealer_id == owner,
        _ => false,
    };
    if !authorized {
        return Ok(HttpResponse::Forbidden().json(ApiError::new("Not the listing's seller")));
    }

    match data.listings.set_status(listing_id, close_req.status).await {
        Ok(true) => Ok(HttpResponse::Ok().finish()),
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiError::new("Listing not found"))),
        Err(err) => Ok(HttpResponse::ServiceUnavailable().json(ApiError::new(err.to_string()))),
    }
}

// Register a dealer in the directory
async fn register_dealer(
    dealer_req: web::Json<RegisterDealerRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let dealer_id = Uuid::new_v4();
    data.directory.register(dealer_id, &dealer_req.name).await;

    Ok(HttpResponse::Ok().json(RegisteredDealer { dealer_id }))
}

// Place a bid on a listing
async fn place_bid(
    req: HttpRequest,
    path: web::Path<ListingId>,
    bid_req: web::Json<BidRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse> {
    let listing_id = path.into_inner();

    let dealer_id = match require_dealer(&req) {
        Ok(dealer_id) => dealer_id,
        Err(resp) => return Ok(resp),
    };

    let result = data
        .engine
        .place_bid_within(listing_id, dealer_id, bid_req.amount, data.bid_timeout)
        .await;

    match result {
        // Business rejections still answer 200; the receipt explains the loss
        // and carries the authoritative highest bid.
        Ok(receipt) => match receipt.outcome {
            BidOutcome::RejectedListingClosed => Ok(HttpResponse::Gone().json(receipt)),
            _ => Ok(HttpResponse::Ok().json(receipt)),
        },
        Err(EngineError::Contention(_)) => Ok(HttpResponse::Conflict()
            .json(ApiError::new("Listing is contended, retry your bid"))),
        Err(EngineError::TimedOut(_)) => Ok(HttpResponse::GatewayTimeout()
            .json(ApiError::new("Bid outcome unknown, re-query the listing"))),
        Err(EngineError::Storage(err)) => {
            Ok(HttpResponse::ServiceUnavailable().json(ApiError::new(err.to_string())))
        }
    }
}

// Configure routes
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            .route("/listings", web::get().to(get_listings))
            .route("/listings", web::post().to(create_listing))
            .route("/listings/{id}", web::get().to(get_listing))
            .route("/listings/{id}/close", web::post().to(close_listing))
            .route("/listings/{id}/bids", web::post().to(place_bid))
            .route("/dealers", web::post().to(register_dealer)),
    );
}

// Main application
pub async fn run_app(config: Config) -> std::io::Result<()> {
    let app_state = init_app_state(&config);

    info!("Starting server on {}:{}", config.bind_address, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(Logger::default())
            .configure(configure_app)
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await
}
