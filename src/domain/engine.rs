// src/domain/engine.rs
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::directory::DealerDirectory;
use crate::money::{Amount, Currency};
use crate::notify::Notifier;
use crate::persistence::{BidLedger, CommitOutcome, ListingStore, StoreError};
use super::bids::{Bid, BidOutcome, BidReceipt};
use super::core::{DealerId, ListingId};
use super::events::BidEvent;
use super::listings::ListingSnapshot;

/// How often a commit may lose the version race before the request is given
/// up as contended.
pub const DEFAULT_COMMIT_ATTEMPTS: u32 = 5;

/// Currency used on audit records when the listing (and with it the listing
/// currency) cannot be resolved.
const FALLBACK_CURRENCY: Currency = Currency::GBP;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The conditional write lost the version race on every attempt.
    /// Transient; the caller may retry the whole request.
    #[error("Bid contention on listing {0}, retry the request")]
    Contention(ListingId),

    /// The time budget ran out before the commit was observed. The outcome is
    /// unknown; the caller should re-query the listing rather than retry
    /// blindly.
    #[error("Bid on listing {0} timed out, outcome unknown")]
    TimedOut(ListingId),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Accepts a dealer's bid against a listing and decides, under concurrent
/// submission, whether it becomes the new authoritative highest bid.
///
/// Serialization is per listing: commits are conditional on the version read
/// with the snapshot, and a conflict re-reads and re-evaluates. Bids on
/// different listings never wait on each other.
pub struct BidEngine {
    listings: Arc<dyn ListingStore>,
    ledger: Arc<dyn BidLedger>,
    directory: Arc<dyn DealerDirectory>,
    notifier: Arc<dyn Notifier>,
    commit_attempts: u32,
}

impl BidEngine {
    pub fn new(
        listings: Arc<dyn ListingStore>,
        ledger: Arc<dyn BidLedger>,
        directory: Arc<dyn DealerDirectory>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        BidEngine {
            listings,
            ledger,
            directory,
            notifier,
            commit_attempts: DEFAULT_COMMIT_ATTEMPTS,
        }
    }

    pub fn with_commit_attempts(mut self, commit_attempts: u32) -> Self {
        self.commit_attempts = commit_attempts.max(1);
        self
    }

    /// Judge one submitted bid. Every judged bid leaves a ledger record; only
    /// an accepted bid mutates the listing. The receipt always carries the
    /// authoritative highest bid after evaluation.
    pub async fn place_bid(
        &self,
        listing_id: ListingId,
        dealer_id: DealerId,
        amount: f64,
    ) -> Result<BidReceipt, EngineError> {
        let submitted_at = Utc::now();
        let mut snapshot = self.listings.get_for_bid(listing_id).await?;
        let currency = snapshot.map(|s| s.currency).unwrap_or(FALLBACK_CURRENCY);

        let amount = match Amount::from_decimal(currency, amount) {
            Ok(amount) => amount,
            Err(err) => {
                debug!("rejecting bid on listing {}: {}", listing_id, err);
                return self
                    .reject(
                        listing_id,
                        dealer_id,
                        coerced_amount(currency, amount),
                        submitted_at,
                        BidOutcome::RejectedInvalidAmount,
                        snapshot,
                    )
                    .await;
            }
        };

        if !self.directory.is_active_dealer(dealer_id).await? {
            debug!("rejecting bid on listing {}: dealer {} not active", listing_id, dealer_id);
            return self
                .reject(
                    listing_id,
                    dealer_id,
                    amount,
                    submitted_at,
                    BidOutcome::RejectedDealerInactive,
                    snapshot,
                )
                .await;
        }

        for attempt in 1..=self.commit_attempts {
            let snap = match snapshot {
                Some(snap) => snap,
                // Missing listing and closed listing look the same to a bidder.
                None => {
                    return self
                        .reject(
                            listing_id,
                            dealer_id,
                            amount,
                            submitted_at,
                            BidOutcome::RejectedListingClosed,
                            None,
                        )
                        .await;
                }
            };

            if !snap.status.is_active() {
                return self
                    .reject(
                        listing_id,
                        dealer_id,
                        amount,
                        submitted_at,
                        BidOutcome::RejectedListingClosed,
                        Some(snap),
                    )
                    .await;
            }

            // Strictly greater: an equal bid is stale, not a tie to break.
            if let Some(current) = snap.current_highest_bid {
                if amount.value() <= current.value() {
                    return self
                        .reject(
                            listing_id,
                            dealer_id,
                            amount,
                            submitted_at,
                            BidOutcome::RejectedStale,
                            Some(snap),
                        )
                        .await;
                }
            }

            match self
                .listings
                .commit_bid(listing_id, snap.version, amount, dealer_id)
                .await?
            {
                CommitOutcome::Committed => {
                    let bid = Bid {
                        id: Uuid::new_v4(),
                        listing_id,
                        dealer_id,
                        amount,
                        submitted_at,
                        outcome: BidOutcome::Accepted,
                    };
                    let bid_id = self.ledger.record(bid).await?;

                    info!(
                        "bid accepted: listing {} at {} by dealer {}",
                        listing_id, amount, dealer_id
                    );
                    self.notifier.emit(BidEvent::BidAccepted {
                        at: submitted_at,
                        listing_id,
                        dealer_id,
                        amount,
                        previous_bidder: snap.current_highest_bidder,
                    });

                    return Ok(BidReceipt {
                        bid_id,
                        outcome: BidOutcome::Accepted,
                        current_highest_bid: Some(amount),
                        current_highest_bidder: Some(dealer_id),
                    });
                }
                CommitOutcome::VersionConflict => {
                    debug!(
                        "version conflict on listing {} (attempt {}/{}), re-reading",
                        listing_id, attempt, self.commit_attempts
                    );
                    snapshot = self.listings.get_for_bid(listing_id).await?;
                }
            }
        }

        Err(EngineError::Contention(listing_id))
    }

    /// `place_bid` under a caller-supplied time budget. On expiry no judgement
    /// is returned and the caller must treat the outcome as unknown.
    pub async fn place_bid_within(
        &self,
        listing_id: ListingId,
        dealer_id: DealerId,
        amount: f64,
        limit: Duration,
    ) -> Result<BidReceipt, EngineError> {
        match tokio::time::timeout(limit, self.place_bid(listing_id, dealer_id, amount)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::TimedOut(listing_id)),
        }
    }

    /// Authoritative highest accepted bid per the ledger, for auditing a
    /// listing row whose cached fields are suspect.
    pub async fn reconstruct_highest(&self, listing_id: ListingId) -> Result<Option<Bid>, EngineError> {
        Ok(self.ledger.highest_accepted(listing_id).await?)
    }

    async fn reject(
        &self,
        listing_id: ListingId,
        dealer_id: DealerId,
        amount: Amount,
        submitted_at: DateTime<Utc>,
        outcome: BidOutcome,
        snapshot: Option<ListingSnapshot>,
    ) -> Result<BidReceipt, EngineError> {
        let bid = Bid {
            id: Uuid::new_v4(),
            listing_id,
            dealer_id,
            amount,
            submitted_at,
            outcome,
        };
        let bid_id = self.ledger.record(bid).await?;

        Ok(BidReceipt {
            bid_id,
            outcome,
            current_highest_bid: snapshot.and_then(|s| s.current_highest_bid),
            current_highest_bidder: snapshot.and_then(|s| s.current_highest_bidder),
        })
    }
}

/// Best-effort amount for the audit record of a bid whose submitted value
/// failed validation.
fn coerced_amount(currency: Currency, raw: f64) -> Amount {
    let minor = if raw.is_finite() {
        (raw * 100.0).clamp(0.0, 1e14).trunc() as i64
    } else {
        0
    };
    Amount::new(currency, minor)
}
