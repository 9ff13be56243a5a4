// src/domain/core.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub type ListingId = Uuid;
pub type DealerId = Uuid;
pub type SellerId = Uuid;
pub type BidId = Uuid;

/// The party that put a listing on the marketplace: a private seller or a
/// dealer selling out of their own stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellerRef {
    Private {
        seller_id: SellerId,
    },
    Dealer {
        dealer_id: DealerId,
    },
}

impl SellerRef {
    pub fn owner_id(&self) -> Uuid {
        match self {
            SellerRef::Private { seller_id } => *seller_id,
            SellerRef::Dealer { dealer_id } => *dealer_id,
        }
    }
}

impl<'de> Deserialize<'de> for SellerRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        SellerRef::from_str(&text).map_err(serde::de::Error::custom)
    }
}
impl Serialize for SellerRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer {
        serializer.serialize_str(&self.to_string())
    }
}

impl fmt::Display for SellerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SellerRef::Private { seller_id } => write!(f, "Private|{}", seller_id),
            SellerRef::Dealer { dealer_id } => write!(f, "Dealer|{}", dealer_id),
        }
    }
}

impl FromStr for SellerRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('|').collect();

        match parts.as_slice() {
            ["Private", seller_id] => {
                let seller_id = Uuid::parse_str(seller_id)
                    .map_err(|e| format!("parsing SellerRef failed, bad seller id: {}", e))?;
                Ok(SellerRef::Private { seller_id })
            },
            ["Dealer", dealer_id] => {
                let dealer_id = Uuid::parse_str(dealer_id)
                    .map_err(|e| format!("parsing SellerRef failed, bad dealer id: {}", e))?;
                Ok(SellerRef::Dealer { dealer_id })
            },
            _ => {
                Err(format!("parsing SellerRef failed, could not interpret values: {:?}", parts))
            }
        }
    }
}
