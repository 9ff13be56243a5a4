// src/directory.rs
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::DealerId;
use crate::persistence::StoreError;

/// Existence and standing check for dealers. The engine only asks the one
/// question; registration and suspension belong to the directory's owner.
#[async_trait]
pub trait DealerDirectory: Send + Sync {
    async fn is_active_dealer(&self, dealer_id: DealerId) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealerRecord {
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryDealerDirectory {
    dealers: RwLock<HashMap<DealerId, DealerRecord>>,
}

impl InMemoryDealerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, dealer_id: DealerId, name: &str) {
        let mut dealers = self.dealers.write().await;
        dealers.insert(
            dealer_id,
            DealerRecord {
                name: name.to_string(),
                active: true,
            },
        );
    }

    /// Returns false if the dealer was never registered.
    pub async fn set_active(&self, dealer_id: DealerId, active: bool) -> bool {
        let mut dealers = self.dealers.write().await;
        match dealers.get_mut(&dealer_id) {
            Some(record) => {
                record.active = active;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl DealerDirectory for InMemoryDealerDirectory {
    async fn is_active_dealer(&self, dealer_id: DealerId) -> Result<bool, StoreError> {
        let dealers = self.dealers.read().await;
        Ok(dealers.get(&dealer_id).map(|d| d.active).unwrap_or(false))
    }
}
