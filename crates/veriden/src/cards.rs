/*!
 * Card storage collaborator
 *
 * Wallets keep credentials, receipts and anything else worth holding on
 * to as cards. The SDK treats them as opaque JSON and leaves persistence
 * to the [CardStore] implementation.
 */

use ahash::AHashMap;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::Result;

/// Keyed storage for the cards a wallet holds
#[allow(async_fn_in_trait)]
pub trait CardStore {
    /// Get the card saved under `id`
    async fn get(&self, id: &str) -> Result<Option<Value>>;

    /// Save a card under `id`, replacing any previous entry
    async fn insert(&self, id: &str, card: Value) -> Result<()>;

    /// Delete the card saved under `id`
    async fn delete(&self, id: &str) -> Result<()>;

    /// All saved cards
    async fn list(&self) -> Result<Vec<Value>>;
}

/// In-memory card store, safe to share across tasks
#[derive(Default)]
pub struct MemoryCardStore {
    cards: RwLock<AHashMap<String, Value>>,
}

impl MemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CardStore for MemoryCardStore {
    async fn get(&self, id: &str) -> Result<Option<Value>> {
        Ok(self.cards.read().await.get(id).cloned())
    }

    async fn insert(&self, id: &str, card: Value) -> Result<()> {
        self.cards.write().await.insert(id.to_string(), card);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.cards.write().await.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Value>> {
        Ok(self.cards.read().await.values().cloned().collect())
    }
}
