use anyhow::Result;
use async_trait::async_trait;
use storage::Storage;

use crate::StateStore;

#[async_trait]
impl StateStore for Storage {
    async fn get(&self, user: &str, key: &str) -> Result<Option<serde_json::Value>> {
        self.load_value(user, key).await
    }

    async fn set(&self, user: &str, key: &str, value: &serde_json::Value) -> Result<()> {
        self.store_value(user, key, value).await
    }
}
