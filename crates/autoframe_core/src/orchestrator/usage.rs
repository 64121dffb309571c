//! Daily render counter.

use async_trait::async_trait;

use crate::remote::{RemoteJobClient, RemoteResult};

/// Source of the number of renders already used today.
#[async_trait]
pub trait UsageCounter: Send + Sync {
    async fn renders_today(&self) -> RemoteResult<u32>;
}

#[async_trait]
impl UsageCounter for RemoteJobClient {
    async fn renders_today(&self) -> RemoteResult<u32> {
        Ok(self.fetch_usage().await?.renders_today)
    }
}
