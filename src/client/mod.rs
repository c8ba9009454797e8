pub mod liblib;
pub mod proxy;

use async_trait::async_trait;

use crate::{
    error::Result,
    models::{GenerateRequest, GenerateResponse, StatusSnapshot},
};

pub use liblib::LiblibClient;
pub use proxy::ProxyClient;

/// Submit/poll contract shared by the signed downstream client and the proxy client.
#[async_trait]
pub trait GenerationApi: Send + Sync {
    /// Starts a generation task and returns its handle.
    async fn submit(&self, request: &GenerateRequest) -> Result<GenerateResponse>;

    /// Fetches a single status snapshot. Looping is the caller's job.
    async fn poll(&self, generate_uuid: &str) -> Result<StatusSnapshot>;
}
