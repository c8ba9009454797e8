//! Signed-request client, task poller and thin HTTP proxy for a text-to-image API.

pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod poller;
#[cfg(feature = "server")]
pub mod server;
pub mod signer;

pub use client::{GenerationApi, LiblibClient, ProxyClient};
pub use config::{ApiConfig, Config, PollConfig, ServerConfig};
pub use error::{ProxyError, Result};
pub use models::*;
pub use poller::{PollPolicy, Poller};
pub use signer::{RequestSigner, SignedRequest};
