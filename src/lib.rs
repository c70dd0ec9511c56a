//! Floor plan to interior render web service.
//!
//! An uploaded blueprint is sent with a style-conditioned prompt to an
//! image-to-image API, failing over across every configured API key until one
//! produces a render. Accounts, plan subscriptions, a contact form and a chat
//! assistant round out the site.

pub mod accounts;
pub mod assistant;
pub mod config;
pub mod error;
pub mod generation;
pub mod logger;
pub mod mail;
pub mod models;
pub mod server;
pub mod storage;

pub use assistant::ChatClient;
pub use config::Config;
pub use error::{AppError, GenerationError, Result};
pub use generation::{
    Credential, CredentialPool, ImageGenerationClient, InteriorGenerator, StyleCatalog,
    DEFAULT_STYLE,
};
pub use models::{GenerationOutcome, GenerationRequest};
pub use server::AppState;
