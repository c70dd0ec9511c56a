pub mod credentials;
pub mod image_client;
pub mod styles;

use crate::{
    config::Config,
    error::GenerationError,
    logger,
    models::{GenerationOutcome, GenerationRequest},
};
use std::path::{Path, PathBuf};

pub use credentials::{Credential, CredentialPool};
pub use image_client::ImageGenerationClient;
pub use styles::{StyleCatalog, StyleDescriptor, DEFAULT_STYLE};

/// Ties the style catalog, the credential pool and the image client together
/// for one configured deployment. Immutable once built.
#[derive(Clone)]
pub struct InteriorGenerator {
    client: ImageGenerationClient,
    credentials: CredentialPool,
    base_dir: PathBuf,
}

impl InteriorGenerator {
    pub fn new(config: &Config) -> Result<Self, GenerationError> {
        Ok(Self {
            client: ImageGenerationClient::new(config.stability.clone())?,
            credentials: config.credentials.clone(),
            base_dir: config.base_dir.clone(),
        })
    }

    pub fn credentials(&self) -> &CredentialPool {
        &self.credentials
    }

    pub fn is_configured(&self) -> bool {
        !self.credentials.is_empty()
    }

    /// Resolves the prompt for `style` and runs the credential loop.
    pub async fn generate_interior(
        &self,
        style: &str,
        user_prompt: &str,
        source_image: &Path,
        output_path: &Path,
    ) -> Result<GenerationOutcome, GenerationError> {
        let prompt = StyleCatalog::resolve_prompt(style, user_prompt);
        let request = GenerationRequest::new(prompt, source_image, output_path)
            .with_style(style)
            .with_base_dir(&self.base_dir);

        let _timer = logger::timer("interior generation");
        self.client
            .generate_detailed(&self.credentials, &request)
            .await
    }
}
