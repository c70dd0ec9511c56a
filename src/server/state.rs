use crate::{
    accounts::SessionStore,
    assistant::ChatClient,
    config::Config,
    error::Result,
    generation::InteriorGenerator,
    mail::{Mailer, SmtpMailer},
    storage::{AccountStorage, AccountStorageManager},
};
use std::sync::Arc;

/// Shared by every worker; wrapped in `web::Data` by the server.
pub struct AppState {
    pub config: Arc<Config>,
    pub generator: InteriorGenerator,
    pub chat: ChatClient,
    pub storage: Arc<dyn AccountStorage>,
    pub sessions: SessionStore,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(
        config: Config,
        storage: Arc<dyn AccountStorage>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self> {
        let generator = InteriorGenerator::new(&config)?;
        let chat = ChatClient::new(config.openai.clone())?;

        Ok(Self {
            config: Arc::new(config),
            generator,
            chat,
            storage,
            sessions: SessionStore::new(),
            mailer,
        })
    }

    /// Builds the storage backend and SMTP mailer named by `config`.
    pub async fn from_config(config: Config) -> Result<Self> {
        let manager = AccountStorageManager::new(&config).await?;
        let mailer = Arc::new(SmtpMailer::new(config.smtp.clone()));
        Self::new(config, manager.storage().clone(), mailer)
    }
}
