use crate::federation::FederationConfig;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub directory_url: String,
    pub exchange_url: String,
    pub config: FederationConfig,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(directory_url: String, exchange_url: String, config: FederationConfig) -> Self {
        Self {
            directory_url,
            exchange_url,
            config,
        }
    }
}
