mod registry;
mod traits;

// Site handlers
mod site;
mod xpost;
mod youtube;

use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::llm::LlmClient;

pub use registry::HandlerRegistry;
pub use site::GenericSiteHandler;
pub use traits::{FetchedPage, SourceHandler};
pub use xpost::XPostHandler;
pub use youtube::YouTubeHandler;

/// Build the registry with every known handler. Handlers own their HTTP
/// clients, so the registry is constructed per run rather than held in a
/// global.
///
/// # Errors
///
/// Returns an error if any handler fails to construct.
pub fn build_registry(config: &Config, llm: Option<Arc<LlmClient>>) -> Result<HandlerRegistry> {
    let mut registry = HandlerRegistry::new();
    registry.register(Box::new(XPostHandler::new(config)?));
    registry.register(Box::new(YouTubeHandler::new(config, llm)?));
    registry.register(Box::new(GenericSiteHandler::new(config)?));
    Ok(registry)
}
