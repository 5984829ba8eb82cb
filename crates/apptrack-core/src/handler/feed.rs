use apptrack_schema::ProductState;
use async_trait::async_trait;
use tracing::{debug, info};

use super::{HandlerContext, HandlerError, HandlerOptions, ProductHandler};
use crate::io::retrieve::RetrievalRequest;

const DEFAULT_FEED_TYPE: &str = "application/json";

/// Generic handler reading the latest release from a JSON document.
///
/// The feed is a JSON object using the catalog field names, e.g.
/// `{"name": "Example", "version": "2.1.0", "location": "https://..."}`.
/// Fields absent from the feed keep their defaults.
#[derive(Debug, Clone)]
pub struct JsonFeedHandler {
    state: ProductState,
    feed: String,
    content_type: String,
}

impl JsonFeedHandler {
    pub const NAME: &'static str = "json-feed";

    pub fn new(feed: impl Into<String>) -> Self {
        Self {
            state: ProductState::default(),
            feed: feed.into(),
            content_type: DEFAULT_FEED_TYPE.to_string(),
        }
    }

    /// Expected MIME type of the feed. An empty string disables the check.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Build a handler from the `feed` and optional `content_type` options.
    pub fn from_options(options: &HandlerOptions) -> Result<Box<dyn ProductHandler>, HandlerError> {
        let feed = options
            .get("feed")
            .and_then(toml::Value::as_str)
            .filter(|feed| !feed.trim().is_empty())
            .ok_or_else(|| HandlerError::Options("missing 'feed' URL".to_string()))?;

        let mut handler = Self::new(feed);
        match options.get("content_type") {
            None => {}
            Some(toml::Value::String(content_type)) => {
                handler = handler.with_content_type(content_type.as_str());
            }
            Some(other) => {
                return Err(HandlerError::Options(format!(
                    "'content_type' must be a string, not {}",
                    other.type_str()
                )));
            }
        }
        Ok(Box::new(handler))
    }
}

#[async_trait]
impl ProductHandler for JsonFeedHandler {
    fn state(&self) -> &ProductState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProductState {
        &mut self.state
    }

    async fn fetch_origin(
        &mut self,
        ctx: &HandlerContext<'_>,
        prior_version: Option<&str>,
    ) -> Result<(), HandlerError> {
        debug!(
            "{}: reading {} (approved version: {:?})",
            ctx.product, self.feed, prior_version
        );
        let mut body = Vec::new();
        RetrievalRequest::new(ctx.client, &self.feed)
            .expect_type(self.content_type.as_str())
            .with_timeout(ctx.timeout)
            .retrieve(&mut body)
            .await?;

        let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(&body)?;
        let mut state = self.state.clone();
        state.merge_json(&fields)?;
        state.feed_location.clone_from(&self.feed);
        state.parsed_version()?;
        if state.display_name.is_empty() {
            state.display_name = format!("{} v{}", state.name, state.version);
        }

        info!(
            "{}: latest product information fetched ({} published on {})",
            ctx.product, state.version, state.published
        );
        self.state = state;
        Ok(())
    }
}
