use apptrack_schema::{ProductState, Target};
use async_trait::async_trait;
use tracing::info;

use super::{HandlerContext, HandlerError, HandlerOptions, ProductHandler};

/// Offline example handler publishing a fixed release.
#[derive(Debug, Clone)]
pub struct DummyHandler {
    state: ProductState,
}

impl Default for DummyHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyHandler {
    pub const NAME: &'static str = "dummy";

    pub fn new() -> Self {
        Self {
            state: ProductState {
                name: "Dummy Product".to_string(),
                ..ProductState::default()
            },
        }
    }

    pub fn from_options(_options: &HandlerOptions) -> Result<Box<dyn ProductHandler>, HandlerError> {
        Ok(Box::new(Self::new()))
    }
}

#[async_trait]
impl ProductHandler for DummyHandler {
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
        info!(
            "{}: fetching the latest product information since {}",
            ctx.product,
            prior_version.unwrap_or("the beginning")
        );
        let name = "Dummy Product".to_string();
        let version = "1.0.1".to_string();
        self.state = ProductState {
            display_name: format!("{name} v{version}"),
            published: chrono::Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string(),
            target: Target::Unified,
            description: "This dummy handler is a trivial example of a product handler."
                .to_string(),
            editor: "Example. inc".to_string(),
            web_site_location: "http://www.example.com/index.html".to_string(),
            location: "http://www.example.com/dist.zip".to_string(),
            icon: None,
            announce_location: "http://www.example.com/news.txt".to_string(),
            feed_location: "http://www.example.com/feed.rss".to_string(),
            release_note_location: "http://www.example.com/release_note.txt".to_string(),
            change_summary: "a dummy feature\nSmall miscellaneous improvements and bugfixes"
                .to_string(),
            file_size: -1,
            secure_hash: None,
            std_inst_args: String::new(),
            silent_inst_args: "/silent".to_string(),
            installer: String::new(),
            name,
            version,
        };
        info!(
            "{}: latest product information fetched ({} published on {})",
            ctx.product, self.state.version, self.state.published
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use apptrack_schema::ProductId;

    #[tokio::test]
    async fn publishes_a_fixed_release() {
        let client = reqwest::Client::new();
        let id = ProductId::new("dummy");
        let ctx = HandlerContext {
            client: &client,
            product: &id,
            reporter: &NullReporter,
            timeout: None,
        };
        let mut handler = DummyHandler::new();
        handler.fetch_origin(&ctx, None).await.unwrap();

        let state = handler.dump_state();
        assert_eq!(state.name, "Dummy Product");
        assert_eq!(state.version, "1.0.1");
        assert_eq!(state.silent_inst_args, "/silent");
        assert_eq!(state.file_size, -1);
        assert!(state.secure_hash.is_none());
        assert!(handler.is_update(&ProductState::default()).unwrap());
    }
}
