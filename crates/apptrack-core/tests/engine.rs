//! Integration tests.

use std::path::Path;

use apptrack_core::handler::{HandlerContext, HandlerError, HandlerOptions};
use apptrack_core::schema::{ProductId, ProductState};
use apptrack_core::{
    AutoApprove, HandlerRegistry, Phase, ProductHandler, RejectAll, Tracker, TrackerConfig,
};
use async_trait::async_trait;
use mockito::{Mock, Server, ServerGuard};
use tempfile::TempDir;

const PAYLOAD: &[u8] = b"fake installer";

/// Publishes the release described by its options, or fails when `fail` is set.
struct FixedHandler {
    state: ProductState,
    release: ProductState,
    fail: bool,
}

impl FixedHandler {
    fn from_options(options: &HandlerOptions) -> Result<Box<dyn ProductHandler>, HandlerError> {
        let text = |key: &str| {
            options
                .get(key)
                .and_then(toml::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let release = ProductState {
            name: text("name"),
            display_name: format!("{} {}", text("name"), text("version")),
            version: text("version"),
            location: text("location"),
            silent_inst_args: "/S".to_string(),
            ..ProductState::default()
        };
        Ok(Box::new(Self {
            state: ProductState::default(),
            release,
            fail: options
                .get("fail")
                .and_then(toml::Value::as_bool)
                .unwrap_or(false),
        }))
    }
}

#[async_trait]
impl ProductHandler for FixedHandler {
    fn state(&self) -> &ProductState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ProductState {
        &mut self.state
    }

    async fn fetch_origin(
        &mut self,
        _ctx: &HandlerContext<'_>,
        _prior_version: Option<&str>,
    ) -> Result<(), HandlerError> {
        if self.fail {
            return Err(HandlerError::Io(std::io::Error::other("feed unreachable")));
        }
        self.state = self.release.clone();
        Ok(())
    }
}

struct TestContext {
    store: TempDir,
    server: ServerGuard,
    _installers: Vec<Mock>,
}

impl TestContext {
    async fn new() -> Self {
        let mut server = Server::new_async().await;
        let mut installers = Vec::new();
        for path in ["/a.msi", "/b.msi", "/c.msi"] {
            let mock = server
                .mock("GET", path)
                .with_header("content-type", "application/octet-stream")
                .with_body(PAYLOAD)
                .create_async()
                .await;
            installers.push(mock);
        }
        Self {
            store: TempDir::new().expect("failed to create temp dir"),
            server,
            _installers: installers,
        }
    }

    fn store(&self) -> &Path {
        self.store.path()
    }

    fn product(&self, id: &str, version: &str, fail: bool) -> String {
        format!(
            "[products.{id}]\nhandler = \"fixed\"\nset = \"office\"\n\
             options = {{ name = \"{id}\", version = \"{version}\", location = \"{}/{id}.msi\", fail = {fail} }}\n",
            self.server.url()
        )
    }

    fn tracker(&self, products: &str) -> Tracker {
        let text = format!(
            "[core]\nstore = {:?}\n\n[sets]\noffice = [\"office\", \"all\"]\n\n{products}",
            self.store().display().to_string()
        );
        let config = TrackerConfig::from_toml(&text).unwrap();
        let mut registry = HandlerRegistry::with_builtin();
        registry.register("fixed", FixedHandler::from_options);
        Tracker::new(config, registry).unwrap()
    }

    fn three_products(&self, b_fails: bool) -> Tracker {
        let products = [
            self.product("a", "1.0.0", false),
            self.product("b", "1.0.0", b_fails),
            self.product("c", "2.0.0", false),
        ]
        .concat();
        self.tracker(&products)
    }
}

fn id(s: &str) -> ProductId {
    ProductId::new(s)
}

#[tokio::test]
async fn failing_product_does_not_stop_the_others() {
    let ctx = TestContext::new().await;
    let tracker = ctx.three_products(true);

    let summary = tracker.pull().await.unwrap();
    assert!(!summary.is_success());
    assert_eq!(summary.updated, [id("a"), id("c")]);
    assert!(summary.is_failed(&id("b")));
    assert!(summary.failed[0].1.contains("feed unreachable"));

    let catalog = tracker.store().load().unwrap();
    assert_eq!(catalog.entry(&id("a")).unwrap().pulled.as_ref().unwrap().version, "1.0.0");
    assert_eq!(catalog.entry(&id("c")).unwrap().pulled.as_ref().unwrap().version, "2.0.0");
    assert!(catalog.entry(&id("b")).is_none());
}

#[tokio::test]
async fn fetch_then_approve_moves_slots_forward() {
    let ctx = TestContext::new().await;
    let tracker = ctx.three_products(false);

    tracker.pull().await.unwrap();
    let fetch = tracker.fetch().await.unwrap();
    assert!(fetch.is_success());
    assert_eq!(fetch.updated.len(), 3);

    let catalog = tracker.store().load().unwrap();
    let entry = catalog.entry(&id("a")).unwrap();
    assert!(entry.pulled.is_none());
    let fetched = entry.fetched.as_ref().unwrap();
    let installer = ctx.store().join("a").join("a_v1.0.0_unified.msi");
    assert_eq!(Path::new(&fetched.installer), installer);
    assert_eq!(std::fs::read(&installer).unwrap(), PAYLOAD);
    assert_eq!(fetched.file_size, PAYLOAD.len() as i64);
    assert_eq!(fetched.secure_hash.as_ref().unwrap().algorithm(), "sha1");

    // rejected versions stay where they are
    let rejected = tracker.approve(&mut RejectAll).unwrap();
    assert_eq!(rejected.unchanged.len(), 3);
    let catalog = tracker.store().load().unwrap();
    assert!(catalog.entry(&id("a")).unwrap().fetched.is_some());
    assert!(catalog.approved(&id("a")).is_none());

    // approve only "c"
    let candidate = catalog.entry(&id("c")).unwrap().fetched.clone().unwrap();
    let mut only_c = |product: &ProductId, _: &ProductState| product.as_str() == "c";
    let approved = tracker.approve(&mut only_c).unwrap();
    assert_eq!(approved.updated, [id("c")]);

    let catalog = tracker.store().load().unwrap();
    let c = catalog.entry(&id("c")).unwrap();
    assert!(c.fetched.is_none());
    assert_eq!(c.approved.as_ref(), Some(&candidate));
    assert!(catalog.entry(&id("a")).unwrap().fetched.is_some());
}

#[tokio::test]
async fn approved_version_is_not_pulled_again() {
    let ctx = TestContext::new().await;
    let tracker = ctx.three_products(false);

    let run = tracker.run().await.unwrap();
    assert!(run.is_success());
    assert_eq!(run.phase(Phase::Approve).unwrap().updated.len(), 3);

    let pull = tracker.pull().await.unwrap();
    assert!(pull.updated.is_empty());
    assert_eq!(pull.unchanged.len(), 3);

    // a newer release is found again
    let products = [
        ctx.product("a", "1.1.0", false),
        ctx.product("b", "1.0.0", false),
        ctx.product("c", "2.0.0-rc.1", false),
    ]
    .concat();
    let tracker = ctx.tracker(&products);
    let pull = tracker.pull().await.unwrap();
    assert_eq!(pull.updated, [id("a")]);
}

#[tokio::test]
async fn make_is_idempotent() {
    let ctx = TestContext::new().await;
    let tracker = ctx.three_products(false);
    tracker.run().await.unwrap();

    let office = ctx.store().join("applist-office.txt");
    let all = ctx.store().join("applist-all.txt");
    let first = std::fs::read_to_string(&office).unwrap();
    let lines: Vec<&str> = first.lines().filter(|l| !l.starts_with('#')).collect();
    let all_text = std::fs::read_to_string(&all).unwrap();
    let all_lines: Vec<&str> = all_text.lines().filter(|l| !l.starts_with('#')).collect();
    assert_eq!(lines, all_lines);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("unified;a 1.0.0;1.0.0;"));
    assert!(lines[0].ends_with("a_v1.0.0_unified.msi;/S"));

    std::fs::write(ctx.store().join("applist-obsolete.txt"), "# stale\n").unwrap();
    let make = tracker.make().unwrap();
    assert_eq!(make.updated.len(), 3);
    assert_eq!(std::fs::read_to_string(&office).unwrap(), first);
    assert!(!ctx.store().join("applist-obsolete.txt").exists());
}

#[tokio::test]
async fn disabled_products_are_skipped() {
    let ctx = TestContext::new().await;
    let products = format!(
        "{}enabled = false\n{}",
        ctx.product("a", "1.0.0", false),
        ctx.product("c", "2.0.0", false)
    );
    let tracker = ctx.tracker(&products);

    let pull = tracker.pull().await.unwrap();
    assert_eq!(pull.skipped, [id("a")]);
    assert_eq!(pull.updated, [id("c")]);

    tracker.fetch().await.unwrap();
    let approve = tracker.approve(&mut AutoApprove).unwrap();
    assert_eq!(approve.updated, [id("c")]);
}

#[tokio::test]
async fn failed_fetch_keeps_the_pulled_version() {
    let ctx = TestContext::new().await;
    // nothing is served at /d.msi
    let products = [
        ctx.product("a", "1.0.0", false),
        ctx.product("d", "3.0.0", false),
    ]
    .concat();
    let tracker = ctx.tracker(&products);
    tracker.pull().await.unwrap();

    let fetch = tracker.fetch().await.unwrap();
    assert!(!fetch.is_success());
    assert_eq!(fetch.updated, [id("a")]);
    assert!(fetch.is_failed(&id("d")));
    assert!(fetch.failed[0].1.contains("Retrieval failed"), "{}", fetch.failed[0].1);

    let catalog = tracker.store().load().unwrap();
    let d = catalog.entry(&id("d")).unwrap();
    assert_eq!(d.pulled.as_ref().unwrap().version, "3.0.0");
    assert!(d.fetched.is_none());
    assert!(d.approved.is_none());

    let leftovers: Vec<_> = std::fs::read_dir(ctx.store().join("d"))
        .map(|entries| entries.flatten().map(|e| e.file_name()).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}
