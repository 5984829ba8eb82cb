//! The update-tracking engine.
//!
//! Every configured product moves through `untracked -> pulled -> fetched ->
//! approved`. Each phase walks the products in id order, one at a time, and
//! records its findings in the catalog, which is written once at the end of
//! the phase. A failing product is logged and recorded in the
//! [`PhaseSummary`]; it never stops the other products.

use std::sync::Arc;

use apptrack_schema::{Catalog, ProductId, ProductState};
use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::applist::write_applists;
use crate::approval::{Approver, AutoApprove};
use crate::config::TrackerConfig;
use crate::error::{ProductError, TrackError};
use crate::handler::{HandlerContext, HandlerRegistry, ProductHandler};
use crate::reporter::{NullReporter, Reporter};
use crate::store::CatalogStore;
use crate::summary::{Phase, PhaseSummary, RunSummary};

pub struct Tracker {
    config: TrackerConfig,
    registry: HandlerRegistry,
    store: CatalogStore,
    client: Client,
    reporter: Arc<dyn Reporter>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("store", &self.store)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Tracker {
    /// Validate `config` against `registry` and prepare the store.
    pub fn new(config: TrackerConfig, registry: HandlerRegistry) -> Result<Self, TrackError> {
        config.validate(&registry)?;
        let client = Client::builder().user_agent(crate::USER_AGENT).build()?;
        let store = CatalogStore::new(&config.core.store);
        Ok(Self {
            config,
            registry,
            store,
            client,
            reporter: Arc::new(NullReporter),
        })
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Look for newer versions at the editors.
    pub async fn pull(&self) -> Result<PhaseSummary, TrackError> {
        let mut catalog = self.store.load()?;
        let summary = self.pull_products(&mut catalog).await;
        self.store.save(&mut catalog)?;
        self.finish(&summary);
        Ok(summary)
    }

    /// Download and verify the installers of the pulled versions.
    pub async fn fetch(&self) -> Result<PhaseSummary, TrackError> {
        let mut catalog = self.store.load()?;
        let summary = self.fetch_products(&mut catalog).await;
        self.store.save(&mut catalog)?;
        self.finish(&summary);
        Ok(summary)
    }

    /// Submit every fetched version to `approver`.
    pub fn approve(&self, approver: &mut dyn Approver) -> Result<PhaseSummary, TrackError> {
        let mut catalog = self.store.load()?;
        let summary = self.approve_products(&mut catalog, approver);
        self.store.save(&mut catalog)?;
        self.finish(&summary);
        Ok(summary)
    }

    /// Regenerate the deployment lists from the approved versions.
    pub fn make(&self) -> Result<PhaseSummary, TrackError> {
        let catalog = self.store.load()?;
        let summary = self.make_lists(&catalog)?;
        self.finish(&summary);
        Ok(summary)
    }

    /// Pull, fetch and approve every new version, then regenerate the
    /// deployment lists.
    ///
    /// The catalog is written once, after the three first phases, even when
    /// some products failed.
    pub async fn run(&self) -> Result<RunSummary, TrackError> {
        let mut catalog = self.store.load()?;
        let mut phases = Vec::with_capacity(4);

        let pull = self.pull_products(&mut catalog).await;
        self.finish(&pull);
        phases.push(pull);

        let fetch = self.fetch_products(&mut catalog).await;
        self.finish(&fetch);
        phases.push(fetch);

        let approve = self.approve_products(&mut catalog, &mut AutoApprove);
        self.finish(&approve);
        phases.push(approve);

        self.store.save(&mut catalog)?;

        let make = self.make_lists(&catalog)?;
        self.finish(&make);
        phases.push(make);

        Ok(RunSummary { phases })
    }

    async fn pull_products(&self, catalog: &mut Catalog) -> PhaseSummary {
        let phase = Phase::Pull;
        let mut summary = PhaseSummary::new(phase);
        self.reporter.phase_started(phase, self.config.products.len());

        for (id, product) in &self.config.products {
            if !product.enabled {
                info!("{id}: tracking deactivated");
                summary.skipped.push(id.clone());
                continue;
            }
            match self.pull_product(id, catalog.approved(id)).await {
                Ok(Some(state)) => {
                    info!("{id}: new version found ({})", state.version);
                    if state.parsed_version().is_ok_and(|v| v.is_unstable()) {
                        warn!("{id}: {} is not a stable release", state.version);
                    }
                    self.reporter.section(phase, id, &state);
                    catalog.entry_mut(id).record_pulled(state);
                    summary.updated.push(id.clone());
                }
                Ok(None) => {
                    info!("{id}: no new version");
                    summary.unchanged.push(id.clone());
                }
                Err(e) => {
                    error!("{id}: pull failed: {e}");
                    summary.failed.push((id.clone(), e.to_string()));
                }
            }
        }
        summary
    }

    /// The latest state of a product if it is newer than `approved`.
    async fn pull_product(
        &self,
        id: &ProductId,
        approved: Option<&ProductState>,
    ) -> Result<Option<ProductState>, ProductError> {
        let mut baseline = self.create_handler(id)?;
        if let Some(approved) = approved {
            baseline.load_state(approved);
        }

        let mut origin = self.create_handler(id)?;
        let prior_version = approved.map(|state| state.version.as_str());
        origin.fetch_origin(&self.context(id), prior_version).await?;

        if origin.is_update(baseline.state())? {
            Ok(Some(origin.dump_state()))
        } else {
            debug!(
                "{id}: {} is not an update of {}",
                origin.state().version,
                baseline.state().version
            );
            Ok(None)
        }
    }

    async fn fetch_products(&self, catalog: &mut Catalog) -> PhaseSummary {
        let phase = Phase::Fetch;
        let mut summary = PhaseSummary::new(phase);
        self.reporter.phase_started(phase, self.config.products.len());

        for (id, product) in &self.config.products {
            if !product.enabled {
                info!("{id}: tracking deactivated");
                summary.skipped.push(id.clone());
                continue;
            }
            let Some(pulled) = catalog.entry(id).and_then(|e| e.pulled.clone()) else {
                debug!("{id}: no pulled version to fetch");
                summary.skipped.push(id.clone());
                continue;
            };

            match self.fetch_product(id, &pulled).await {
                Ok(state) => {
                    self.reporter.section(phase, id, &state);
                    catalog.entry_mut(id).record_fetched(state);
                    summary.updated.push(id.clone());
                }
                Err(e) => {
                    error!("{id}: fetch failed: {e}");
                    summary.failed.push((id.clone(), e.to_string()));
                }
            }
        }
        summary
    }

    async fn fetch_product(
        &self,
        id: &ProductId,
        pulled: &ProductState,
    ) -> Result<ProductState, ProductError> {
        let mut handler = self.create_handler(id)?;
        handler.load_state(pulled);
        let dir = self.config.product_dir(id);
        handler.fetch_installer(&self.context(id), &dir).await?;
        Ok(handler.dump_state())
    }

    fn approve_products(&self, catalog: &mut Catalog, approver: &mut dyn Approver) -> PhaseSummary {
        let phase = Phase::Approve;
        let mut summary = PhaseSummary::new(phase);
        self.reporter.phase_started(phase, self.config.products.len());

        for (id, product) in &self.config.products {
            if !product.enabled {
                info!("{id}: tracking deactivated");
                summary.skipped.push(id.clone());
                continue;
            }
            let Some(entry) = catalog.products.get_mut(id) else {
                warn!("{id}: not found in the catalog");
                summary.skipped.push(id.clone());
                continue;
            };
            let Some(candidate) = &entry.fetched else {
                debug!("{id}: no fetched version");
                summary.skipped.push(id.clone());
                continue;
            };

            match approver.approve(id, candidate) {
                Ok(true) => {
                    if let Some(state) = entry.approve() {
                        info!("{id}: version {} approved", state.version);
                        self.reporter.section(phase, id, state);
                    }
                    summary.updated.push(id.clone());
                }
                Ok(false) => {
                    info!("{id}: version {} not approved", candidate.version);
                    summary.unchanged.push(id.clone());
                }
                Err(e) => {
                    let e = ProductError::Approval(e);
                    error!("{id}: {e}");
                    summary.failed.push((id.clone(), e.to_string()));
                }
            }
        }
        summary
    }

    fn make_lists(&self, catalog: &Catalog) -> Result<PhaseSummary, TrackError> {
        self.reporter
            .phase_started(Phase::Make, self.config.products.len());
        write_applists(&self.config, catalog, self.reporter.as_ref())
    }

    fn create_handler(&self, id: &ProductId) -> Result<Box<dyn ProductHandler>, ProductError> {
        let options = self
            .config
            .product(id)
            .map(|p| p.options.clone())
            .unwrap_or_default();
        Ok(self
            .registry
            .create(self.config.handler_name(id), &options)?)
    }

    fn context<'a>(&'a self, id: &'a ProductId) -> HandlerContext<'a> {
        HandlerContext {
            client: &self.client,
            product: id,
            reporter: self.reporter.as_ref(),
            timeout: self.config.timeout(),
        }
    }

    fn finish(&self, summary: &PhaseSummary) {
        info!("{summary}");
        self.reporter.phase_finished(summary);
        if let Err(e) = self.reporter.publish(summary.phase) {
            error!("Failed to publish the {} report: {e:#}", summary.phase);
        }
    }
}
