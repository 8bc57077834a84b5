use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::catalog::InMemoryCatalog;
use crate::cli::Cli;
use crate::config::Config;
use crate::error::{PrepError, Result};
use crate::search::SearchEngine;

/// Everything a command needs: configuration, the engine over the loaded
/// catalog and a runtime to drive it.
pub struct AppContext {
    pub engine: SearchEngine<InMemoryCatalog>,
    pub robot: bool,
    pub cancel: CancellationToken,
    runtime: Runtime,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let config = Config::load(cli.config.as_deref(), &cwd)?;
        let catalog_path = cli.catalog.as_deref().ok_or_else(|| {
            PrepError::Config("no catalog given: pass --catalog or set PREPCAT_CATALOG".to_string())
        })?;
        Self::new(config, catalog_path, cli.robot)
    }

    pub fn new(config: Config, catalog_path: &Path, robot: bool) -> Result<Self> {
        let catalog = InMemoryCatalog::from_json_file(catalog_path)?;
        debug!(
            catalog = %catalog_path.display(),
            cache = config.cache.enabled,
            "context ready"
        );
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        Ok(Self {
            engine: SearchEngine::new(Arc::new(catalog), config),
            robot,
            cancel: CancellationToken::new(),
            runtime,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        self.engine.config()
    }

    /// Drive one engine call to completion.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
