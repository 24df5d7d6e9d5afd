pub mod activity;
pub mod config;
pub mod init;
pub mod rule;
pub mod schedule;
pub mod selection;

use anyhow::Context;
use drip_core::{
    config::DripConfig,
    paths,
    store::{ActivityCatalog, DripDb},
    Calendar, DripRelease,
};
use std::path::Path;

/// Stores and settings of one initialized project directory.
pub struct Project {
    pub config: DripConfig,
    pub calendar: Calendar,
    pub catalog: ActivityCatalog,
    pub db: DripDb,
}

impl Project {
    /// Open the project at `root`. `tz` overrides the configured time zone.
    pub fn open(root: &Path, tz: Option<&str>) -> anyhow::Result<Self> {
        let config = DripConfig::load(root).context("failed to load config")?;
        let zone = tz.unwrap_or(&config.timezone);
        let calendar = Calendar::from_name(zone)?;
        let db = DripDb::open(&paths::db_path(root)).context("failed to open drip.db")?;
        let catalog = ActivityCatalog::open(root);
        tracing::debug!(root = %root.display(), timezone = zone, "project opened");
        Ok(Self {
            config,
            calendar,
            catalog,
            db,
        })
    }

    pub fn release(&self) -> DripRelease<'_> {
        DripRelease::new(&self.catalog, &self.db, &self.db, &self.catalog, self.calendar)
    }
}
