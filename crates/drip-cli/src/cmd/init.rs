use anyhow::Context;
use drip_core::{config::DripConfig, io, paths, store::DripDb, Calendar};
use std::path::Path;

const EMPTY_CATALOG: &str = "activities: []\n";

pub fn run(root: &Path, timezone: Option<&str>) -> anyhow::Result<()> {
    println!("Initializing drip release in: {}", root.display());

    let mut config = DripConfig::default();
    if let Some(tz) = timezone {
        Calendar::from_name(tz)?;
        config.timezone = tz.to_string();
    }
    let data = serde_yaml::to_string(&config)?;
    report(
        io::seed_file(&paths::config_path(root), data.as_bytes())
            .context("failed to write config.yaml")?,
        paths::CONFIG_FILE,
    );
    report(
        io::seed_file(&paths::catalog_path(root), EMPTY_CATALOG.as_bytes())
            .context("failed to write activities.yaml")?,
        paths::CATALOG_FILE,
    );

    DripDb::open(&paths::db_path(root)).context("failed to open drip.db")?;
    println!("  ready:   {}", paths::DB_FILE);
    Ok(())
}

fn report(created: bool, file: &str) {
    if created {
        println!("  created: {file}");
    } else {
        println!("  exists:  {file}");
    }
}
