use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DRIP_DIR: &str = ".drip";

pub const CONFIG_FILE: &str = ".drip/config.yaml";
pub const CATALOG_FILE: &str = ".drip/activities.yaml";
pub const DB_FILE: &str = ".drip/drip.db";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn drip_dir(root: &Path) -> PathBuf {
    root.join(DRIP_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn catalog_path(root: &Path) -> PathBuf {
    root.join(CATALOG_FILE)
}

pub fn db_path(root: &Path) -> PathBuf {
    root.join(DB_FILE)
}
