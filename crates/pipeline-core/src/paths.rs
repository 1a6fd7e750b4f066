use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PIPELINE_DIR: &str = ".pipeline";

pub const CONFIG_FILE: &str = ".pipeline/config.yaml";
pub const STORE_FILE: &str = ".pipeline/opportunities.yaml";
pub const STORE_LOCK_FILE: &str = ".pipeline/opportunities.lock";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn pipeline_dir(root: &Path) -> PathBuf {
    root.join(PIPELINE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn store_path(root: &Path) -> PathBuf {
    root.join(STORE_FILE)
}

pub fn store_lock_path(root: &Path) -> PathBuf {
    root.join(STORE_LOCK_FILE)
}
