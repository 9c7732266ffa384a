use crate::addon::Addon;
use crate::customization::CustomizationConfig;
use anyhow::Result;
use std::path::PathBuf;

pub const CONFIG_RELATIVE_PATH: &str = "config/customization.json";

pub fn config_path(addon: &Addon) -> PathBuf {
    addon.root().join(CONFIG_RELATIVE_PATH)
}

/// Loads the addon's customization document. A missing file is an empty document;
/// an unreadable or malformed file is logged and treated the same. Nothing is
/// written in either case, and the caller never sees an error.
pub fn load_config(addon: &Addon) -> CustomizationConfig {
    let path = config_path(addon);
    if !path.exists() {
        return CustomizationConfig::default();
    }
    match CustomizationConfig::load_from_path(&path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Customization config load error: {err:?}. Falling back to an empty document.");
            CustomizationConfig::default()
        }
    }
}

/// Persists the full document to the addon's config path, overwriting whatever is
/// there.
pub fn save_config(addon: &Addon, config: &CustomizationConfig) -> Result<()> {
    config.save_to_path(config_path(addon))
}
