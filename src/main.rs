use customization_studio::addon::{AddonRegistry, FilePreferences};
use customization_studio::catalog::AssetIndex;
use std::path::PathBuf;

fn main() {
    let root = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("addons"));
    let registry = match AddonRegistry::discover(&root) {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("Addon discovery error: {err:?}");
            std::process::exit(2);
        }
    };
    let assets = match AssetIndex::scan(&root) {
        Ok(assets) => assets,
        Err(err) => {
            eprintln!("Asset scan error: {err:?}");
            std::process::exit(2);
        }
    };
    let prefs = FilePreferences::new(root.join("editor_prefs.json"));
    if let Err(err) = customization_studio::run(prefs, registry, assets) {
        eprintln!("Application error: {err:?}");
    }
}
