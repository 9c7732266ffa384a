use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Preference key holding the path of the addon picked in the addon manager.
pub const ACTIVE_ADDON_PREF_KEY: &str = "addonmanager.addon";

const ADDON_MANIFEST_NAME: &str = "addon.json";

/// A local addon as the host registry describes it. `path` points at the addon's
/// manifest file; everything the addon owns lives under the manifest's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addon {
    pub path: PathBuf,
    pub title: String,
}

impl Addon {
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self { path: path.into(), title: title.into() }
    }

    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AddonManifest {
    #[serde(default)]
    title: Option<String>,
}

/// The host's addon registry. The studio only queries it; discovery exists so the
/// standalone binary has something to query.
#[derive(Debug, Default)]
pub struct AddonRegistry {
    addons: Vec<Addon>,
}

impl AddonRegistry {
    pub fn from_addons(addons: Vec<Addon>) -> Self {
        Self { addons }
    }

    /// Scans `<dir>/*/addon.json` and registers one addon per readable manifest.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut addons = Vec::new();
        let entries =
            fs::read_dir(dir).with_context(|| format!("Failed to read addon root {}", dir.display()))?;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let manifest_path = entry.path().join(ADDON_MANIFEST_NAME);
            let Ok(bytes) = fs::read(&manifest_path) else {
                continue;
            };
            let manifest: AddonManifest = match serde_json::from_slice(&bytes) {
                Ok(manifest) => manifest,
                Err(err) => {
                    eprintln!("Skipping malformed addon manifest {}: {err:?}", manifest_path.display());
                    continue;
                }
            };
            let title = manifest.title.unwrap_or_else(|| {
                entry.file_name().to_string_lossy().into_owned()
            });
            addons.push(Addon::new(manifest_path, title));
        }
        addons.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Self { addons })
    }

    pub fn all(&self) -> &[Addon] {
        &self.addons
    }

    pub fn find_by_path(&self, path: &Path) -> Option<&Addon> {
        self.addons.iter().find(|addon| addon.path == path)
    }
}

/// Read-only view of the host's process-wide preference store.
pub trait PreferenceSource {
    fn get_string(&self, key: &str) -> Option<String>;
}

/// Preferences backed by a JSON object on disk. Reads go back to the file every
/// time so that changes made by the host between frames are visible to the poll.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferenceSource for FilePreferences {
    fn get_string(&self, key: &str) -> Option<String> {
        let bytes = fs::read(&self.path).ok()?;
        let values: BTreeMap<String, serde_json::Value> = serde_json::from_slice(&bytes).ok()?;
        match values.get(key)? {
            serde_json::Value::String(value) => Some(value.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// In-memory preferences, used by tests and by hosts that push context explicitly.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, String>,
}

impl MemoryPreferences {
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn clear(&mut self, key: &str) {
        self.values.remove(key);
    }
}

impl PreferenceSource for MemoryPreferences {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Resolves the active-addon preference against the registry. Anything short of a
/// known addon (no key, unreadable store, stale path) is "no addon", not an error.
pub fn resolve_active_addon<'a>(
    prefs: &dyn PreferenceSource,
    registry: &'a AddonRegistry,
) -> Option<&'a Addon> {
    let selected = prefs.get_string(ACTIVE_ADDON_PREF_KEY)?;
    registry.find_by_path(Path::new(&selected))
}
