use crate::addon::Addon;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::slice::Chunks;

/// Widgets per catalog row before the grid wraps.
pub const CATALOG_ROW_WIDTH: usize = 8;

/// One entry of the host's asset registry: where the file lives on disk plus the
/// logical path the author searches against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub absolute_path: PathBuf,
    pub path: String,
}

impl AssetEntry {
    pub fn new(absolute_path: impl Into<PathBuf>, path: impl Into<String>) -> Self {
        Self { absolute_path: absolute_path.into(), path: path.into() }
    }

    fn extension(&self) -> Option<&str> {
        self.absolute_path.extension().and_then(|ext| ext.to_str())
    }
}

/// The already-enumerated asset registry. The studio never adds to it.
#[derive(Debug, Default)]
pub struct AssetIndex {
    entries: Vec<AssetEntry>,
}

impl AssetIndex {
    pub fn from_entries(entries: Vec<AssetEntry>) -> Self {
        Self { entries }
    }

    /// Host-side convenience: walks `root` and registers every file, with logical
    /// paths relative to `root`.
    pub fn scan(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let mut entries = Vec::new();
        scan_into(root, root, &mut entries)?;
        Ok(Self { entries })
    }

    pub fn all(&self) -> &[AssetEntry] {
        &self.entries
    }
}

fn scan_into(root: &Path, dir: &Path, entries: &mut Vec<AssetEntry>) -> Result<()> {
    let listing =
        fs::read_dir(dir).with_context(|| format!("Failed to read asset directory {}", dir.display()))?;
    for entry in listing {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            scan_into(root, &path, entries)?;
        } else {
            let logical = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            entries.push(AssetEntry::new(path, logical));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    All,
    Model,
    Particle,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::All, AssetKind::Model, AssetKind::Particle];

    pub fn label(self) -> &'static str {
        match self {
            AssetKind::All => "All",
            AssetKind::Model => "Model",
            AssetKind::Particle => "Particle",
        }
    }

    /// The one extension this kind admits; `All` admits the whole recognized set.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            AssetKind::All => None,
            AssetKind::Model => Some("vmdl"),
            AssetKind::Particle => Some("vpcf"),
        }
    }
}

pub fn recognized_extension(ext: &str) -> bool {
    AssetKind::ALL.iter().any(|kind| kind.extension() == Some(ext))
}

/// True when the entry's file lives inside the addon's root directory. Purely
/// lexical: the relativized path must not escape upward or remain absolute.
pub fn belongs_to_addon(entry: &AssetEntry, addon: &Addon) -> bool {
    let root = normalize(addon.root());
    let path = normalize(&entry.absolute_path);
    if root.as_os_str().is_empty() {
        return false;
    }
    path.strip_prefix(&root).is_ok()
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}

fn matches_kind(entry: &AssetEntry, kind: AssetKind) -> bool {
    match kind.extension() {
        None => true,
        Some(required) => entry.extension() == Some(required),
    }
}

fn matches_search(entry: &AssetEntry, search: &str) -> bool {
    entry.path.to_ascii_lowercase().contains(&search.to_ascii_lowercase())
}

/// Produces the entries the catalog browser shows, in registry enumeration order.
/// With no addon resolved nothing belongs anywhere, so the result is empty.
pub fn filter_assets<'a>(
    index: &'a AssetIndex,
    addon: Option<&Addon>,
    kind: AssetKind,
    search: &str,
) -> Vec<&'a AssetEntry> {
    let Some(addon) = addon else {
        return Vec::new();
    };
    index
        .all()
        .iter()
        .filter(|entry| belongs_to_addon(entry, addon))
        .filter(|entry| entry.extension().is_some_and(recognized_extension))
        .filter(|entry| matches_kind(entry, kind))
        .filter(|entry| search.is_empty() || matches_search(entry, search))
        .collect()
}

/// Partitions filtered entries into grid rows. Row padding is the renderer's job.
pub fn catalog_rows<'a, 'b>(entries: &'b [&'a AssetEntry]) -> Chunks<'b, &'a AssetEntry> {
    entries.chunks(CATALOG_ROW_WIDTH)
}
