use crate::addon::{resolve_active_addon, Addon, AddonRegistry, PreferenceSource};
use crate::customization::{Category, CustomizationConfig, Part};
use crate::store;
use anyhow::{bail, Result};

/// Identity-stable address of a node inside the loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    Category(usize),
    Part { category: usize, part: usize },
}

/// Edit buffers over exactly one bound node. Binding a different node replaces
/// the whole value; nothing is stacked.
#[derive(Debug, Clone, PartialEq)]
pub enum FormBinding {
    Category {
        node: usize,
        name: String,
    },
    Part {
        category: usize,
        part: usize,
        name: String,
        attributes: Vec<(String, String)>,
    },
}

impl FormBinding {
    pub fn bind(config: &CustomizationConfig, node: NodeRef) -> Option<Self> {
        match node {
            NodeRef::Category(index) => {
                let category = config.categories.get(index)?;
                Some(FormBinding::Category { node: index, name: category.name.clone() })
            }
            NodeRef::Part { category, part } => {
                let record = config.categories.get(category)?.parts.get(part)?;
                let attributes = record
                    .attributes
                    .iter()
                    .map(|(key, value)| (key.clone(), attribute_buffer(value)))
                    .collect();
                Some(FormBinding::Part {
                    category,
                    part,
                    name: record.name.clone(),
                    attributes,
                })
            }
        }
    }

    pub fn node(&self) -> NodeRef {
        match self {
            FormBinding::Category { node, .. } => NodeRef::Category(*node),
            FormBinding::Part { category, part, .. } => {
                NodeRef::Part { category: *category, part: *part }
            }
        }
    }
}

fn attribute_buffer(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn attribute_value(buffer: &str) -> serde_json::Value {
    serde_json::from_str(buffer).unwrap_or_else(|_| serde_json::Value::String(buffer.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoProject,
    Loaded,
    Editing,
}

/// One editing session: the resolved addon, its loaded document, and the form
/// binding. All mutation of the document goes through here, and every committed
/// mutation is written to disk before the caller gets control back.
#[derive(Debug, Default)]
pub struct ToolSession {
    addon: Option<Addon>,
    config: Option<CustomizationConfig>,
    binding: Option<FormBinding>,
    revision: u64,
    focus_requested: bool,
}

impl ToolSession {
    pub fn new(prefs: &dyn PreferenceSource, registry: &AddonRegistry) -> Self {
        let mut session = Self::default();
        session.rebuild(prefs, registry);
        session
    }

    /// Re-resolves the addon and reloads its document, dropping whatever was
    /// shown before. Also the path taken when the tool itself is reloaded.
    pub fn rebuild(&mut self, prefs: &dyn PreferenceSource, registry: &AddonRegistry) {
        self.addon = resolve_active_addon(prefs, registry).cloned();
        self.config = self.addon.as_ref().map(store::load_config);
        self.binding = None;
        self.revision += 1;
    }

    /// Per-frame reconciliation: when the preference no longer names the cached
    /// addon, tear down and rebuild. The previous document is discarded unsaved.
    pub fn tick(&mut self, prefs: &dyn PreferenceSource, registry: &AddonRegistry) -> bool {
        let resolved = resolve_active_addon(prefs, registry).map(|addon| addon.path.as_path());
        let cached = self.addon.as_ref().map(|addon| addon.path.as_path());
        if resolved == cached {
            return false;
        }
        self.rebuild(prefs, registry);
        true
    }

    pub fn state(&self) -> SessionState {
        match (&self.addon, &self.binding) {
            (None, _) => SessionState::NoProject,
            (Some(_), None) => SessionState::Loaded,
            (Some(_), Some(_)) => SessionState::Editing,
        }
    }

    pub fn addon(&self) -> Option<&Addon> {
        self.addon.as_ref()
    }

    pub fn config(&self) -> Option<&CustomizationConfig> {
        self.config.as_ref()
    }

    pub fn binding(&self) -> Option<&FormBinding> {
        self.binding.as_ref()
    }

    pub fn binding_mut(&mut self) -> Option<&mut FormBinding> {
        self.binding.as_mut()
    }

    pub fn selection(&self) -> Option<NodeRef> {
        self.binding.as_ref().map(FormBinding::node)
    }

    /// Bumped whenever the visible tree must re-render from the in-memory
    /// document. Never triggers a re-read from disk.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    pub(crate) fn request_focus(&mut self) {
        self.focus_requested = true;
    }

    /// Binds the addressed node into the form, replacing any previous binding.
    /// Returns false when the address does not exist in the document.
    pub fn select(&mut self, node: NodeRef) -> bool {
        let Some(config) = &self.config else {
            return false;
        };
        match FormBinding::bind(config, node) {
            Some(binding) => {
                self.binding = Some(binding);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.binding = None;
    }

    /// Writes the form buffers back into the bound slot, saves, and refreshes.
    /// The node stays bound.
    pub fn commit(&mut self) -> Result<()> {
        let Some(binding) = self.binding.clone() else {
            bail!("No node bound to the form");
        };
        let (_, config) = self.addon_and_config_mut()?;
        match binding {
            FormBinding::Category { node, name } => {
                let Some(category) = config.categories.get_mut(node) else {
                    bail!("Bound category no longer exists");
                };
                category.name = name;
            }
            FormBinding::Part { category, part, name, attributes } => {
                let Some(record) =
                    config.categories.get_mut(category).and_then(|cat| cat.parts.get_mut(part))
                else {
                    bail!("Bound part no longer exists");
                };
                record.name = name;
                record.attributes = attributes
                    .iter()
                    .map(|(key, buffer)| (key.clone(), attribute_value(buffer)))
                    .collect();
            }
        }
        self.persist()
    }

    /// Menu-bar save: persist the document as-is and refresh the tree.
    pub fn save(&mut self) -> Result<()> {
        self.persist()
    }

    pub fn add_category(&mut self, name: &str) -> Result<()> {
        let (_, config) = self.addon_and_config_mut()?;
        config.categories.push(Category::new(name));
        self.persist()
    }

    pub fn remove_category(&mut self, index: usize) -> Result<()> {
        let (_, config) = self.addon_and_config_mut()?;
        if index >= config.categories.len() {
            bail!("Category index {index} out of range");
        }
        config.categories.remove(index);
        self.binding = match self.binding.take() {
            Some(FormBinding::Category { node, .. }) if node == index => None,
            Some(FormBinding::Category { node, name }) if node > index => {
                Some(FormBinding::Category { node: node - 1, name })
            }
            Some(FormBinding::Part { category, .. }) if category == index => None,
            Some(FormBinding::Part { category, part, name, attributes }) if category > index => {
                Some(FormBinding::Part { category: category - 1, part, name, attributes })
            }
            other => other,
        };
        self.persist()
    }

    pub fn move_category(&mut self, index: usize, up: bool) -> Result<()> {
        let (_, config) = self.addon_and_config_mut()?;
        let Some(target) = shifted_index(index, up, config.categories.len()) else {
            return Ok(());
        };
        config.categories.swap(index, target);
        self.binding = self.binding.take().map(|binding| match binding {
            FormBinding::Category { node, name } => FormBinding::Category {
                node: remap_after_swap(node, index, target),
                name,
            },
            FormBinding::Part { category, part, name, attributes } => FormBinding::Part {
                category: remap_after_swap(category, index, target),
                part,
                name,
                attributes,
            },
        });
        self.persist()
    }

    pub fn add_part(&mut self, category: usize, name: &str) -> Result<()> {
        let (_, config) = self.addon_and_config_mut()?;
        let Some(record) = config.categories.get_mut(category) else {
            bail!("Category index {category} out of range");
        };
        record.parts.push(Part::new(name));
        self.persist()
    }

    pub fn remove_part(&mut self, category: usize, index: usize) -> Result<()> {
        let (_, config) = self.addon_and_config_mut()?;
        let Some(record) = config.categories.get_mut(category) else {
            bail!("Category index {category} out of range");
        };
        if index >= record.parts.len() {
            bail!("Part index {index} out of range");
        }
        record.parts.remove(index);
        self.binding = match self.binding.take() {
            Some(FormBinding::Part { category: cat, part, .. }) if cat == category && part == index => {
                None
            }
            Some(FormBinding::Part { category: cat, part, name, attributes })
                if cat == category && part > index =>
            {
                Some(FormBinding::Part { category: cat, part: part - 1, name, attributes })
            }
            other => other,
        };
        self.persist()
    }

    pub fn move_part(&mut self, category: usize, index: usize, up: bool) -> Result<()> {
        let (_, config) = self.addon_and_config_mut()?;
        let Some(record) = config.categories.get_mut(category) else {
            bail!("Category index {category} out of range");
        };
        let Some(target) = shifted_index(index, up, record.parts.len()) else {
            return Ok(());
        };
        record.parts.swap(index, target);
        self.binding = self.binding.take().map(|binding| match binding {
            FormBinding::Part { category: cat, part, name, attributes } if cat == category => {
                FormBinding::Part {
                    category: cat,
                    part: remap_after_swap(part, index, target),
                    name,
                    attributes,
                }
            }
            other => other,
        });
        self.persist()
    }

    fn addon_and_config_mut(&mut self) -> Result<(&Addon, &mut CustomizationConfig)> {
        match (&self.addon, &mut self.config) {
            (Some(addon), Some(config)) => Ok((addon, config)),
            _ => bail!("No addon resolved or customization document loaded"),
        }
    }

    fn persist(&mut self) -> Result<()> {
        match (&self.addon, &self.config) {
            (Some(addon), Some(config)) => store::save_config(addon, config)?,
            _ => bail!("No addon resolved or customization document loaded"),
        }
        self.revision += 1;
        Ok(())
    }
}

fn shifted_index(index: usize, up: bool, len: usize) -> Option<usize> {
    if index >= len {
        return None;
    }
    if up {
        index.checked_sub(1)
    } else {
        let target = index + 1;
        (target < len).then_some(target)
    }
}

fn remap_after_swap(current: usize, from: usize, to: usize) -> usize {
    if current == from {
        to
    } else if current == to {
        from
    } else {
        current
    }
}

/// One-slot session registry. Acquiring while a session is live never creates a
/// second one: the existing session is rebuilt and asked to come to the front,
/// matching what the author expects from re-opening the tool.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slot: Option<ToolSession>,
}

impl SessionRegistry {
    pub fn acquire(
        &mut self,
        prefs: &dyn PreferenceSource,
        registry: &AddonRegistry,
    ) -> &mut ToolSession {
        match &mut self.slot {
            Some(session) => {
                session.rebuild(prefs, registry);
                session.request_focus();
                session
            }
            slot @ None => slot.insert(ToolSession::new(prefs, registry)),
        }
    }

    pub fn active(&self) -> Option<&ToolSession> {
        self.slot.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut ToolSession> {
        self.slot.as_mut()
    }

    /// Drops the live session when its window closes.
    pub fn release(&mut self) {
        self.slot = None;
    }
}
