use customization_studio::addon::{
    Addon, AddonRegistry, MemoryPreferences, ACTIVE_ADDON_PREF_KEY,
};
use customization_studio::customization::{Category, CustomizationConfig, Part};
use customization_studio::session::{FormBinding, NodeRef, SessionRegistry, SessionState};
use customization_studio::store;
use std::path::Path;
use tempfile::{tempdir, TempDir};

struct Fixture {
    _dir: TempDir,
    registry: AddonRegistry,
    prefs: MemoryPreferences,
}

impl Fixture {
    fn with_addons(names: &[&str]) -> Self {
        let dir = tempdir().unwrap();
        let addons = names
            .iter()
            .map(|name| {
                let root = dir.path().join(name);
                std::fs::create_dir_all(&root).unwrap();
                Addon::new(root.join("addon.json"), *name)
            })
            .collect();
        Self { _dir: dir, registry: AddonRegistry::from_addons(addons), prefs: MemoryPreferences::default() }
    }

    fn activate(&mut self, name: &str) {
        let addon = self
            .registry
            .all()
            .iter()
            .find(|addon| addon.title == name)
            .expect("fixture addon")
            .clone();
        self.prefs.set(ACTIVE_ADDON_PREF_KEY, addon.path.to_string_lossy());
    }

    fn addon(&self, name: &str) -> &Addon {
        self.registry.all().iter().find(|addon| addon.title == name).expect("fixture addon")
    }
}

fn disk_config(addon: &Addon) -> CustomizationConfig {
    store::load_config(addon)
}

#[test]
fn acquire_resolves_the_active_addon_and_loads_its_document() {
    let mut fx = Fixture::with_addons(&["foo"]);
    fx.activate("foo");

    let mut sessions = SessionRegistry::default();
    let session = sessions.acquire(&fx.prefs, &fx.registry);
    assert_eq!(session.state(), SessionState::Loaded);
    assert_eq!(session.addon().map(|a| a.title.as_str()), Some("foo"));
    assert_eq!(session.config(), Some(&CustomizationConfig::default()));
}

#[test]
fn acquiring_while_alive_reuses_and_refocuses_the_session() {
    let mut fx = Fixture::with_addons(&["foo"]);
    fx.activate("foo");

    let mut sessions = SessionRegistry::default();
    let first_revision = sessions.acquire(&fx.prefs, &fx.registry).revision();

    let session = sessions.acquire(&fx.prefs, &fx.registry);
    assert!(session.take_focus_request());
    assert!(session.revision() > first_revision);
    assert_eq!(session.state(), SessionState::Loaded);
    assert!(sessions.active().is_some());
}

#[test]
fn without_a_preference_the_session_is_projectless() {
    let fx = Fixture::with_addons(&["foo"]);
    let mut sessions = SessionRegistry::default();
    let session = sessions.acquire(&fx.prefs, &fx.registry);
    assert_eq!(session.state(), SessionState::NoProject);
    assert!(session.config().is_none());

    assert!(session.save().is_err());
    assert!(session.add_category("Hats").is_err());
    assert!(session.commit().is_err());
}

#[test]
fn tick_rebuilds_when_the_preference_changes() {
    let mut fx = Fixture::with_addons(&["foo", "bar"]);
    fx.activate("foo");

    let mut sessions = SessionRegistry::default();
    let session = sessions.acquire(&fx.prefs, &fx.registry);
    session.add_category("Hats").unwrap();
    assert!(session.select(NodeRef::Category(0)));
    assert_eq!(session.state(), SessionState::Editing);

    assert!(!session.tick(&fx.prefs, &fx.registry));

    fx.activate("bar");
    assert!(session.tick(&fx.prefs, &fx.registry));
    assert_eq!(session.addon().map(|a| a.title.as_str()), Some("bar"));
    assert_eq!(session.state(), SessionState::Loaded);
    assert_eq!(session.config(), Some(&CustomizationConfig::default()));

    // foo keeps whatever was last persisted to it
    let foo = fx.addon("foo").clone();
    assert_eq!(disk_config(&foo).categories.len(), 1);
}

#[test]
fn tick_drops_to_projectless_when_the_preference_clears() {
    let mut fx = Fixture::with_addons(&["foo"]);
    fx.activate("foo");

    let mut sessions = SessionRegistry::default();
    let session = sessions.acquire(&fx.prefs, &fx.registry);
    assert_eq!(session.state(), SessionState::Loaded);

    fx.prefs.clear(ACTIVE_ADDON_PREF_KEY);
    assert!(session.tick(&fx.prefs, &fx.registry));
    assert_eq!(session.state(), SessionState::NoProject);
}

#[test]
fn structure_edits_are_immediately_durable() {
    let mut fx = Fixture::with_addons(&["foo"]);
    fx.activate("foo");
    let addon = fx.addon("foo").clone();

    let mut sessions = SessionRegistry::default();
    let session = sessions.acquire(&fx.prefs, &fx.registry);

    session.add_category("Hats").unwrap();
    session.add_part(0, "Red Cap").unwrap();
    let on_disk = disk_config(&addon);
    assert_eq!(on_disk.categories[0].name, "Hats");
    assert_eq!(on_disk.categories[0].parts[0].name, "Red Cap");

    session.add_category("Trails").unwrap();
    session.move_category(1, true).unwrap();
    assert_eq!(disk_config(&addon).categories[0].name, "Trails");

    session.remove_category(0).unwrap();
    let on_disk = disk_config(&addon);
    assert_eq!(on_disk.categories.len(), 1);
    assert_eq!(on_disk.categories[0].name, "Hats");
}

#[test]
fn commit_writes_form_buffers_back_into_the_same_slot() {
    let mut fx = Fixture::with_addons(&["foo"]);
    fx.activate("foo");
    let addon = fx.addon("foo").clone();

    // seed a document with attributes before the session loads it
    let mut part = Part::new("Red Cap");
    part.attributes.insert("model".into(), serde_json::json!("models/cap_red.vmdl"));
    part.attributes.insert("cost".into(), serde_json::json!(250));
    let mut hats = Category::new("Hats");
    hats.parts.push(part);
    store::save_config(&addon, &CustomizationConfig { categories: vec![hats] }).unwrap();

    let mut sessions = SessionRegistry::default();
    let session = sessions.acquire(&fx.prefs, &fx.registry);
    assert!(session.select(NodeRef::Part { category: 0, part: 0 }));
    let revision = session.revision();

    match session.binding_mut().expect("part bound") {
        FormBinding::Part { name, attributes, .. } => {
            *name = "Crimson Cap".to_string();
            for (key, buffer) in attributes.iter_mut() {
                match key.as_str() {
                    "model" => *buffer = "models/cap_crimson.vmdl".to_string(),
                    "cost" => *buffer = "300".to_string(),
                    _ => {}
                }
            }
        }
        other => panic!("expected part binding, got {other:?}"),
    }
    session.commit().unwrap();

    // still bound to the same node after the save/refresh cycle
    assert_eq!(session.state(), SessionState::Editing);
    assert_eq!(session.selection(), Some(NodeRef::Part { category: 0, part: 0 }));
    assert!(session.revision() > revision);

    let on_disk = disk_config(&addon);
    let part = &on_disk.categories[0].parts[0];
    assert_eq!(part.name, "Crimson Cap");
    assert_eq!(part.attributes["model"], serde_json::json!("models/cap_crimson.vmdl"));
    assert_eq!(part.attributes["cost"], serde_json::json!(300));
}

#[test]
fn selecting_another_node_replaces_the_binding() {
    let mut fx = Fixture::with_addons(&["foo"]);
    fx.activate("foo");

    let mut sessions = SessionRegistry::default();
    let session = sessions.acquire(&fx.prefs, &fx.registry);
    session.add_category("Hats").unwrap();
    session.add_part(0, "Red Cap").unwrap();

    assert!(session.select(NodeRef::Category(0)));
    assert!(session.select(NodeRef::Part { category: 0, part: 0 }));
    assert_eq!(session.selection(), Some(NodeRef::Part { category: 0, part: 0 }));

    assert!(!session.select(NodeRef::Category(3)));
    session.clear_selection();
    assert_eq!(session.state(), SessionState::Loaded);
}

#[test]
fn removals_and_moves_keep_the_selection_coherent() {
    let mut fx = Fixture::with_addons(&["foo"]);
    fx.activate("foo");

    let mut sessions = SessionRegistry::default();
    let session = sessions.acquire(&fx.prefs, &fx.registry);
    session.add_category("Hats").unwrap();
    session.add_category("Trails").unwrap();

    // selection follows a moved category
    assert!(session.select(NodeRef::Category(1)));
    session.move_category(1, true).unwrap();
    assert_eq!(session.selection(), Some(NodeRef::Category(0)));

    // selection shifts down when an earlier category is removed
    assert!(session.select(NodeRef::Category(1)));
    session.remove_category(0).unwrap();
    assert_eq!(session.selection(), Some(NodeRef::Category(0)));

    // removing the selected node clears the form
    session.remove_category(0).unwrap();
    assert_eq!(session.state(), SessionState::Loaded);
}

#[test]
fn addon_paths_resolve_by_equality() {
    let fx = Fixture::with_addons(&["foo", "bar"]);
    let foo = fx.addon("foo");
    assert_eq!(fx.registry.find_by_path(&foo.path).map(|a| a.title.as_str()), Some("foo"));
    assert!(fx.registry.find_by_path(Path::new("/nowhere/addon.json")).is_none());
}
