use crate::addon::{AddonRegistry, FilePreferences};
use crate::catalog::{self, AssetEntry, AssetIndex, AssetKind};
use crate::session::{SessionRegistry, SessionState, ToolSession};
use anyhow::{anyhow, Result};

mod editor_ui;

use editor_ui::UiRequests;

const WINDOW_TITLE: &str = "Customization Parts";

/// Boots the studio window and runs the event loop until the author quits.
pub fn run(prefs: FilePreferences, registry: AddonRegistry, assets: AssetIndex) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([1000.0, 650.0]),
        ..Default::default()
    };
    eframe::run_native(
        "customization_studio",
        options,
        Box::new(move |_cc| Ok(Box::new(StudioApp::new(prefs, registry, assets)))),
    )
    .map_err(|err| anyhow!("Event loop execution failed: {err}"))
}

pub struct StudioApp {
    prefs: FilePreferences,
    registry: AddonRegistry,
    assets: AssetIndex,
    sessions: SessionRegistry,

    // UI state
    pub(crate) ui_asset_kind: AssetKind,
    pub(crate) ui_filter_input: String,
    filter_text: String,
    catalog_results: Vec<AssetEntry>,
    title_stale: bool,
}

impl StudioApp {
    pub fn new(prefs: FilePreferences, registry: AddonRegistry, assets: AssetIndex) -> Self {
        let mut app = Self {
            prefs,
            registry,
            assets,
            sessions: SessionRegistry::default(),
            ui_asset_kind: AssetKind::All,
            ui_filter_input: String::new(),
            filter_text: String::new(),
            catalog_results: Vec::new(),
            title_stale: true,
        };
        app.sessions.acquire(&app.prefs, &app.registry);
        app.refresh_catalog();
        app
    }

    fn refresh_catalog(&mut self) {
        let addon = self.sessions.active().and_then(ToolSession::addon);
        let filtered =
            catalog::filter_assets(&self.assets, addon, self.ui_asset_kind, &self.filter_text);
        self.catalog_results = filtered.into_iter().cloned().collect();
    }

    fn window_title(&self) -> String {
        match self.sessions.active().and_then(ToolSession::addon) {
            Some(addon) => format!("{} {WINDOW_TITLE}", addon.title),
            None => WINDOW_TITLE.to_string(),
        }
    }

    /// The per-frame poll: reconcile the active addon against the preference
    /// store and pick up edits to the catalog filter box.
    fn poll(&mut self, ctx: &egui::Context) {
        let mut stale_catalog = false;

        if let Some(session) = self.sessions.active_mut() {
            if session.tick(&self.prefs, &self.registry) {
                stale_catalog = true;
                self.title_stale = true;
            }
            if session.take_focus_request() {
                ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(false));
                ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
            }
        }
        if std::mem::take(&mut self.title_stale) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.window_title()));
        }

        if self.ui_filter_input != self.filter_text {
            self.filter_text = self.ui_filter_input.clone();
            stale_catalog = true;
        }

        if stale_catalog {
            self.refresh_catalog();
        }
    }

    fn process_requests(&mut self, requests: UiRequests, ctx: &egui::Context) {
        if requests.quit {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        if requests.kind_changed {
            self.refresh_catalog();
        }

        let Some(session) = self.sessions.active_mut() else {
            return;
        };
        if session.state() == SessionState::NoProject {
            return;
        }

        if let Some(node) = requests.select {
            session.select(node);
        }
        if requests.commit {
            log_save_error(session.commit());
        }
        if requests.save {
            log_save_error(session.save());
        }
        if requests.add_category {
            log_save_error(session.add_category("New Category"));
        }
        if let Some(index) = requests.remove_category {
            log_save_error(session.remove_category(index));
        }
        if let Some((index, up)) = requests.move_category {
            log_save_error(session.move_category(index, up));
        }
        if let Some(category) = requests.add_part {
            log_save_error(session.add_part(category, "New Part"));
        }
        if let Some((category, index)) = requests.remove_part {
            log_save_error(session.remove_part(category, index));
        }
        if let Some((category, index, up)) = requests.move_part {
            log_save_error(session.move_part(category, index, up));
        }
    }
}

fn log_save_error(result: Result<()>) {
    if let Err(err) = result {
        eprintln!("Customization save error: {err:?}");
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll(ctx);
        let requests = editor_ui::draw(self, ctx);
        self.process_requests(requests, ctx);
    }
}
