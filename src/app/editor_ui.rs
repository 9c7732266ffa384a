use super::StudioApp;
use crate::catalog::{self, AssetEntry, AssetKind};
use crate::session::{FormBinding, NodeRef, SessionState, ToolSession};

/// Everything the widgets asked for this frame. Drawing never mutates the
/// document; the shell applies these afterwards.
#[derive(Debug, Default)]
pub(super) struct UiRequests {
    pub save: bool,
    pub quit: bool,
    pub select: Option<NodeRef>,
    pub commit: bool,
    pub add_category: bool,
    pub remove_category: Option<usize>,
    pub move_category: Option<(usize, bool)>,
    pub add_part: Option<usize>,
    pub remove_part: Option<(usize, usize)>,
    pub move_part: Option<(usize, usize, bool)>,
    pub kind_changed: bool,
}

pub(super) fn draw(app: &mut StudioApp, ctx: &egui::Context) -> UiRequests {
    let mut requests = UiRequests::default();

    draw_menu_bar(ctx, &mut requests);
    draw_asset_browser(app, ctx, &mut requests);

    match app.sessions.active_mut() {
        Some(session) if session.state() != SessionState::NoProject => {
            draw_category_tree(session, ctx, &mut requests);
            draw_form(session, ctx, &mut requests);
        }
        _ => draw_missing_addon(ctx),
    }

    requests
}

fn draw_menu_bar(ctx: &egui::Context, requests: &mut UiRequests) {
    egui::TopBottomPanel::top("studio_menu_bar").show(ctx, |ui| {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Save").clicked() {
                    requests.save = true;
                    ui.close();
                }
                if ui.button("Quit").clicked() {
                    requests.quit = true;
                    ui.close();
                }
            });
        });
    });
}

fn draw_missing_addon(ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.label("Select an addon in the addon manager");
    });
}

fn draw_category_tree(session: &ToolSession, ctx: &egui::Context, requests: &mut UiRequests) {
    egui::SidePanel::left("studio_category_tree").default_width(250.0).show(ctx, |ui| {
        ui.heading("Categories");
        ui.separator();
        let selection = session.selection();
        let Some(config) = session.config() else {
            return;
        };
        egui::ScrollArea::vertical().show(ui, |ui| {
            for (ci, category) in config.categories.iter().enumerate() {
                ui.horizontal(|ui| {
                    let node = NodeRef::Category(ci);
                    if ui.selectable_label(selection == Some(node), &category.name).clicked() {
                        requests.select = Some(node);
                    }
                    if ui.small_button("↑").clicked() {
                        requests.move_category = Some((ci, true));
                    }
                    if ui.small_button("↓").clicked() {
                        requests.move_category = Some((ci, false));
                    }
                    if ui.small_button("✖").clicked() {
                        requests.remove_category = Some(ci);
                    }
                });
                ui.indent(("category_parts", ci), |ui| {
                    for (pi, part) in category.parts.iter().enumerate() {
                        ui.horizontal(|ui| {
                            let node = NodeRef::Part { category: ci, part: pi };
                            if ui.selectable_label(selection == Some(node), &part.name).clicked() {
                                requests.select = Some(node);
                            }
                            if ui.small_button("↑").clicked() {
                                requests.move_part = Some((ci, pi, true));
                            }
                            if ui.small_button("↓").clicked() {
                                requests.move_part = Some((ci, pi, false));
                            }
                            if ui.small_button("✖").clicked() {
                                requests.remove_part = Some((ci, pi));
                            }
                        });
                    }
                    if ui.small_button("+ Part").clicked() {
                        requests.add_part = Some(ci);
                    }
                });
            }
            ui.separator();
            if ui.button("Add Category").clicked() {
                requests.add_category = true;
            }
        });
    });
}

fn draw_form(session: &mut ToolSession, ctx: &egui::Context, requests: &mut UiRequests) {
    egui::CentralPanel::default().show(ctx, |ui| {
        let Some(binding) = session.binding_mut() else {
            ui.label("Select a category or part to edit it.");
            return;
        };
        match binding {
            FormBinding::Category { name, .. } => {
                ui.heading("Category");
                ui.horizontal(|ui| {
                    ui.label("Name");
                    ui.text_edit_singleline(name);
                });
            }
            FormBinding::Part { name, attributes, .. } => {
                ui.heading("Part");
                ui.horizontal(|ui| {
                    ui.label("Name");
                    ui.text_edit_singleline(name);
                });
                for (key, buffer) in attributes.iter_mut() {
                    ui.horizontal(|ui| {
                        ui.label(key.as_str());
                        ui.text_edit_singleline(buffer);
                    });
                }
            }
        }
        ui.separator();
        if ui.button("Apply").clicked() {
            requests.commit = true;
        }
    });
}

fn draw_asset_browser(app: &mut StudioApp, ctx: &egui::Context, requests: &mut UiRequests) {
    egui::SidePanel::right("studio_asset_browser").default_width(360.0).show(ctx, |ui| {
        ui.heading("Assets");
        egui::ComboBox::from_id_salt("studio_asset_kind")
            .selected_text(app.ui_asset_kind.label())
            .show_ui(ui, |ui| {
                for kind in AssetKind::ALL {
                    if ui.selectable_label(app.ui_asset_kind == kind, kind.label()).clicked() {
                        app.ui_asset_kind = kind;
                        requests.kind_changed = true;
                    }
                }
            });
        ui.horizontal(|ui| {
            ui.label("Filter");
            ui.text_edit_singleline(&mut app.ui_filter_input);
        });
        ui.separator();
        egui::ScrollArea::vertical().show(ui, |ui| {
            let entries: Vec<&AssetEntry> = app.catalog_results.iter().collect();
            for row in catalog::catalog_rows(&entries) {
                ui.horizontal(|ui| {
                    for entry in row {
                        asset_cell(ui, entry);
                    }
                    // trailing flexible spacer so partial rows stay left-aligned
                    ui.add_space(ui.available_width().max(0.0));
                });
            }
        });
    });
}

fn asset_cell(ui: &mut egui::Ui, entry: &AssetEntry) {
    let stem = entry
        .absolute_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.path.clone());
    ui.small_button(stem).on_hover_text(&entry.path);
}
