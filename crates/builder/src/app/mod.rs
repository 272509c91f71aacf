//! Main application module

mod keyboard;
mod menus;
mod styles;

use std::path::PathBuf;

use eframe::egui;

use crate::render::HeadlessBackend;
use crate::state::{AppSettings, Editor, PanelVisibility};
use crate::texture::TextureQueue;
use crate::ui::{properties, status_bar, toolbar, welcome};
use crate::viewport::{ArcBallCamera, ViewportPanel};

/// Everything the panels read and write
pub struct AppState {
    pub editor: Editor<ArcBallCamera>,
    pub panels: PanelVisibility,
    /// Last status message from a file operation
    pub notice: Option<String>,
    pub show_settings: bool,
}

impl AppState {
    fn new(settings: AppSettings) -> Self {
        let camera = ArcBallCamera::from_settings(&settings.camera);
        let panels = PanelVisibility {
            welcome: settings.ui.show_welcome,
            ..PanelVisibility::default()
        };
        Self {
            editor: Editor::new(
                Box::new(HeadlessBackend::new()),
                TextureQueue::threaded(),
                camera,
                settings,
            ),
            panels,
            notice: None,
            show_settings: false,
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.editor.settings
    }
}

/// Main application
pub struct BuilderApp {
    state: AppState,
    viewport: ViewportPanel,
    /// Last applied font size (to detect changes)
    last_font_size: f32,
}

impl BuilderApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial_scene: Option<PathBuf>) -> Self {
        let mut state = AppState::new(AppSettings::load());

        if let Some(path) = initial_scene {
            menus::import_from(&mut state, &path);
        }

        styles::configure_styles(&cc.egui_ctx, state.settings().ui.font_size);
        let last_font_size = state.settings().ui.font_size;

        Self {
            state,
            viewport: ViewportPanel::new(),
            last_font_size,
        }
    }
}

impl eframe::App for BuilderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let font_size = self.state.settings().ui.font_size;
        if font_size != self.last_font_size {
            styles::apply_font_size(ctx, font_size);
            self.last_font_size = font_size;
        }

        // Finished texture decodes land here
        if self.state.editor.poll() > 0 {
            ctx.request_repaint();
        }
        if self.state.editor.textures.pending() > 0 {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }

        keyboard::handle_keyboard(ctx, &mut self.state);

        // ── Menu bar ──────────────────────────────────────────
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                menus::file_menu(ui, &mut self.state);
                menus::view_menu(ui, &mut self.state, &mut self.viewport);
                menus::help_menu(ui, &mut self.state);
            });
        });

        // ── Toolbar ───────────────────────────────────────────
        if self.state.panels.toolbar {
            egui::TopBottomPanel::top("toolbar")
                .frame(
                    egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(8, 4)),
                )
                .show(ctx, |ui| {
                    toolbar::show(ui, &mut self.state);
                });
        }

        // ── Status bar ───────────────────────────────────────
        if self.state.panels.status_bar {
            egui::TopBottomPanel::bottom("status_bar")
                .exact_height(22.0)
                .frame(
                    egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(8, 2)),
                )
                .show(ctx, |ui| {
                    status_bar::show(ui, &self.state);
                });
        }

        // ── Right panel: Inspector ───────────────────────────
        if self.state.panels.inspector {
            egui::SidePanel::right("inspector")
                .default_width(250.0)
                .width_range(200.0..=400.0)
                .resizable(true)
                .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::same(6)))
                .show(ctx, |ui| {
                    properties::show(ui, &mut self.state);
                });
        }

        // ── Windows ──────────────────────────────────────────
        welcome::show(ctx, &mut self.state);
        menus::settings_window(ctx, &mut self.state);

        // ── Central panel: 3D viewport ───────────────────────
        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.viewport.show(ui, &mut self.state);
            });

        // Inspector rebinding already happened; the queue only feeds logging here
        for change in self.state.editor.take_selection_events() {
            tracing::debug!("Selection changed: {change:?}");
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.state.editor.settings.save();
    }
}
