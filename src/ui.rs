use crate::config::{Config, MAX_BEAMS, MIN_BEAMS};
use crate::panel::{
    BackendStatus, Command, CopyIcon, Event, ExampleList, ModalTarget, TranslationPanel, CHAR_BUDGET,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::{Color32, RichText};
use egui_phosphor::regular as icons;
use once_cell::sync::OnceCell;
use std::fs;
use std::sync::Arc;
use std::time::Instant;

const TITLE: &str = "EN→HI Public Notice Translator";

const MUTED: Color32 = Color32::from_rgb(0x64, 0x74, 0x8b);
const WARNING: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);
const CONFIRMED: Color32 = Color32::from_rgb(0x10, 0xb9, 0x81);

#[cfg(windows)]
const FONT_CANDIDATES: &[&str] = &[
    r"C:\Windows\Fonts\Nirmala.ttf",
    r"C:\Windows\Fonts\NirmalaS.ttf",
    r"C:\Windows\Fonts\mangal.ttf",
];
#[cfg(target_os = "macos")]
const FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/Supplemental/DevanagariMT.ttc",
    "/System/Library/Fonts/Kohinoor.ttc",
];
#[cfg(not(any(windows, target_os = "macos")))]
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoSansDevanagari-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansDevanagari-Regular.ttf",
    "/usr/share/fonts/google-noto/NotoSansDevanagari-Regular.ttf",
    "/usr/share/fonts/truetype/lohit-devanagari/Lohit-Devanagari.ttf",
];

fn install_fonts(ctx: &egui::Context, configured: Option<&str>) {
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);

    let mut loaded = None;
    for path in configured.into_iter().chain(FONT_CANDIDATES.iter().copied()) {
        if let Ok(bytes) = fs::read(path) {
            tracing::info!("Loaded Devanagari font: {}", path);
            loaded = Some(bytes);
            break;
        }
    }
    match loaded {
        Some(bytes) => {
            fonts.font_data.insert("devanagari".to_owned(), egui::FontData::from_owned(bytes));
            // After the default Latin faces so English text keeps its usual look.
            for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
                fonts.families.entry(family).or_default().push("devanagari".to_owned());
            }
        }
        None => tracing::warn!("No Devanagari font found; Hindi text may render as boxes"),
    }
    ctx.set_fonts(fonts);
}

// Keyboard focus is dropped so the input behind an alert can't take keystrokes.
fn hold_focus_for_alert(ctx: &egui::Context, alerting: bool) {
    if !alerting {
        return;
    }
    if let Some(id) = ctx.memory(|m| m.focused()) {
        ctx.memory_mut(|m| m.surrender_focus(id));
    }
}

pub struct PanelApp {
    panel: TranslationPanel,
    commands: Sender<Command>,
    events: Receiver<Event>,
}

impl PanelApp {
    pub fn new(cfg: &Config, commands: Sender<Command>, events: Receiver<Event>) -> Self {
        let app = Self { panel: TranslationPanel::new(cfg), commands, events };
        app.dispatch(Some(app.panel.startup()));
        app
    }

    fn dispatch(&self, cmd: Option<Command>) {
        if let Some(cmd) = cmd {
            if self.commands.send(cmd).is_err() {
                tracing::error!("Worker stopped; command dropped");
            }
        }
    }

    fn input_section(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("English").strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let counter = self.panel.char_counter();
                let color = if counter.warning { WARNING } else { MUTED };
                ui.label(RichText::new(counter.text()).color(color));
            });
        });
        ui.add(
            egui::TextEdit::multiline(self.panel.input_mut())
                .hint_text(format!("Enter English text (up to {} characters)...", CHAR_BUDGET))
                .desired_rows(7)
                .desired_width(f32::INFINITY),
        );
    }

    fn controls(&mut self, ui: &mut egui::Ui) -> Option<Command> {
        let mut cmd = None;
        ui.horizontal(|ui| {
            ui.add(egui::Slider::new(self.panel.num_beams_mut(), MIN_BEAMS..=MAX_BEAMS).text("Beam width"));
            ui.checkbox(self.panel.preserve_numbers_mut(), "Preserve numbers");
        });
        ui.horizontal(|ui| {
            let busy = self.panel.is_busy();
            if ui.add_enabled(!busy, egui::Button::new(self.panel.submit_label())).clicked() {
                cmd = self.panel.submit();
            }
            if busy {
                ui.add(egui::Spinner::new());
            }
            if ui.button(format!("{} Clear", icons::TRASH)).clicked() {
                self.panel.clear();
            }
        });
        cmd
    }

    fn output_section(&mut self, ui: &mut egui::Ui, now: Instant) -> Option<Command> {
        let mut cmd = None;
        ui.horizontal(|ui| {
            ui.label(RichText::new("Hindi").strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let (glyph, tint) = match self.panel.copy_icon(now) {
                    CopyIcon::Copy => (icons::COPY, None),
                    CopyIcon::Confirmed => (icons::CHECK, Some(CONFIRMED)),
                };
                let mut text = RichText::new(glyph).size(18.0);
                if let Some(color) = tint {
                    text = text.color(color);
                }
                if ui.add(egui::Button::new(text).frame(false)).on_hover_text("Copy translation").clicked() {
                    cmd = self.panel.copy();
                }
            });
        });

        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_min_height(120.0);
            ui.set_width(ui.available_width());
            let output = self.panel.output();
            let text = if output.has_translation {
                RichText::new(&output.text).size(18.0)
            } else {
                RichText::new(&output.text).color(MUTED)
            };
            ui.add(egui::Label::new(text).wrap(true));
        });
        cmd
    }

    fn metadata_section(&self, ui: &mut egui::Ui) {
        let Some(meta) = self.panel.metadata() else {
            return;
        };
        ui.add_space(6.0);
        egui::Grid::new("metadata").num_columns(2).spacing([12.0, 4.0]).show(ui, |ui| {
            ui.label("Confidence");
            ui.add(
                egui::ProgressBar::new(meta.bar_fraction())
                    .desired_width(220.0)
                    .text(meta.confidence_text()),
            );
            ui.end_row();
            ui.label("Input");
            ui.label(&meta.input_words);
            ui.end_row();
            ui.label("Output");
            ui.label(&meta.output_words);
            ui.end_row();
            ui.label("Device");
            ui.label(&meta.device);
            ui.end_row();
        });
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        let text = match self.panel.backend_status() {
            BackendStatus::Unknown => RichText::new("Backend: checking...").color(MUTED),
            BackendStatus::Healthy(h) => {
                RichText::new(format!("Backend: {} · {} · {}", h.status, h.model, h.device)).color(MUTED)
            }
            BackendStatus::Unreachable(e) => RichText::new(format!("Backend unreachable: {}", e)).color(WARNING),
        };
        ui.label(text);
    }

    /// Dimmed full-screen layer under a modal. Returns whether it was clicked.
    fn backdrop(ctx: &egui::Context, id: &str, order: egui::Order) -> bool {
        let screen = ctx.screen_rect();
        egui::Area::new(egui::Id::new(id))
            .order(order)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                let resp = ui.allocate_rect(screen, egui::Sense::click());
                ui.painter().rect_filled(screen, 0.0, Color32::from_black_alpha(140));
                resp.clicked()
            })
            .inner
    }

    fn examples_modal(&mut self, ctx: &egui::Context) -> Option<Command> {
        if !self.panel.examples_open() {
            return None;
        }
        if Self::backdrop(ctx, "examples_backdrop", egui::Order::Middle) {
            self.panel.modal_clicked(ModalTarget::Backdrop);
            return None;
        }

        let mut picked = None;
        let mut close = false;
        egui::Area::new(egui::Id::new("examples_modal"))
            .order(egui::Order::Foreground)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                egui::Frame::window(&ctx.style()).show(ui, |ui| {
                    ui.set_width(480.0);
                    ui.horizontal(|ui| {
                        ui.heading("Example phrases");
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            close = ui.add(egui::Button::new(icons::X).frame(false)).clicked();
                        });
                    });
                    ui.separator();
                    egui::ScrollArea::vertical().max_height(360.0).show(ui, |ui| {
                        match self.panel.examples() {
                            ExampleList::NotLoaded => {
                                ui.add(egui::Spinner::new());
                            }
                            ExampleList::Failed => {
                                ui.label("Failed to load examples");
                            }
                            ExampleList::Loaded(list) => {
                                for (i, example) in list.iter().enumerate() {
                                    let frame = egui::Frame::group(ui.style()).show(ui, |ui| {
                                        ui.set_width(ui.available_width());
                                        ui.label(RichText::new(&example.english).strong());
                                        ui.label(RichText::new(&example.hindi).color(MUTED));
                                    });
                                    let row = ui.interact(frame.response.rect, ui.id().with(("example", i)), egui::Sense::click());
                                    if row.on_hover_cursor(egui::CursorIcon::PointingHand).clicked() {
                                        picked = Some(i);
                                    }
                                }
                            }
                        }
                    });
                });
            });

        if close {
            self.panel.close_examples();
            return None;
        }
        picked.and_then(|i| self.panel.choose_example(i))
    }

    fn alert_modal(&mut self, ctx: &egui::Context) {
        let Some(alert) = self.panel.alert() else {
            return;
        };
        // Blocking: the backdrop swallows clicks and only OK dismisses.
        Self::backdrop(ctx, "alert_backdrop", egui::Order::Foreground);
        egui::Area::new(egui::Id::new("alert_modal"))
            .order(egui::Order::Tooltip)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                egui::Frame::window(&ctx.style()).show(ui, |ui| {
                    ui.set_min_width(280.0);
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(icons::WARNING).size(20.0).color(WARNING));
                        ui.label(alert.to_string());
                    });
                    ui.add_space(8.0);
                    ui.vertical_centered(|ui| {
                        if ui.button("OK").clicked() || ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                            self.panel.dismiss_alert();
                        }
                    });
                });
            });
    }
}

impl eframe::App for PanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.events.try_recv() {
            self.panel.apply(event);
        }
        let now = Instant::now();
        if let Some(left) = self.panel.copy_feedback_remaining(now) {
            ctx.request_repaint_after(left);
        }

        hold_focus_for_alert(ctx, self.panel.alert().is_some());

        let mut commands = Vec::new();

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(TITLE);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button(format!("{} Examples", icons::LIST)).clicked() {
                        commands.push(self.panel.open_examples());
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                self.input_section(ui);
                ui.add_space(6.0);
                commands.extend(self.controls(ui));
                ui.add_space(10.0);
                commands.extend(self.output_section(ui, now));
                self.metadata_section(ui);
            });
        });

        commands.extend(self.examples_modal(ctx));
        self.alert_modal(ctx);

        for cmd in commands {
            self.dispatch(Some(cmd));
        }
    }
}

/// Runs the panel on the main thread until the window closes. `repaint` is filled with
/// the egui context once it exists so the worker can wake the UI.
pub fn run(
    cfg: Config,
    commands: Sender<Command>,
    events: Receiver<Event>,
    repaint: Arc<OnceCell<egui::Context>>,
) -> anyhow::Result<()> {
    tracing::info!("Main UI: starting event loop");
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(TITLE)
            .with_inner_size([820.0, 640.0])
            .with_min_inner_size([520.0, 420.0]),
        ..Default::default()
    };
    eframe::run_native(
        TITLE,
        native_options,
        Box::new(move |cc| {
            let _ = repaint.set(cc.egui_ctx.clone());
            install_fonts(&cc.egui_ctx, cfg.font_path.as_deref());
            Box::new(PanelApp::new(&cfg, commands, events))
        }),
    )
    .map_err(|e| anyhow::anyhow!("UI error: {}", e))?;
    tracing::info!("Main UI: event loop exited");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_takes_focus_from_input() {
        let ctx = egui::Context::default();
        let input = egui::Id::new("input");
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            ctx.memory_mut(|m| m.request_focus(input));
            assert_eq!(ctx.memory(|m| m.focused()), Some(input));

            hold_focus_for_alert(ctx, false);
            assert_eq!(ctx.memory(|m| m.focused()), Some(input));

            hold_focus_for_alert(ctx, true);
            assert_eq!(ctx.memory(|m| m.focused()), None);
        });
    }
}
