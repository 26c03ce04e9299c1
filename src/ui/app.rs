use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;
use eframe::egui::{self, Color32, RichText, TopBottomPanel, Ui};

use crate::availability::hours::{all_labels, to_label};
use crate::availability::step::{AvailabilityStep, Navigation, RecordedNavigation};
use crate::availability::week::DAYS_PER_WEEK;

const UNSAVED_COLOR: Color32 = Color32::from_rgb(240, 128, 128);
const AVAILABLE_FILL: Color32 = Color32::from_rgb(43, 148, 178);
const UNAVAILABLE_FILL: Color32 = Color32::from_rgb(16, 24, 38);

/// Shows the step in a window. Returns the navigation that closed it, or
/// `None` when the window was closed directly.
pub fn run_gui(
    step: AvailabilityStep,
    store_label: &'static str,
    notice: Option<String>,
) -> Result<Option<Navigation>> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Enter Availability")
            .with_inner_size([860.0, 720.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    let navigation = Rc::new(Cell::new(None));
    let app = AvailabilityApp::new(step, store_label, notice, Rc::clone(&navigation));

    eframe::run_native(
        "Enter Availability",
        native_options,
        Box::new(move |cc| {
            configure_theme(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to launch availability GUI: {err}"))?;

    Ok(navigation.get())
}

fn configure_theme(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.override_text_color = Some(Color32::from_rgb(226, 234, 246));
    visuals.panel_fill = Color32::from_rgb(8, 16, 26);
    visuals.window_fill = Color32::from_rgb(12, 20, 32);
    visuals.widgets.inactive.bg_fill = UNAVAILABLE_FILL;
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(26, 42, 62);
    visuals.selection.bg_fill = AVAILABLE_FILL;
    ctx.set_visuals(visuals);
}

struct AvailabilityApp {
    step: AvailabilityStep,
    store_label: &'static str,
    status_message: Option<(String, Instant)>,
    navigation: Rc<Cell<Option<Navigation>>>,
}

impl AvailabilityApp {
    fn new(
        step: AvailabilityStep,
        store_label: &'static str,
        notice: Option<String>,
        navigation: Rc<Cell<Option<Navigation>>>,
    ) -> Self {
        let mut app = Self {
            step,
            store_label,
            status_message: None,
            navigation,
        };
        if let Some(text) = notice {
            app.set_status(text, Duration::from_secs(8));
        }
        app
    }

    fn set_status(&mut self, text: impl Into<String>, ttl: Duration) {
        self.status_message = Some((text.into(), Instant::now() + ttl));
    }

    fn show_header(&mut self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.label(
                RichText::new("Enter Availability")
                    .size(26.0)
                    .color(Color32::from_rgb(96, 228, 206))
                    .strong(),
            );
            ui.separator();
            ui.label(
                RichText::new(format!(
                    "Week of {}",
                    self.step.anchor().format("%A, %B %d %Y")
                ))
                .size(18.0)
                .color(Color32::from_rgb(169, 188, 209)),
            );
        });
        ui.horizontal(|ui| {
            ui.label(format!("User: {}", self.step.user()));
            ui.separator();
            ui.label(
                RichText::new(format!("Store: {}", self.store_label))
                    .color(Color32::from_rgb(102, 211, 171)),
            );
            ui.separator();
            ui.label(format!(
                "{} hour(s) marked",
                self.step.editor().available_count()
            ));
        });
        if let Some((msg, _)) = &self.status_message {
            ui.label(
                RichText::new(msg)
                    .color(Color32::from_rgb(255, 183, 95))
                    .strong(),
            );
        }
    }

    fn show_grid(&mut self, ui: &mut Ui) {
        let grid = *self.step.editor().grid();
        let window = self.step.window();
        let mut clicked: Option<(usize, usize)> = None;

        egui::ScrollArea::vertical()
            .id_salt("availability_scroll")
            .show(ui, |ui| {
                egui::Grid::new("availability_grid")
                    .num_columns(DAYS_PER_WEEK + 1)
                    .spacing([4.0, 4.0])
                    .show(ui, |ui| {
                        ui.label("");
                        for label in self.step.day_labels() {
                            ui.label(RichText::new(label).strong());
                        }
                        ui.end_row();

                        for hour in window.hours() {
                            let slot = usize::from(hour);
                            ui.label(RichText::new(to_label(hour)).monospace());
                            for (day, slots) in grid.days().iter().enumerate() {
                                let fill = if slots[slot] {
                                    AVAILABLE_FILL
                                } else {
                                    UNAVAILABLE_FILL
                                };
                                let cell = egui::Button::new("")
                                    .fill(fill)
                                    .min_size(egui::vec2(72.0, 22.0));
                                if ui.add(cell).clicked() {
                                    clicked = Some((day, slot));
                                }
                            }
                            ui.end_row();
                        }
                    });
            });

        if let Some((day, hour)) = clicked
            && let Err(err) = self.step.toggle(day, hour)
        {
            self.set_status(format!("Toggle failed: {err}"), Duration::from_secs(4));
        }
    }

    fn show_window_selectors(&mut self, ui: &mut Ui) {
        let window = self.step.window();
        let mut start = window.start();
        let mut end = window.end();
        let labels = all_labels();

        ui.horizontal(|ui| {
            egui::ComboBox::from_label("Start Time")
                .selected_text(to_label(start))
                .show_ui(ui, |ui| {
                    for (hour, label) in (0u8..).zip(&labels) {
                        ui.selectable_value(&mut start, hour, label.as_str());
                    }
                });
            ui.add_space(24.0);
            egui::ComboBox::from_label("End Time")
                .selected_text(to_label(end))
                .show_ui(ui, |ui| {
                    for (hour, label) in (0u8..).zip(&labels) {
                        ui.selectable_value(&mut end, hour, label.as_str());
                    }
                });
        });

        if start != window.start()
            && let Err(err) = self.step.set_start(start)
        {
            self.set_status(err.to_string(), Duration::from_secs(4));
        }
        if end != window.end()
            && let Err(err) = self.step.set_end(end)
        {
            self.set_status(err.to_string(), Duration::from_secs(4));
        }
    }

    fn show_footer(&mut self, ui: &mut Ui, ctx: &egui::Context) {
        ui.vertical_centered(|ui| {
            if self.step.editor().is_dirty() {
                ui.label(RichText::new("Unsaved changes").color(UNSAVED_COLOR));
            }
            let save = egui::Button::new(RichText::new("Save").strong())
                .min_size(egui::vec2(120.0, 26.0));
            if ui.add(save).clicked() {
                match self.step.save() {
                    Ok(_) => self.set_status("Availability saved.", Duration::from_secs(2)),
                    Err(err) => {
                        self.set_status(format!("Save failed: {err}"), Duration::from_secs(4))
                    }
                }
            }
        });
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let mut navigator = RecordedNavigation::default();
            if ui.button("Previous").clicked() {
                self.step.previous(&mut navigator);
            }
            if ui.button("Next").clicked() {
                self.step.next(&mut navigator);
            }
            if let Some(navigation) = navigator.last {
                self.navigation.set(Some(navigation));
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        });
    }
}

impl eframe::App for AvailabilityApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some((_, expires_at)) = &self.status_message
            && Instant::now() >= *expires_at
        {
            self.status_message = None;
        }

        TopBottomPanel::top("header")
            .resizable(false)
            .show(ctx, |ui| self.show_header(ui));

        TopBottomPanel::bottom("footer")
            .resizable(false)
            .show(ctx, |ui| self.show_footer(ui, ctx));

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_window_selectors(ui);
            ui.separator();
            self.show_grid(ui);
        });

        if let Some((_, expires_at)) = &self.status_message {
            ctx.request_repaint_after(expires_at.saturating_duration_since(Instant::now()));
        }
    }
}
