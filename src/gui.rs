// src/gui.rs
use crate::config::DashboardConfig;
use crate::engine;
use crate::serial_link::{self, MotorCommand};
use crate::types::*;
use crate::visualizer::{self, BUTTON_BLUE, BUTTON_GREEN, BUTTON_RED, READOUT_BLUE};
use eframe::egui;
use egui::{Color32, RichText, Vec2};
use egui_plot::{Line, LineStyle, MarkerShape, Plot, PlotBounds, PlotPoints, Points, VLine};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Duration;

pub const SIMULATE_PORT: &str = "SIMULATE (no-COM)";
const BACKDROP: Color32 = Color32::from_rgb(0x2e, 0x32, 0x3c);
const ANALYZER_BG: Color32 = Color32::from_rgb(0x1b, 0x20, 0x2c);

pub struct RfLabApp {
    rx: Receiver<BenchMessage>,
    tx_cmd: Sender<GuiCommand>,
    snapshot: Option<BenchSnapshot>,
    serial_status: String,
    upload_status: String,
    log_messages: Vec<String>,
    available_ports: Vec<String>,
    selected_port: String,
    config: DashboardConfig,
    config_path: PathBuf,
}

impl RfLabApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: DashboardConfig, config_path: PathBuf) -> Self {
        let mut visuals = egui::Visuals::dark();
        visuals.panel_fill = BACKDROP;
        cc.egui_ctx.set_visuals(visuals);

        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        // The engine exits on its own once `tx_cmd` is dropped.
        let _ = engine::spawn_thread(config.clone(), tx, rx_cmd);

        let ports = serial_link::available_ports();
        let selected_port = config
            .last_port
            .clone()
            .filter(|p| ports.contains(p))
            .unwrap_or_else(|| SIMULATE_PORT.to_owned());

        Self {
            rx,
            tx_cmd,
            snapshot: None,
            serial_status: "Simulation".to_owned(),
            upload_status: String::new(),
            log_messages: vec![],
            available_ports: ports,
            selected_port,
            config,
            config_path,
        }
    }

    fn send(&mut self, cmd: GuiCommand) {
        if self.tx_cmd.send(cmd).is_err() {
            self.log("Bench engine is not running");
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > 12 {
            self.log_messages.remove(0);
        }
    }

    fn refresh_ports(&mut self) {
        self.available_ports = serial_link::available_ports();
        if self.selected_port != SIMULATE_PORT && !self.available_ports.contains(&self.selected_port) {
            self.selected_port = SIMULATE_PORT.to_owned();
        }
        self.log(&format!("Ports: {:?}", self.available_ports));
    }

    fn connect_selected(&mut self) {
        let cmd = if self.selected_port == SIMULATE_PORT {
            GuiCommand::Connect(ConnectionMode::Simulation, String::new())
        } else {
            GuiCommand::Connect(ConnectionMode::Hardware, self.selected_port.clone())
        };
        self.send(cmd);
    }

    fn persist_port(&mut self, port: &str) {
        if self.config.last_port.as_deref() == Some(port) {
            return;
        }
        self.config.last_port = Some(port.to_owned());
        if let Err(e) = self.config.save(&self.config_path) {
            log::warn!("could not save configuration: {e:#}");
        }
    }

    fn drain_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                BenchMessage::Log(s) => self.log(&s),
                BenchMessage::SerialStatus(s) => {
                    if let Some(port) = s.strip_prefix("Connected ") {
                        let port = port.to_owned();
                        self.persist_port(&port);
                    }
                    self.serial_status = s;
                }
                BenchMessage::UploadStatus(s) => {
                    self.log(&s);
                    self.upload_status = s;
                }
                BenchMessage::Snapshot(snap) => self.snapshot = Some(snap),
            }
        }
    }

    fn pick_pattern_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv", "txt"])
            .pick_file()
        {
            self.send(GuiCommand::LoadPattern(path));
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        for file in dropped {
            if let Some(path) = file.path {
                self.send(GuiCommand::LoadPattern(path));
            } else if let Some(bytes) = file.bytes {
                self.send(GuiCommand::LoadPatternBytes(file.name, bytes.to_vec()));
            }
        }
    }

    // ───── top-left: analyzer ─────
    fn show_analyzer(&mut self, ui: &mut egui::Ui, height: f32) {
        let snap = self.snapshot.clone();
        visualizer::bezel(ui, height, |ui| {
            visualizer::title_bar(ui, "R&S  FSW ▸ SIGNAL & SPECTRUM ANALYZER");
            ui.label(
                RichText::new("Ref 0 dBm  RBW 500 kHz  VBW 500 kHz  Auto Sweep")
                    .monospace()
                    .size(11.0)
                    .color(READOUT_BLUE),
            );

            let plot_height = (ui.available_height() - 34.0).max(60.0);
            let (center_hz, vsg_hz) = snap
                .as_ref()
                .map(|s| (s.axis_center_hz, s.vsg_ghz * 1e9))
                .unwrap_or((5.9e9, 5.9e9));
            let half_span = crate::spectrum::SPAN_HZ / 2.0;
            let (lo, hi) = ((center_hz - half_span) / 1e9, (center_hz + half_span) / 1e9);

            ui.scope(|ui| {
                ui.visuals_mut().extreme_bg_color = ANALYZER_BG;
                Plot::new("spectrum_plot")
                    .height(plot_height)
                    .allow_drag(false)
                    .allow_zoom(false)
                    .allow_scroll(false)
                    .x_axis_label("Frequency (GHz)")
                    .y_axis_label("Power (dBm)")
                    .show(ui, |plot_ui| {
                        plot_ui.set_plot_bounds(PlotBounds::from_min_max([lo, -100.0], [hi, 0.0]));
                        if let Some(spec) = snap.as_ref().map(|s| &s.spectrum) {
                            let points: PlotPoints = spec
                                .frequencies_hz
                                .iter()
                                .zip(spec.power_dbm.iter())
                                .map(|(f, p)| [*f / 1e9, *p])
                                .collect();
                            plot_ui.line(Line::new(points).color(Color32::YELLOW).width(1.0));
                        }
                        plot_ui.vline(
                            VLine::new(vsg_hz / 1e9)
                                .color(Color32::from_rgb(0x00, 0xbf, 0xff))
                                .style(LineStyle::dashed_dense()),
                        );
                    });
            });

            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format!(
                        "CF {:.3} GHz  1001 pts  Span 50 MHz  Measuring…",
                        center_hz / 1e9
                    ))
                    .monospace()
                    .size(11.0)
                    .color(READOUT_BLUE),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.add(blue_button("Auto", Vec2::ZERO)).clicked() {
                        self.send(GuiCommand::Recenter);
                    }
                });
            });
        });
    }

    // ───── top-right: signal generator ─────
    fn show_generator(&mut self, ui: &mut egui::Ui, height: f32) {
        let readout = self
            .snapshot
            .as_ref()
            .map(|s| s.vsg_display.clone())
            .unwrap_or_else(|| crate::frequency::VsgFrequency::default().display());
        visualizer::bezel(ui, height, |ui| {
            visualizer::title_bar(ui, "R&S  SMW200A ▸ VECTOR SIGNAL GENERATOR");
            ui.horizontal(|ui| {
                ui.label(RichText::new("Frequency").strong());
                ui.label(
                    RichText::new(readout)
                        .family(egui::FontFamily::Monospace)
                        .size(30.0)
                        .color(READOUT_BLUE),
                );
                ui.label(RichText::new("GHz").strong());
            });
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.add(blue_button("▲", Vec2::new(44.0, 34.0))).clicked() {
                    self.send(GuiCommand::FrequencyUp);
                }
                if ui.add(blue_button("▼", Vec2::new(44.0, 34.0))).clicked() {
                    self.send(GuiCommand::FrequencyDown);
                }
            });
            ui.add_space(14.0);
            ui.horizontal(|ui| {
                let grey = Color32::from_rgb(0x6c, 0x7a, 0x89);
                for (text, fill) in [
                    ("RF On", Color32::from_rgb(0x00, 0x97, 0xe6)),
                    ("Remote", grey),
                    ("Int Ref", grey),
                    ("Mod Off", grey),
                ] {
                    visualizer::status_badge(ui, text, fill);
                }
            });
        });
    }

    // ───── bottom-left: antenna pattern ─────
    fn show_pattern(&mut self, ui: &mut egui::Ui, height: f32) {
        let trace: Vec<[f64; 2]> = self
            .snapshot
            .as_ref()
            .map(|s| s.trace.iter().map(|p| [p.angle_deg, p.signal_dbm]).collect())
            .unwrap_or_default();
        visualizer::bezel(ui, height, |ui| {
            ui.visuals_mut().extreme_bg_color = Color32::BLACK;
            Plot::new("pattern_plot")
                .height(ui.available_height())
                .allow_drag(false)
                .allow_zoom(false)
                .allow_scroll(false)
                .x_axis_label("Azimuth (°)")
                .y_axis_label("RF level (dBm)")
                .show(ui, |plot_ui| {
                    plot_ui.set_plot_bounds(PlotBounds::from_min_max([0.0, -100.0], [360.0, 0.0]));
                    plot_ui.points(
                        Points::new(PlotPoints::from(trace))
                            .shape(MarkerShape::Cross)
                            .radius(3.0)
                            .color(Color32::from_rgb(0x00, 0xf7, 0x00)),
                    );
                });
        });
    }

    // ───── bottom-right: turn table / motor controller ─────
    fn show_turntable(&mut self, ui: &mut egui::Ui, height: f32) {
        let lines = match self.snapshot.as_ref() {
            Some(s) => visualizer::lcd_lines(s.current_angle_deg, s.cursor, s.table_len, s.running),
            None => visualizer::lcd_lines(0.0, 0, 0, false),
        };
        visualizer::bezel(ui, height, |ui| {
            ui.columns(2, |cols| {
                visualizer::draw_lcd(&mut cols[0], &lines);

                let ui = &mut cols[1];
                ui.horizontal(|ui| {
                    if ui.add(colored_button("⟳", BUTTON_GREEN, Vec2::splat(40.0))).clicked() {
                        self.send(GuiCommand::StartSweep);
                    }
                    if ui.add(colored_button("STOP", BUTTON_RED, Vec2::new(80.0, 32.0))).clicked() {
                        self.send(GuiCommand::StopSweep);
                    }
                    if ui.add(colored_button("Reset", BUTTON_RED, Vec2::new(80.0, 32.0))).clicked() {
                        self.send(GuiCommand::ResetSweep);
                    }
                });
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    for (label, cmd, fill) in [
                        ("CW", MotorCommand::Cw, BUTTON_BLUE),
                        ("CCW", MotorCommand::Ccw, BUTTON_BLUE),
                        ("⏹", MotorCommand::Stop, BUTTON_RED),
                    ] {
                        if ui.add(colored_button(label, fill, Vec2::new(50.0, 36.0))).clicked() {
                            self.send(GuiCommand::Motor(cmd));
                        }
                    }
                });
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    ui.label("Serial:");
                    egui::ComboBox::from_id_source("port_selector")
                        .selected_text(self.selected_port.clone())
                        .width(160.0)
                        .show_ui(ui, |ui| {
                            ui.selectable_value(&mut self.selected_port, SIMULATE_PORT.to_owned(), SIMULATE_PORT);
                            for p in &self.available_ports {
                                ui.selectable_value(&mut self.selected_port, p.clone(), p);
                            }
                        });
                });
                ui.horizontal(|ui| {
                    if ui.button("Connect").clicked() {
                        self.connect_selected();
                    }
                    if ui.button("⟲ Ports").clicked() {
                        self.refresh_ports();
                    }
                    ui.label(RichText::new(&self.serial_status).small());
                });
            });
        });
    }
}

fn colored_button(text: &str, fill: Color32, min_size: Vec2) -> impl egui::Widget {
    egui::Button::new(RichText::new(text).strong().color(Color32::WHITE))
        .fill(fill)
        .min_size(min_size)
}

fn blue_button(text: &str, min_size: Vec2) -> impl egui::Widget {
    colored_button(text, BUTTON_BLUE, min_size)
}

impl eframe::App for RfLabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();
        self.handle_dropped_files(ctx);

        egui::TopBottomPanel::bottom("upload_bar").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(RichText::new("Upload a CSV File:").color(Color32::WHITE));
                if ui.button("Upload File").clicked() {
                    self.pick_pattern_file();
                }
                if !self.upload_status.is_empty() {
                    ui.label(RichText::new(&self.upload_status).color(Color32::WHITE));
                }
            });
        });

        egui::SidePanel::right("log_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.label("Logs");
                egui::ScrollArea::vertical()
                    .auto_shrink([false; 2])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for m in &self.log_messages {
                            ui.monospace(m);
                        }
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let row_height = (ui.available_height() - ui.spacing().item_spacing.y) / 2.0;
            ui.columns(2, |cols| {
                self.show_analyzer(&mut cols[0], row_height);
                self.show_generator(&mut cols[1], row_height);
            });
            ui.columns(2, |cols| {
                self.show_pattern(&mut cols[0], row_height);
                self.show_turntable(&mut cols[1], row_height);
            });
        });

        ctx.request_repaint_after(Duration::from_millis(self.config.tick_ms));
    }
}
