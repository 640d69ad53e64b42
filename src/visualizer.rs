// src/visualizer.rs
use eframe::egui;
use egui::{Color32, Rect, Rounding, Stroke, Vec2};

pub const BEZEL_FILL: Color32 = Color32::from_rgb(0xdc, 0xe3, 0xea);
pub const BEZEL_BORDER: Color32 = Color32::from_rgb(0x8d, 0x99, 0xa6);
pub const READOUT_BLUE: Color32 = Color32::from_rgb(0x00, 0x33, 0x99);
pub const BUTTON_BLUE: Color32 = Color32::from_rgb(0x00, 0x7b, 0xff);
pub const BUTTON_RED: Color32 = Color32::from_rgb(0xdc, 0x35, 0x45);
pub const BUTTON_GREEN: Color32 = Color32::from_rgb(0x28, 0xa7, 0x45);

/// Instrument front panel: light grey bezel with a rounded border.
pub fn bezel(ui: &mut egui::Ui, height: f32, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .fill(BEZEL_FILL)
        .stroke(Stroke::new(1.0, BEZEL_BORDER))
        .rounding(Rounding::same(8.0))
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.set_min_height((height - 26.0).max(0.0));
            ui.set_max_height((height - 26.0).max(0.0));
            ui.visuals_mut().override_text_color = Some(Color32::BLACK);
            add_contents(ui);
        });
}

/// Dark strip carrying the instrument name, e.g. "R&S  FSW ▸ ...".
pub fn title_bar(ui: &mut egui::Ui, title: &str) {
    let (rect, _) = ui.allocate_exact_size(Vec2::new(ui.available_width(), 22.0), egui::Sense::hover());
    let painter = ui.painter();
    painter.rect_filled(rect, Rounding::same(4.0), Color32::from_rgb(0x2b, 0x2d, 0x30));
    painter.text(
        rect.left_center() + Vec2::new(10.0, 0.0),
        egui::Align2::LEFT_CENTER,
        title,
        egui::FontId::proportional(12.0),
        Color32::from_rgb(0xe2, 0xe6, 0xea),
    );
    ui.add_space(6.0);
}

/// Small filled status tag (RF On / Remote / ...).
pub fn status_badge(ui: &mut egui::Ui, text: &str, fill: Color32) {
    let font = egui::FontId::proportional(11.0);
    let galley = ui.painter().layout_no_wrap(text.to_owned(), font.clone(), Color32::WHITE);
    let size = galley.size() + Vec2::new(20.0, 8.0);
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    let painter = ui.painter();
    painter.rect_filled(rect, Rounding::same(4.0), fill);
    painter.text(rect.center(), egui::Align2::CENTER_CENTER, text, font, Color32::WHITE);
}

/// Motor-controller LCD: blue backlit panel with white monospace lines.
pub fn draw_lcd(ui: &mut egui::Ui, lines: &[String]) {
    let line_height = 17.0;
    let padding = 10.0;
    let height = lines.len() as f32 * line_height + padding * 2.0;
    let (response, painter) =
        ui.allocate_painter(Vec2::new(ui.available_width(), height), egui::Sense::hover());
    let rect = response.rect;

    // Two-tone fill stands in for the backlight gradient.
    let top = Rect::from_min_max(rect.min, egui::pos2(rect.max.x, rect.center().y));
    painter.rect_filled(rect, Rounding::same(4.0), Color32::from_rgb(0x4a, 0xa6, 0xf0));
    painter.rect_filled(
        top,
        Rounding {
            nw: 4.0,
            ne: 4.0,
            sw: 0.0,
            se: 0.0,
        },
        Color32::from_rgb(0x6a, 0xc0, 0xff),
    );
    painter.rect_stroke(rect, Rounding::same(4.0), Stroke::new(2.0, Color32::from_rgb(0x0e, 0x4d, 0x8b)));

    let font = egui::FontId::monospace(13.0);
    for (i, line) in lines.iter().enumerate() {
        let pos = rect.min + Vec2::new(padding, padding + i as f32 * line_height);
        painter.text(pos, egui::Align2::LEFT_TOP, line, font.clone(), Color32::WHITE);
    }
}

/// Text shown on the turn-table LCD for the current sweep position.
pub fn lcd_lines(angle_deg: f64, cursor: usize, table_len: usize, running: bool) -> Vec<String> {
    vec![
        "Device           Pos.   Pol.  Angle".to_owned(),
        "MCU".to_owned(),
        format!("Turn Table       {angle_deg:0.2}°"),
        "=>Antenna Mast   not referenced".to_owned(),
        String::new(),
        format!(
            "Sweep {cursor:>3}/{table_len:<3}      {}",
            if running { "running" } else { "idle" }
        ),
        "new value                reference".to_owned(),
    ]
}
