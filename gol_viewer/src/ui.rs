// ui.rs - Draws the mirrored board and turns key presses into engine commands

use eframe::egui;
use egui::{Color32, Rect, Vec2};
use gol::State;

use crate::Viewer;

impl eframe::App for Viewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        let pressed: Vec<char> = ctx.input(|i| {
            [(egui::Key::S, 's'), (egui::Key::P, 'p'), (egui::Key::Q, 'q')]
                .into_iter()
                .filter(|&(key, _)| i.key_pressed(key))
                .map(|(_, c)| c)
                .collect()
        });
        for key in pressed {
            self.press(key);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Parallel Game of Life");

            // Controls
            ui.horizontal(|ui| {
                ui.add_enabled_ui(!self.finished, |ui| {
                    let pause_text = if self.state == State::Paused { "▶ Resume" } else { "⏸ Pause" };
                    if ui.button(pause_text).clicked() {
                        self.press('p');
                    }
                    if ui.button("💾 Save").clicked() {
                        self.press('s');
                    }
                    if ui.button("⏹ Quit").clicked() {
                        self.press('q');
                    }
                });

                ui.separator();

                ui.label(format!("Turn: {}", self.turn));
                ui.label(format!("State: {}", if self.finished { "Finished".to_string() } else { self.state.to_string() }));
            });

            ui.horizontal(|ui| {
                ui.label("Live:");
                ui.color_edit_button_srgba(&mut self.live_color);
                ui.label("Dead:");
                ui.color_edit_button_srgba(&mut self.dead_color);

                ui.separator();

                if let Some(name) = &self.last_snapshot {
                    ui.label(format!("Last snapshot: {name}"));
                }
            });

            ui.label("Keys: S saves a snapshot, P pauses or resumes, Q quits.");

            ui.separator();

            // Scale the board to the space left, keeping cells square.
            let (width, height) = (self.board.width(), self.board.height());
            let available = ui.available_size() - Vec2::new(0.0, 30.0);
            let cell_size = (available.x / width as f32).min(available.y / height as f32).max(1.0);
            let total_size = Vec2::new(cell_size * width as f32, cell_size * height as f32);

            let (response, painter) = ui.allocate_painter(total_size, egui::Sense::hover());
            let origin = response.rect.min;

            painter.rect_filled(response.rect, 0.0, self.dead_color);
            for cell in self.board.alive_cells() {
                let min = origin + Vec2::new(cell.x as f32 * cell_size, cell.y as f32 * cell_size);
                painter.rect_filled(Rect::from_min_size(min, Vec2::splat(cell_size)), 0.0, self.live_color);
            }

            ui.separator();

            // Statistics
            let live_cells = self.board.alive_count();
            let total = (width * height) as f32;
            ui.horizontal(|ui| {
                ui.label(format!("Live cells: {live_cells}"));
                ui.label(format!("Population: {:.1}%", live_cells as f32 / total * 100.0));
                if let Some(count) = self.reported_alive {
                    ui.label(format!("Last engine report: {count}"));
                }
                if self.finished {
                    ui.colored_label(Color32::from_rgb(200, 200, 0), "Run finished");
                }
            });
        });

        if !self.finished {
            ctx.request_repaint();
        }
    }
}
