//! Interactive backend: shows the scene in an egui window.
//!
//! Blocks on the native event loop until the window is closed. The data is
//! frozen by the time we get here, so the app only redraws what the scene
//! already contains.

use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::chart::{ChartBackend, ChartScene, Panel};
use crate::error::{Error, Result};

#[derive(Default)]
pub struct ChartWindow;

impl ChartBackend for ChartWindow {
    fn render(&mut self, scene: &ChartScene) -> Result<()> {
        let app = ChartApp {
            scene: scene.clone(),
        };
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default().with_inner_size([1100.0, 700.0]),
            ..Default::default()
        };
        eframe::run_native(
            "procplot",
            options,
            Box::new(move |_cc| Ok(Box::new(app))),
        )
        .map_err(|e| Error::Rendering(e.to_string()))
    }
}

struct ChartApp {
    scene: ChartScene,
}

impl eframe::App for ChartApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let panel_height = (ui.available_height() - 60.0) / 2.0;
            show_panel(ui, "cpu_panel", &self.scene.cpu, panel_height, None);
            ui.separator();
            show_panel(
                ui,
                "memory_panel",
                &self.scene.memory,
                panel_height,
                Some(&self.scene.x_label),
            );
        });
    }
}

fn show_panel(ui: &mut egui::Ui, id: &str, panel: &Panel, height: f32, x_label: Option<&str>) {
    ui.strong(&panel.title);

    let mut plot = Plot::new(id)
        .height(height)
        .legend(Legend::default())
        .y_axis_label(panel.y_label.clone())
        .include_x(panel.x_range[0])
        .include_x(panel.x_range[1])
        .include_y(panel.y_range[0])
        .include_y(panel.y_range[1])
        .allow_drag(false)
        .allow_scroll(false);
    if let Some(label) = x_label {
        plot = plot.x_axis_label(label.to_string());
    }

    plot.show(ui, |plot_ui| {
        for line in &panel.lines {
            let points: PlotPoints = line.points.clone().into();
            plot_ui.line(Line::new(points).name(&line.label));
        }
    });
}
