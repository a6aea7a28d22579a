use sceneview_render::{DebugOverlay, OverlayFrame};
use sceneview_tools::{ViewerInspector, ViewerSummary};
use std::cell::RefCell;
use std::rc::Rc;

/// Latest frame summary shared between the scene overlay and the egui panel.
pub type SharedSummary = Rc<RefCell<Option<PanelData>>>;

pub struct PanelData {
    pub summary: ViewerSummary,
    pub fps: f64,
}

/// Overlay that hands each frame's summary to the egui side panel.
pub struct PanelOverlay {
    shared: SharedSummary,
    smoothed_dt: f64,
}

impl PanelOverlay {
    pub fn new(shared: SharedSummary) -> Self {
        Self {
            shared,
            smoothed_dt: 0.0,
        }
    }
}

impl DebugOverlay for PanelOverlay {
    fn render(&mut self, dt: f64, frame: &OverlayFrame<'_>) {
        self.smoothed_dt = if self.smoothed_dt == 0.0 {
            dt
        } else {
            self.smoothed_dt * 0.9 + dt * 0.1
        };
        let fps = if self.smoothed_dt > 0.0 { 1.0 / self.smoothed_dt } else { 0.0 };
        *self.shared.borrow_mut() = Some(PanelData {
            summary: ViewerInspector::summary(frame),
            fps,
        });
    }
}

pub fn draw(ctx: &egui::Context, data: Option<&PanelData>) {
    egui::SidePanel::left("inspector")
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.heading("SceneView");
            ui.separator();
            let Some(data) = data else {
                ui.label("Loading...");
                return;
            };
            let s = &data.summary;
            let cam = &s.camera;
            ui.label(format!("Scene: {}", s.scene));
            ui.label(format!("FPS: {:.0}", data.fps));
            ui.label(format!("Models drawn: {}", s.models_drawn));
            ui.separator();
            ui.heading("Camera");
            ui.label(format!(
                "Position: ({:.2}, {:.2}, {:.2})",
                cam.position[0], cam.position[1], cam.position[2]
            ));
            ui.label(format!("Yaw: {:.1}  Pitch: {:.1}", cam.yaw, cam.pitch));
            ui.label(format!("Speed: {:.2}", cam.speed));
            ui.separator();
            ui.heading("Input");
            ui.label(format!("Capture: {:?}", s.capture));
            let keys: Vec<String> = s.pressed.iter().map(|k| format!("{k:?}")).collect();
            ui.label(format!("Held: {}", keys.join(" ")));
            ui.separator();
            ui.small("F1: Capture | WASD: Move | Space/Ctrl: Up/Down | Shift: Sprint | Esc: Quit");
        });
}
