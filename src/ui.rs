//! Control panel (requires the `egui` feature).
//!
//! The panel only pushes settings into the core: slider edits go through
//! [`SimulationUniforms::set`] and the colour picker returns a colour for
//! the frame loop to apply to the selected agent.

use glam::Vec4;

use crate::agent::Agent;
use crate::uniforms::{Control, SimulationUniforms};

/// Read-only figures shown in the panel.
#[derive(Copy, Clone, Debug, Default)]
pub struct PanelStats {
    pub agents: usize,
    pub visible: usize,
    pub fps: f32,
    pub zoom: f32,
    pub paused: bool,
}

/// What the user changed this frame.
#[derive(Clone, Debug, Default)]
pub struct PanelOutput {
    pub uniforms_changed: bool,
    pub color: Option<Vec4>,
    pub clear_selection: bool,
}

pub fn control_panel(
    ctx: &egui::Context,
    uniforms: &mut SimulationUniforms,
    stats: PanelStats,
    selected: Option<(usize, &Agent)>,
) -> PanelOutput {
    let mut output = PanelOutput::default();

    egui::Window::new("Flocking")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!("Agents: {} ({} visible)", stats.agents, stats.visible));
            ui.label(format!("FPS: {:.0}  Zoom: {:.3}", stats.fps, stats.zoom));
            if stats.paused {
                ui.label("Paused (Space to resume)");
            }
            ui.separator();

            for control in Control::ALL {
                let mut value = uniforms.get(control);
                if ui
                    .add(egui::Slider::new(&mut value, control.range()).text(control.label()))
                    .changed()
                {
                    output.uniforms_changed |= uniforms.set(control, value);
                }
            }

            ui.separator();
            match selected {
                Some((index, agent)) => {
                    ui.label(format!("Selected agent #{}", index));
                    let p = agent.position();
                    let v = agent.velocity();
                    ui.label(format!("Position: ({:.1}, {:.1})", p.x, p.y));
                    ui.label(format!("Velocity: ({:.1}, {:.1})", v.x, v.y));

                    let mut rgb = [agent.color[0], agent.color[1], agent.color[2]];
                    ui.horizontal(|ui| {
                        ui.label("Color");
                        if ui.color_edit_button_rgb(&mut rgb).changed() {
                            output.color = Some(Vec4::new(rgb[0], rgb[1], rgb[2], agent.color[3]));
                        }
                    });
                    if ui.button("Deselect").clicked() {
                        output.clear_selection = true;
                    }
                }
                None => {
                    ui.label("Click an agent to select it");
                }
            }
        });

    output
}
