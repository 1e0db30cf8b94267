/*
 * UI Module
 *
 * This module builds the egui tuning panel with nannou_egui. Every weight
 * and radius in `SimulationParams` has a slider; the panel edits a working
 * copy and reports whether it changed so the app can push it to the engine
 * in one validated step.
 */

use nannou_egui::{egui, Egui};

use crate::app::EventTally;
use crate::debug::TickStats;
use crate::params::{AvoidSide, NeighborBackend, SimulationParams};

/// Viewer-only state, not part of the simulation parameters.
#[derive(Debug, Clone)]
pub struct ViewerControls {
    pub school_size: usize,
    pub predator_count: usize,
    pub paused: bool,
    pub show_debug: bool,
}

impl Default for ViewerControls {
    fn default() -> Self {
        Self {
            school_size: 120,
            predator_count: 1,
            paused: false,
            show_debug: false,
        }
    }
}

/// What the user asked for this frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct UiActions {
    pub params_changed: bool,
    pub respawn: bool,
    pub clear_baits: bool,
    pub clear_obstacles: bool,
    pub reset_camera: bool,
}

pub fn update_ui(
    egui: &mut Egui,
    params: &mut SimulationParams,
    controls: &mut ViewerControls,
    stats: &TickStats,
    tally: &EventTally,
    zoom: f32,
) -> UiActions {
    let mut actions = UiActions::default();
    let before = params.clone();

    let ctx = egui.begin_frame();

    egui::Window::new("Simulation Controls")
        .default_pos([10.0, 10.0])
        .show(&ctx, |ui| {
            ui.collapsing("School", |ui| {
                ui.add(egui::Slider::new(&mut controls.school_size, 0..=1500).text("Fish"));
                ui.add(egui::Slider::new(&mut controls.predator_count, 0..=8).text("Predators"));
                if ui.button("Respawn (R)").clicked() {
                    actions.respawn = true;
                }
                ui.add(egui::Slider::new(&mut params.fish.max_speed, SimulationParams::speed_range()).text("Max Speed"));
                ui.add(egui::Slider::new(&mut params.fish.max_force, SimulationParams::speed_range()).text("Max Force"));
                ui.add(egui::Slider::new(&mut params.fish.turn_smoothness, SimulationParams::smoothness_range()).text("Turn Smoothness"));
            });

            ui.collapsing("Flocking Behavior", |ui| {
                let flocking = &mut params.flocking;
                ui.add(egui::Slider::new(&mut flocking.separation_weight, SimulationParams::weight_range()).text("Separation Weight"));
                ui.add(egui::Slider::new(&mut flocking.alignment_weight, SimulationParams::weight_range()).text("Alignment Weight"));
                ui.add(egui::Slider::new(&mut flocking.cohesion_weight, SimulationParams::weight_range()).text("Cohesion Weight"));
                ui.add(egui::Slider::new(&mut flocking.seek_weight, SimulationParams::weight_range()).text("Seek Weight"));
                ui.add(egui::Slider::new(&mut flocking.obstacle_weight, SimulationParams::weight_range()).text("Obstacle Weight"));
                ui.add(egui::Slider::new(&mut flocking.boundary_weight, SimulationParams::weight_range()).text("Boundary Weight"));
                ui.add(egui::Slider::new(&mut flocking.perception_radius, SimulationParams::radius_range()).text("Perception Radius"));
                ui.add(egui::Slider::new(&mut flocking.separation_radius, SimulationParams::radius_range()).text("Separation Radius"));
                ui.add(egui::Slider::new(&mut flocking.boundary_radius, SimulationParams::radius_range()).text("Boundary Radius"));
                ui.add(egui::Slider::new(&mut flocking.bait_consumption_radius, SimulationParams::radius_range()).text("Bait Reach"));

                egui::ComboBox::from_label("Neighbor Search")
                    .selected_text(format!("{:?}", flocking.neighbor_backend))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut flocking.neighbor_backend, NeighborBackend::BruteForce, "BruteForce");
                        ui.selectable_value(&mut flocking.neighbor_backend, NeighborBackend::Grid, "Grid");
                    });
            });

            ui.collapsing("Obstacle Avoidance", |ui| {
                let avoidance = &mut params.avoidance;
                ui.add(egui::Slider::new(&mut avoidance.detection_box_min_length, SimulationParams::radius_range()).text("Look-ahead"));
                ui.add(egui::Slider::new(&mut avoidance.lateral_gain, SimulationParams::weight_range()).text("Lateral Gain"));
                ui.add(egui::Slider::new(&mut avoidance.vertical_factor, 0.0..=1.0).text("Vertical Factor"));
                ui.add(egui::Slider::new(&mut avoidance.proximity_gain, SimulationParams::weight_range()).text("Proximity Gain"));
                ui.add(egui::Slider::new(&mut avoidance.panic_distance, SimulationParams::radius_range()).text("Panic Distance"));
                ui.add(egui::Slider::new(&mut avoidance.panic_boost, SimulationParams::weight_range()).text("Panic Boost"));
                ui.add(egui::Slider::new(&mut avoidance.braking_weight, 0.0..=2.0).text("Braking"));
                ui.add(egui::Slider::new(&mut avoidance.correction_strength, 0.0..=50.0).text("Correction Strength"));

                egui::ComboBox::from_label("Dodge Side")
                    .selected_text(format!("{:?}", avoidance.avoid_side))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut avoidance.avoid_side, AvoidSide::FixedAxis, "FixedAxis");
                        ui.selectable_value(&mut avoidance.avoid_side, AvoidSide::Random, "Random");
                    });

                if ui.button("Clear Rocks").clicked() {
                    actions.clear_obstacles = true;
                }
            });

            ui.collapsing("Predators", |ui| {
                let predator = &mut params.predator;
                ui.checkbox(&mut predator.capture_enabled, "Capture Enabled");
                ui.add(egui::Slider::new(&mut predator.max_speed, SimulationParams::speed_range()).text("Max Speed"));
                ui.add(egui::Slider::new(&mut predator.max_force, 0.01..=1.0).text("Max Force"));
                ui.add(egui::Slider::new(&mut predator.detection_radius, 1.0..=30.0).text("Detection Radius"));
                ui.add(egui::Slider::new(&mut predator.capture_radius, SimulationParams::radius_range()).text("Capture Radius"));
                ui.add(egui::Slider::new(&mut predator.wander_jitter, 0.0..=2.0).text("Wander Jitter"));
            });

            ui.collapsing("Camera Controls", |ui| {
                ui.label("Zoom: mouse wheel");
                ui.label("Pan: middle mouse drag");
                ui.label("Bait: left click, goal: G, clear: C");
                ui.label("Rock: right click");
                if ui.button("Reset Camera").clicked() {
                    actions.reset_camera = true;
                }
                ui.label(format!("Zoom Level: {:.1} px/unit", zoom));
            });

            ui.collapsing("Statistics", |ui| {
                ui.label(format!("Tick: {}", stats.tick));
                ui.label(format!("Swimming: {}", stats.swimming_fish));
                ui.label(format!("Eaten: {}  Died: {}  Arrived: {}", tally.eaten, tally.died, tally.arrived));
                ui.label(format!("Neighbor links: {}", stats.neighbor_links));
                ui.label(format!("Update time: {:.2} ms", stats.elapsed.as_secs_f64() * 1000.0));
            });

            if ui.button("Clear Baits (C)").clicked() {
                actions.clear_baits = true;
            }
            ui.checkbox(&mut controls.show_debug, "Show Debug Info");
            ui.checkbox(&mut controls.paused, "Pause Simulation");
        });

    // Separation may not outgrow perception; keep the pair valid while dragging
    if params.flocking.separation_radius > params.flocking.perception_radius {
        params.flocking.separation_radius = params.flocking.perception_radius;
    }

    actions.params_changed = *params != before;
    actions
}

// Draw debug information on the screen
pub fn draw_debug_info(
    draw: &nannou::Draw,
    stats: &TickStats,
    tally: &EventTally,
    fps: f32,
    window_rect: nannou::geom::Rect,
) {
    let margin = 20.0;
    let line_height = 20.0;
    let lines = [
        format!("FPS: {:.1}", fps),
        format!("Update: {:.2} ms", stats.elapsed.as_secs_f64() * 1000.0),
        format!("Swimming: {}", stats.swimming_fish),
        format!("Links: {}", stats.neighbor_links),
        format!("Contacts: {}", stats.avoidance_contacts),
        format!("Corrections: {}", stats.corrections),
        format!("Eaten/Died/Home: {}/{}/{}", tally.eaten, tally.died, tally.arrived),
    ];

    let panel_width = 220.0;
    let panel_height = line_height * lines.len() as f32 + margin;
    draw.rect()
        .x_y(
            window_rect.right() - panel_width / 2.0,
            window_rect.top() - panel_height / 2.0,
        )
        .w_h(panel_width, panel_height)
        .color(nannou::color::rgba(0.0, 0.0, 0.0, 0.7));

    let text_x = window_rect.right() - panel_width / 2.0;
    let text_y = window_rect.top() - margin;
    for (i, text) in lines.iter().enumerate() {
        draw.text(text)
            .x_y(text_x, text_y - i as f32 * line_height)
            .w(panel_width - margin)
            .left_justify()
            .color(nannou::color::WHITE)
            .font_size(14);
    }
}
