/*
 * Application Module
 *
 * This module defines the viewer model and its per-frame update. The
 * simulation itself lives in `FlockingEngine`; the viewer only feeds it
 * frame deltas, forwards user edits and tallies the events it emits.
 *
 * Controls:
 * - Left click: drop bait
 * - Right click: place a random rock column
 * - Middle drag: pan, wheel: zoom
 * - G: goal bait at the cursor, C: clear baits, R: respawn
 * - Space: pause, D: toggle debug overlay
 */

use std::path::PathBuf;
use std::time::Duration;

use nannou::prelude::*;
use nannou_egui::Egui;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::bait::{Bait, BaitId};
use crate::camera::Camera;
use crate::events::SimEvent;
use crate::flock::{FlockingEngine, GoalZone};
use crate::input::{key_pressed, mouse_moved, mouse_pressed, mouse_released, mouse_wheel, raw_window_event};
use crate::obstacle::Obstacle;
use crate::params::SimulationParams;
use crate::renderer::view;
use crate::spawn::SpawnVolume;
use crate::ui::{self, ViewerControls};

/// Radius of the goal zone placed with the goal bait.
pub const GOAL_RADIUS: f32 = 1.5;
/// Gap kept between the spawn volume and the walls.
const SPAWN_MARGIN: f32 = 1.0;

/// Running totals of everything the engine reported.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventTally {
    pub eaten: usize,
    pub died: usize,
    pub arrived: usize,
}

impl EventTally {
    pub fn record(&mut self, event: &SimEvent) {
        match *event {
            SimEvent::BaitConsumed { fish, position, .. } => {
                self.eaten += 1;
                debug!(fish = fish.0, ?position, "bait eaten");
            }
            SimEvent::FishDied { fish, predator } => {
                self.died += 1;
                info!(fish = fish.0, predator = ?predator.map(|p| p.0), "fish died");
            }
            SimEvent::FishReachedGoal { fish } => {
                self.arrived += 1;
                info!(fish = fish.0, "fish reached the goal");
            }
        }
    }
}

// Main model for the application
pub struct Model {
    pub engine: FlockingEngine,
    /// Working copy edited by the UI, pushed to the engine on change.
    pub params: SimulationParams,
    pub controls: ViewerControls,
    pub egui: Egui,
    pub camera: Camera,
    pub mouse_position: Vec2,
    pub goal_bait: Option<BaitId>,
    pub tally: EventTally,
    pub fps: f32,
    pub frame_time: Duration,
}

// Parameters come from the JSON file named on the command line, if any
fn load_params() -> SimulationParams {
    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        return SimulationParams::default();
    };
    match SimulationParams::from_json_file(&path) {
        Ok(params) => {
            info!(path = %path.display(), "loaded simulation parameters");
            params
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "falling back to default parameters");
            SimulationParams::default()
        }
    }
}

// Initialize the model
pub fn model(app: &App) -> Model {
    let (window_width, window_height) = app
        .primary_monitor()
        .map(|monitor| {
            let size = monitor.size();
            (size.width as f32 * 0.8, size.height as f32 * 0.8)
        })
        .unwrap_or((1280.0, 800.0));

    let window_id = app
        .new_window()
        .title("Shoal")
        .size(window_width as u32, window_height as u32)
        .view(view)
        .mouse_moved(mouse_moved)
        .mouse_pressed(mouse_pressed)
        .mouse_released(mouse_released)
        .mouse_wheel(mouse_wheel)
        .key_pressed(key_pressed)
        .raw_event(raw_window_event)
        .build()
        .expect("failed to build the main window");
    let window = app.window(window_id).expect("main window closed during setup");
    let egui = Egui::from_window(&window);

    let params = load_params();
    let engine = match FlockingEngine::new(params.clone()) {
        Ok(engine) => engine,
        Err(err) => {
            warn!(%err, "invalid parameters, using defaults");
            FlockingEngine::new(SimulationParams::default())
                .expect("default parameters are valid")
        }
    };

    let mut model = Model {
        params: engine.params().clone(),
        engine,
        controls: ViewerControls::default(),
        egui,
        camera: Camera::new(),
        mouse_position: Vec2::ZERO,
        goal_bait: None,
        tally: EventTally::default(),
        fps: 0.0,
        frame_time: Duration::ZERO,
    };
    respawn(&mut model);
    model
}

// Update the model
pub fn update(app: &App, model: &mut Model, update: Update) {
    model.fps = app.fps();
    model.frame_time = update.since_last;

    let actions = ui::update_ui(
        &mut model.egui,
        &mut model.params,
        &mut model.controls,
        model.engine.last_stats(),
        &model.tally,
        model.camera.zoom,
    );

    if actions.params_changed {
        if let Err(err) = model.engine.set_params(model.params.clone()) {
            warn!(%err, "rejected parameter change");
            model.params = model.engine.params().clone();
        }
    }
    if actions.respawn {
        respawn(model);
    }
    if actions.clear_baits {
        clear_baits(model);
    }
    if actions.clear_obstacles {
        model.engine.clear_obstacles();
    }
    if actions.reset_camera {
        model.camera.reset();
    }

    if !model.controls.paused {
        model.engine.update(update.since_last.as_secs_f32());
    }

    for event in model.engine.drain_events() {
        model.tally.record(&event);
    }
}

// Replace the school and predators with freshly spawned ones
pub fn respawn(model: &mut Model) {
    let volume = SpawnVolume::from_bounds(&model.engine.params().bounds, SPAWN_MARGIN);
    model.engine.clear_school();
    model.engine.clear_predators();
    model.engine.spawn_school(model.controls.school_size, &volume);
    model.engine.spawn_predators(model.controls.predator_count, &volume);
    model.tally = EventTally::default();
}

pub fn clear_baits(model: &mut Model) {
    model.engine.clear_baits();
    model.engine.set_goal_zone(None);
    model.goal_bait = None;
}

// Cursor position on the mid-depth plane
pub fn cursor_world(app: &App, model: &Model) -> ::glam::Vec3 {
    let plan = model.camera.screen_to_world(model.mouse_position, app.window_rect());
    let (x, z) = Camera::unplan(plan);
    let bounds = &model.engine.params().bounds;
    bounds.clamp(::glam::Vec3::new(x, bounds.center().y, z))
}

pub fn place_bait(model: &mut Model, position: ::glam::Vec3) {
    if let Err(err) = model.engine.add_bait(Bait::new(position)) {
        warn!(%err, "could not place bait");
    }
}

// Move the goal: one goal bait and a matching goal zone
pub fn place_goal(model: &mut Model, position: ::glam::Vec3) {
    if let Some(previous) = model.goal_bait.take() {
        // Already gone if the baits were cleared
        let _ = model.engine.remove_bait(previous);
    }
    match model.engine.add_bait(Bait::goal(position)) {
        Ok(id) => {
            model.goal_bait = Some(id);
            model.engine.set_goal_zone(Some(GoalZone {
                center: position,
                radius: GOAL_RADIUS,
            }));
        }
        Err(err) => warn!(%err, "could not place goal"),
    }
}

// A randomly stretched and turned column spanning the water depth
pub fn place_rock(model: &mut Model, position: ::glam::Vec3) {
    let mut rng = rand::thread_rng();
    let bounds = model.engine.params().bounds;
    let radius = rng.gen_range(0.8..2.0);
    let height = (bounds.max_y - bounds.min_y) * 0.5 / radius + 0.5;
    let scale = ::glam::Vec3::new(rng.gen_range(0.6..1.8), height, rng.gen_range(0.6..1.8));
    let rotation = ::glam::Quat::from_rotation_y(rng.gen_range(0.0..std::f32::consts::TAU));

    let rock = Obstacle::ellipsoid(position, radius, scale, rotation);
    match model.engine.add_obstacle(rock) {
        Ok(_) => debug!(?position, radius, "rock placed"),
        Err(err) => warn!(%err, "could not place rock"),
    }
}
