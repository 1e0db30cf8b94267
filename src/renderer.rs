/*
 * Renderer Module
 *
 * This module draws the top-down view: the world footprint, rocks, baits,
 * the goal zone, the school and the predators. Depth is shown only through
 * brightness; everything is projected onto the X/Z plane.
 */

use nannou::prelude::*;
use tracing::warn;

use crate::app::Model;
use crate::camera::Camera;
use crate::fish::Fish;
use crate::predator::Predator;
use crate::ui;

/// Drawn fish length in world units.
const FISH_LENGTH: f32 = 0.5;

// Heading angle on screen for a world velocity
fn plan_angle(velocity: ::glam::Vec3) -> f32 {
    let heading = Camera::plan(velocity.x, velocity.z);
    heading.y.atan2(heading.x)
}

// Arrow-head triangle pointing along +X, sized in pixels
fn arrow_points(length: f32) -> [Point2; 3] {
    [
        pt2(length * 0.5, 0.0),
        pt2(-length * 0.5, length * 0.25),
        pt2(-length * 0.5, -length * 0.25),
    ]
}

// Brighter near the surface
fn depth_shade(y: f32, min_y: f32, max_y: f32) -> f32 {
    let t = ((y - min_y) / (max_y - min_y)).clamp(0.0, 1.0);
    0.55 + 0.45 * t
}

fn draw_fish(draw: &Draw, model: &Model, window_rect: Rect, fish: &Fish) {
    let bounds = &model.engine.params().bounds;
    let screen = model.camera.world_to_screen(Camera::plan(fish.position.x, fish.position.z), window_rect);
    let shade = depth_shade(fish.position.y, bounds.min_y, bounds.max_y);
    let color = if fish.has_reached_goal() {
        rgba(0.35 * shade, 0.9 * shade, 0.45 * shade, 1.0)
    } else {
        rgba(0.75 * shade, 0.85 * shade, 0.95 * shade, 1.0)
    };
    let forward = fish.rotation * -::glam::Vec3::Z;

    draw.polygon()
        .color(color)
        .points(arrow_points(model.camera.world_length(FISH_LENGTH)))
        .xy(screen)
        .rotate(plan_angle(forward));
}

fn draw_predator(draw: &Draw, model: &Model, window_rect: Rect, predator: &Predator) {
    let screen = model
        .camera
        .world_to_screen(Camera::plan(predator.position.x, predator.position.z), window_rect);
    let length = model.camera.world_length(predator.bounding_radius * 2.0);

    draw.polygon()
        .color(rgb(0.9, 0.3, 0.25))
        .points(arrow_points(length))
        .xy(screen)
        .rotate(plan_angle(predator.heading()));

    if model.controls.show_debug {
        draw.ellipse()
            .xy(screen)
            .radius(model.camera.world_length(predator.detection_radius))
            .no_fill()
            .stroke(rgba(0.9, 0.3, 0.25, 0.4))
            .stroke_weight(1.0);
        draw.ellipse()
            .xy(screen)
            .radius(model.camera.world_length(predator.capture_radius))
            .no_fill()
            .stroke(RED)
            .stroke_weight(1.0);
    }
}

// Perception and separation rings plus velocity for the first swimming fish
fn draw_focus_fish(draw: &Draw, model: &Model, window_rect: Rect) {
    let Some(fish) = model.engine.school().iter().find(|fish| fish.is_active()) else {
        return;
    };
    let flocking = &model.engine.params().flocking;
    let screen = model.camera.world_to_screen(Camera::plan(fish.position.x, fish.position.z), window_rect);

    draw.ellipse()
        .xy(screen)
        .radius(model.camera.world_length(flocking.perception_radius))
        .no_fill()
        .stroke(GREEN)
        .stroke_weight(1.0);
    draw.ellipse()
        .xy(screen)
        .radius(model.camera.world_length(flocking.separation_radius))
        .no_fill()
        .stroke(RED)
        .stroke_weight(1.0);

    let velocity = Camera::plan(fish.velocity.x, fish.velocity.z);
    draw.arrow()
        .start(screen)
        .end(screen + velocity * model.camera.zoom)
        .color(YELLOW)
        .stroke_weight(2.0);
}

// Render the model
pub fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    draw.background().color(rgb(0.02, 0.08, 0.16));

    let window_rect = app.window_rect();
    let engine = &model.engine;
    let bounds = &engine.params().bounds;

    // World footprint
    let corner_a = model.camera.world_to_screen(Camera::plan(-bounds.half_x, -bounds.half_z), window_rect);
    let corner_b = model.camera.world_to_screen(Camera::plan(bounds.half_x, bounds.half_z), window_rect);
    let world_rect = Rect::from_corners(corner_a, corner_b);
    draw.rect()
        .xy(world_rect.xy())
        .wh(world_rect.wh())
        .no_fill()
        .stroke_weight(1.0)
        .stroke(rgba(0.3, 0.5, 0.6, 1.0));

    // Rocks
    for obstacle in engine.obstacles().values() {
        let screen = model
            .camera
            .world_to_screen(Camera::plan(obstacle.position.x, obstacle.position.z), window_rect);
        let (half_x, half_z) = obstacle.footprint();
        draw.ellipse()
            .xy(screen)
            .w_h(model.camera.world_length(half_x * 2.0), model.camera.world_length(half_z * 2.0))
            .rotate(plan_angle(obstacle.rotation * ::glam::Vec3::X))
            .color(rgb(0.35, 0.3, 0.25));
    }

    // Goal zone
    if let Some(goal) = engine.goal_zone() {
        draw.ellipse()
            .xy(model.camera.world_to_screen(Camera::plan(goal.center.x, goal.center.z), window_rect))
            .radius(model.camera.world_length(goal.radius))
            .no_fill()
            .stroke(rgba(0.3, 0.9, 0.4, 0.8))
            .stroke_weight(2.0);
    }

    // Baits
    for (_, bait) in engine.baits().iter() {
        let color = if bait.goal {
            rgb(0.3, 0.9, 0.4)
        } else {
            rgb(1.0, 0.7, 0.2)
        };
        draw.ellipse()
            .xy(model.camera.world_to_screen(Camera::plan(bait.position.x, bait.position.z), window_rect))
            .radius(model.camera.world_length(0.2).max(2.0))
            .color(color);
    }

    for fish in engine.living_fish() {
        draw_fish(&draw, model, window_rect, fish);
    }
    for predator in engine.predators() {
        draw_predator(&draw, model, window_rect, predator);
    }

    if model.controls.show_debug {
        draw_focus_fish(&draw, model, window_rect);
        ui::draw_debug_info(&draw, engine.last_stats(), &model.tally, model.fps, window_rect);
    }

    if let Err(err) = draw.to_frame(app, &frame) {
        warn!(error = ?err, "failed to draw the scene");
    }
    if let Err(err) = model.egui.draw_to_frame(&frame) {
        warn!(error = ?err, "failed to draw the ui");
    }
}
