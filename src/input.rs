/*
 * Input Module
 *
 * This module handles user input events for the viewer: bait and rock
 * placement under the cursor, camera panning and zooming, and the keyboard
 * shortcuts. Clicks over the egui panel are left to egui.
 */

use nannou::prelude::*;
use nannou::winit::event::{MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};

use crate::app::{self, Model};

pub fn mouse_moved(_app: &App, model: &mut Model, pos: Point2) {
    let new_pos = vec2(pos.x, pos.y);
    if model.camera.is_dragging {
        model.camera.drag(new_pos);
    }
    model.mouse_position = new_pos;
}

pub fn mouse_pressed(app: &App, model: &mut Model, button: MouseButton) {
    if model.egui.ctx().is_pointer_over_area() {
        return;
    }
    match button {
        MouseButton::Left => {
            let position = app::cursor_world(app, model);
            app::place_bait(model, position);
        }
        MouseButton::Right => {
            let position = app::cursor_world(app, model);
            app::place_rock(model, position);
        }
        MouseButton::Middle => model.camera.start_drag(model.mouse_position),
        MouseButton::Other(_) => {}
    }
}

pub fn mouse_released(_app: &App, model: &mut Model, button: MouseButton) {
    if button == MouseButton::Middle {
        model.camera.end_drag();
    }
}

pub fn mouse_wheel(app: &App, model: &mut Model, delta: MouseScrollDelta, _phase: TouchPhase) {
    let window_rect = app.window_rect();
    match delta {
        MouseScrollDelta::LineDelta(x, y) => {
            model.camera.zoom(vec2(x, y), model.mouse_position, window_rect);
        }
        MouseScrollDelta::PixelDelta(pos) => {
            let scroll = vec2(pos.x as f32, pos.y as f32) * 0.01;
            model.camera.zoom(scroll, model.mouse_position, window_rect);
        }
    }
}

pub fn key_pressed(app: &App, model: &mut Model, key: Key) {
    if model.egui.ctx().wants_keyboard_input() {
        return;
    }
    match key {
        Key::G => {
            let position = app::cursor_world(app, model);
            app::place_goal(model, position);
        }
        Key::C => app::clear_baits(model),
        Key::R => app::respawn(model),
        Key::Space => model.controls.paused = !model.controls.paused,
        Key::D => model.controls.show_debug = !model.controls.show_debug,
        _ => {}
    }
}

// Pass raw events to egui
pub fn raw_window_event(_app: &App, model: &mut Model, event: &WindowEvent) {
    model.egui.handle_raw_event(event);
}
