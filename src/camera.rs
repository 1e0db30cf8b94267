/*
 * Camera Module
 *
 * This module defines the Camera struct that handles zooming and panning
 * of the top-down view. The viewer looks straight down the Y axis: world X
 * maps to screen right and world -Z (a fish's forward) maps to screen up.
 * Zoom is measured in pixels per world unit.
 */

use nannou::prelude::*;

pub struct Camera {
    /// Plan-view point shown at the window center.
    pub position: Vec2,
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub is_dragging: bool,
    pub last_cursor_pos: Vec2,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 20.0,
            min_zoom: 2.0,
            max_zoom: 200.0,
            is_dragging: false,
            last_cursor_pos: Vec2::ZERO,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // Project a world position onto the plan view
    pub fn plan(x: f32, z: f32) -> Vec2 {
        vec2(x, -z)
    }

    // Plan view point back to world (x, z)
    pub fn unplan(point: Vec2) -> (f32, f32) {
        (point.x, -point.y)
    }

    // Convert a point from plan space to screen space
    pub fn world_to_screen(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - self.position) * self.zoom + window_rect.xy()
    }

    // Convert a point from screen space to plan space
    pub fn screen_to_world(&self, point: Vec2, window_rect: Rect) -> Vec2 {
        (point - window_rect.xy()) / self.zoom + self.position
    }

    pub fn world_length(&self, length: f32) -> f32 {
        length * self.zoom
    }

    // Zoom around the cursor so the point under it stays put
    pub fn zoom(&mut self, scroll_delta: Vec2, cursor_position: Vec2, window_rect: Rect) {
        let zoom_factor = 1.0 + scroll_delta.y * 0.1;
        let before = self.screen_to_world(cursor_position, window_rect);
        self.zoom = (self.zoom * zoom_factor).clamp(self.min_zoom, self.max_zoom);
        let after = self.screen_to_world(cursor_position, window_rect);
        self.position += before - after;
    }

    pub fn start_drag(&mut self, position: Vec2) {
        self.last_cursor_pos = position;
        self.is_dragging = true;
    }

    pub fn drag(&mut self, position: Vec2) {
        if self.is_dragging {
            let delta = position - self.last_cursor_pos;
            if delta.length_squared() > 0.0 {
                self.position -= delta / self.zoom;
                self.last_cursor_pos = position;
            }
        }
    }

    pub fn end_drag(&mut self) {
        self.is_dragging = false;
    }
}
