// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Render configuration passed explicitly to every renderer.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::template::Theme;

/// Per-axis tick limit; denser steps draw the bare axis.
const MAX_TICKS: i64 = 1000;

/// Output surface size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    /// Fill the browser window instead of a fixed-size canvas
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fullscreen: false,
        }
    }
}

/// How an animation is played back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Fixed camera-driven timeline, suitable for screen capture
    #[default]
    Offline,
    /// Same timeline with user orbit controls enabled
    Live,
}

/// Axis ranges of the fixed 3D frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub x_range: [f64; 2],
    pub y_range: [f64; 2],
    pub z_range: [f64; 2],
    pub tick_step: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x_range: [-30.0, 30.0],
            y_range: [-30.0, 30.0],
            z_range: [0.0, 50.0],
            tick_step: 5.0,
        }
    }
}

impl Viewport {
    /// Largest extent over the three axes.
    pub fn span(&self) -> f64 {
        [self.x_range, self.y_range, self.z_range]
            .iter()
            .map(|r| (r[1] - r[0]).abs())
            .fold(0.0, f64::max)
    }

    /// Tick positions inside `range`, multiples of `tick_step`, excluding 0.
    pub fn ticks(&self, range: [f64; 2]) -> Vec<f64> {
        if self.tick_step.is_nan() || self.tick_step <= 0.0 || !range[0].is_finite() || !range[1].is_finite() {
            return Vec::new();
        }
        let lo = range[0].min(range[1]);
        let hi = range[0].max(range[1]);
        let first = (lo / self.tick_step).ceil() as i64;
        let last = (hi / self.tick_step).floor() as i64;
        if last.saturating_sub(first) >= MAX_TICKS {
            warn!(tick_step = self.tick_step, lo, hi, "tick step too fine for axis range, skipping ticks");
            return Vec::new();
        }
        (first..=last)
            .filter(|&k| k != 0)
            .map(|k| k as f64 * self.tick_step)
            .collect()
    }
}

/// Spherical camera placement around `frame_center` with z up.
///
/// `phi_deg` is measured from the +z axis, `theta_deg` around it from +x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOrientation {
    pub theta_deg: f64,
    pub phi_deg: f64,
    pub zoom: f64,
    pub frame_center: [f64; 3],
}

impl Default for CameraOrientation {
    fn default() -> Self {
        Self {
            theta_deg: 135.0,
            phi_deg: 75.0,
            zoom: 0.8,
            frame_center: [0.0, 0.0, 3.0],
        }
    }
}

impl CameraOrientation {
    /// Distance from `frame_center` that frames `viewport` at this zoom.
    pub fn distance(&self, viewport: &Viewport) -> f64 {
        let zoom = if self.zoom > 0.0 { self.zoom } else { 1.0 };
        1.2 * viewport.span() / zoom
    }

    /// Camera position after rotating the azimuth by `extra_azimuth` radians.
    pub fn position_at(&self, viewport: &Viewport, extra_azimuth: f64) -> [f64; 3] {
        let d = self.distance(viewport);
        let theta = self.theta_deg.to_radians() + extra_azimuth;
        let phi = self.phi_deg.to_radians();
        let c = self.frame_center;
        [
            c[0] + d * phi.sin() * theta.cos(),
            c[1] + d * phi.sin() * theta.sin(),
            c[2] + d * phi.cos(),
        ]
    }

    pub fn position(&self, viewport: &Viewport) -> [f64; 3] {
        self.position_at(viewport, 0.0)
    }
}

/// Everything a renderer needs besides the ensemble itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub window: WindowConfig,
    pub mode: RenderMode,
    /// Page title; renderers fall back to one naming σ, ρ, β
    pub title: Option<String>,
    pub theme: Theme,
    pub viewport: Viewport,
    pub camera: CameraOrientation,
}

impl RenderConfig {
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Fixed canvas size, or `None` when the page should fill the window.
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        if self.window.fullscreen {
            None
        } else {
            Some((self.window.width, self.window.height))
        }
    }
}
