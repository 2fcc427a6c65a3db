// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Progressive drawing animation
//!
//! Curves grow from their initial states while a dot per member rides the
//! leading edge. After drawing, the camera orbits the frame center and the
//! final frame is held. Both render modes share this module; `Live` hands
//! the camera to the user's orbit controls and drives the orbit phase with
//! auto-rotation, `Offline` moves the camera on a fixed timeline.

use std::fmt::Write;

use serde::{Deserialize, Serialize};
use tracing::debug;

use lorenz_field::Ensemble;

use crate::color::{gradient, rgb8, BLUE, YELLOW};
use crate::config::{RenderConfig, RenderMode};
use crate::progress::PROGRESS_INDEX_JS;
use crate::template::{HtmlDocument, PanelPosition};

use super::{base_scene, legend_html, member_points, page_title, stats_html};

const LINE_WIDTH: f64 = 2.0;
const LINE_OPACITY: f64 = 0.7;
const DOT_RADIUS: f64 = 0.6;

/// Durations of the animation phases in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationTiming {
    /// Time to draw the full curves
    pub draw_secs: f64,
    /// Camera orbit rate in rad/s
    pub orbit_rate: f64,
    pub orbit_secs: f64,
    /// Pause on the final frame
    pub hold_secs: f64,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            draw_secs: 30.0,
            orbit_rate: std::f64::consts::FRAC_PI_2,
            orbit_secs: 20.0,
            hold_secs: 10.0,
        }
    }
}

/// Where the timeline is at a given elapsed time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelinePhase {
    Drawing { alpha: f64 },
    Orbiting { angle: f64 },
    Holding,
    Finished,
}

impl AnimationTiming {
    fn draw(&self) -> f64 {
        self.draw_secs.max(0.0)
    }

    fn orbit(&self) -> f64 {
        self.orbit_secs.max(0.0)
    }

    fn hold(&self) -> f64 {
        self.hold_secs.max(0.0)
    }

    pub fn total_secs(&self) -> f64 {
        self.draw() + self.orbit() + self.hold()
    }

    /// Phase at `elapsed` seconds since playback started.
    pub fn phase_at(&self, elapsed: f64) -> TimelinePhase {
        let elapsed = elapsed.max(0.0);
        let (draw, orbit, hold) = (self.draw(), self.orbit(), self.hold());
        if elapsed < draw {
            TimelinePhase::Drawing { alpha: elapsed / draw }
        } else if elapsed < draw + orbit {
            TimelinePhase::Orbiting {
                angle: (elapsed - draw) * self.orbit_rate,
            }
        } else if elapsed < draw + orbit + hold {
            TimelinePhase::Holding
        } else {
            TimelinePhase::Finished
        }
    }
}

/// Render `ensemble` as a self-contained animated HTML page.
pub fn render_animation(ensemble: &Ensemble, config: &RenderConfig, timing: &AnimationTiming) -> String {
    let colors = gradient(rgb8(BLUE), rgb8(YELLOW), ensemble.len());

    let mut scene = base_scene(config);
    for (i, (traj, &color)) in ensemble.iter().zip(&colors).enumerate() {
        let points = member_points(traj);
        let start = points.first().copied().unwrap_or([0.0; 3]);
        scene.add_marker(&format!("dot_{}", i), start, DOT_RADIUS, color);
        scene.add_polyline(&format!("curve_{}", i), points, color, LINE_WIDTH, LINE_OPACITY, Some(1));
    }

    let cam = &config.camera;
    let center = cam.frame_center;
    let mut timeline = String::new();
    timeline.push_str(PROGRESS_INDEX_JS);
    let _ = write!(timeline, r#"
const anim = {{
    start: null,
    draw: {draw}, orbit: {orbit}, hold: {hold}, rate: {rate},
    theta: {theta}, phi: {phi}, dist: {dist},
    center: [{cx}, {cy}, {cz}],
    duration: {duration},
}};
anim.total = anim.draw + anim.orbit + anim.hold;
const phaseEl = document.getElementById('phase-label');
const timeEl = document.getElementById('sim-time');
"#,
        draw = timing.draw(), orbit = timing.orbit(), hold = timing.hold(), rate = timing.orbit_rate,
        theta = cam.theta_deg.to_radians(), phi = cam.phi_deg.to_radians(),
        dist = cam.distance(&config.viewport),
        cx = center[0], cy = center[1], cz = center[2],
        duration = ensemble.duration(),
    );
    scene.add_custom_js(&timeline);

    let camera_js = match config.mode {
        RenderMode::Offline => r#"
    const orbitT = Math.min(Math.max(elapsed - anim.draw, 0), anim.orbit);
    const az = anim.theta + orbitT * anim.rate;
    camera.position.set(
        anim.center[0] + anim.dist * Math.sin(anim.phi) * Math.cos(az),
        anim.center[1] + anim.dist * Math.sin(anim.phi) * Math.sin(az),
        anim.center[2] + anim.dist * Math.cos(anim.phi));
    camera.lookAt(anim.center[0], anim.center[1], anim.center[2]);
"#,
        RenderMode::Live => r#"
    controls.autoRotate = elapsed >= anim.draw && elapsed < anim.draw + anim.orbit;
    controls.autoRotateSpeed = anim.rate * 60 / (2 * Math.PI);
"#,
    };

    let mut animation_js = String::from(r#"
    if (anim.start === null) anim.start = time;
    const elapsed = time - anim.start;
    const alpha = anim.draw > 0 ? Math.min(elapsed / anim.draw, 1) : 1;
    for (let i = 0; i < curves.length; i++) {
        const k = progressIndex(alpha, curves[i].userData.count);
        if (k < 0) continue;
        curves[i].geometry.setDrawRange(0, k + 1);
        const p = curves[i].geometry.attributes.position.array;
        markers[i].position.set(p[3 * k], p[3 * k + 1], p[3 * k + 2]);
    }
"#);
    animation_js.push_str(camera_js);
    animation_js.push_str(r#"
    if (phaseEl) {
        phaseEl.textContent = elapsed < anim.draw ? 'drawing'
            : elapsed < anim.draw + anim.orbit ? 'orbit'
            : elapsed < anim.total ? 'hold' : 'done';
    }
    if (timeEl) timeEl.textContent = (alpha * anim.duration).toFixed(2);
"#);

    let title = page_title(ensemble, config);
    let mut doc = HtmlDocument::new(&title, config.theme);
    doc.add_panel_with_width("title-panel", PanelPosition::TopLeft, &stats_html(&title, ensemble), "280px");
    doc.add_panel("legend", PanelPosition::TopRight, &legend_html(&colors));
    doc.add_panel(
        "timeline",
        PanelPosition::BottomCenter,
        r#"<div class="stat-row"><span class="key" id="phase-label">drawing</span><span class="val">t = <span id="sim-time">0.00</span></span></div>"#,
    );
    doc.set_canvas_size(config.canvas_size());
    doc.set_orbit_controls(config.mode == RenderMode::Live);
    doc.set_orbit_target(center);
    doc.set_scene_js(&scene.build_js());
    doc.set_animation_js(&animation_js);

    debug!(
        curves = ensemble.len(),
        mode = ?config.mode,
        total_secs = timing.total_secs(),
        "rendered animation page"
    );
    doc.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorenz_field::EnsembleBuilder;

    fn ensemble(n: usize) -> Ensemble {
        EnsembleBuilder::new(n).with_duration(2.0).with_dt(0.1).build().unwrap()
    }

    #[test]
    fn test_default_timing() {
        let t = AnimationTiming::default();
        assert_eq!(t.draw_secs, 30.0);
        assert_eq!(t.orbit_secs, 20.0);
        assert_eq!(t.hold_secs, 10.0);
        assert!((t.orbit_rate - std::f64::consts::PI / 2.0).abs() < 1e-15);
        assert_eq!(t.total_secs(), 60.0);
    }

    #[test]
    fn test_phase_progression() {
        let t = AnimationTiming::default();
        assert_eq!(t.phase_at(-1.0), TimelinePhase::Drawing { alpha: 0.0 });
        assert_eq!(t.phase_at(15.0), TimelinePhase::Drawing { alpha: 0.5 });
        match t.phase_at(32.0) {
            TimelinePhase::Orbiting { angle } => assert!((angle - std::f64::consts::PI).abs() < 1e-12),
            other => panic!("expected orbit, got {:?}", other),
        }
        assert_eq!(t.phase_at(55.0), TimelinePhase::Holding);
        assert_eq!(t.phase_at(60.0), TimelinePhase::Finished);
    }

    #[test]
    fn test_zero_draw_time_skips_drawing() {
        let t = AnimationTiming {
            draw_secs: 0.0,
            ..AnimationTiming::default()
        };
        assert!(matches!(t.phase_at(0.0), TimelinePhase::Orbiting { .. }));
    }

    #[test]
    fn test_offline_animation_has_fixed_camera_timeline() {
        let html = render_animation(&ensemble(10), &RenderConfig::default(), &AnimationTiming::default());
        assert!(html.contains("function progressIndex(alpha, n)"));
        assert!(html.contains("setDrawRange(0, k + 1)"));
        assert!(html.contains("camera.lookAt(anim.center[0]"));
        assert!(!html.contains("OrbitControls"));
        for i in 0..10 {
            assert!(html.contains(&format!("m.name = 'dot_{}'", i)));
        }
    }

    #[test]
    fn test_live_animation_enables_controls() {
        let cfg = RenderConfig::default().with_mode(RenderMode::Live);
        let html = render_animation(&ensemble(3), &cfg, &AnimationTiming::default());
        assert!(html.contains("OrbitControls"));
        assert!(html.contains("controls.autoRotate ="));
        assert!(!html.contains("camera.lookAt(anim.center[0]"));
    }

    #[test]
    fn test_curves_drawn_translucent() {
        let html = render_animation(&ensemble(2), &RenderConfig::default(), &AnimationTiming::default());
        assert_eq!(html.matches("linewidth: 2, transparent: true, opacity: 0.7").count(), 2);
    }

    #[test]
    fn test_gradient_runs_blue_to_yellow() {
        let html = render_animation(&ensemble(4), &RenderConfig::default(), &AnimationTiming::default());
        assert!(html.contains("0x58c4dd"));
        assert!(html.contains("0xffff00"));
        assert!(html.contains("geo.setDrawRange(0, 1)"));
    }

    #[test]
    fn test_single_curve_uses_start_color() {
        let html = render_animation(&ensemble(1), &RenderConfig::default(), &AnimationTiming::default());
        assert!(html.contains("0x58c4dd"));
        assert!(!html.contains("0xffff00"));
    }
}
