// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Interactive attractor page
//!
//! Every ensemble member is drawn in full as a viridis-colored polyline with
//! a marker on its initial state. The camera orbits freely around the frame
//! center and legend entries toggle individual curves.

use tracing::debug;

use lorenz_field::Ensemble;

use crate::color::viridis_palette;
use crate::config::RenderConfig;
use crate::template::{HtmlDocument, PanelPosition};

use super::{base_scene, legend_html, member_points, page_title, stats_html, LEGEND_TOGGLE_JS};

const LINE_WIDTH: f64 = 3.0;
const LINE_OPACITY: f64 = 0.7;
const MARKER_RADIUS: f64 = 0.5;

/// Render `ensemble` as a self-contained interactive HTML page.
pub fn render_interactive(ensemble: &Ensemble, config: &RenderConfig) -> String {
    let colors = viridis_palette(ensemble.len());

    let mut scene = base_scene(config);
    for (i, (traj, &color)) in ensemble.iter().zip(&colors).enumerate() {
        let points = member_points(traj);
        if let Some(&start) = points.first() {
            scene.add_marker(&format!("start_{}", i), start, MARKER_RADIUS, color);
        }
        scene.add_polyline(&format!("curve_{}", i), points, color, LINE_WIDTH, LINE_OPACITY, None);
    }
    scene.add_custom_js(LEGEND_TOGGLE_JS);

    let title = page_title(ensemble, config);
    let mut doc = HtmlDocument::new(&title, config.theme);
    doc.add_panel_with_width("title-panel", PanelPosition::TopLeft, &stats_html(&title, ensemble), "280px");
    doc.add_panel("legend", PanelPosition::TopRight, &legend_html(&colors));
    doc.set_canvas_size(config.canvas_size());
    doc.set_orbit_controls(true);
    doc.set_orbit_target(config.camera.frame_center);
    doc.set_scene_js(&scene.build_js());

    debug!(
        curves = ensemble.len(),
        samples = ensemble.total_samples(),
        "rendered interactive page"
    );
    doc.render()
}
