// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

pub mod animation;
pub mod interactive;

pub use animation::{render_animation, AnimationTiming, TimelinePhase};
pub use interactive::render_interactive;

use std::fmt::Write;

use lorenz_field::{Ensemble, SystemParameters, Trajectory};

use crate::color::{rgb_to_hex, Rgb};
use crate::config::RenderConfig;
use crate::scene::SceneBuilder;
use crate::template::escape_html;

/// Default page title naming the system parameters.
pub fn default_title(p: &SystemParameters) -> String {
    format!("Lorenz Attractor (σ={}, ρ={}, β={:.3})", p.sigma, p.rho, p.beta)
}

pub(crate) fn page_title(ensemble: &Ensemble, config: &RenderConfig) -> String {
    config
        .title
        .clone()
        .unwrap_or_else(|| default_title(&ensemble.parameters()))
}

pub(crate) fn member_points(traj: &Trajectory) -> Vec<[f64; 3]> {
    traj.samples().iter().map(|s| s.to_array()).collect()
}

/// Scene with the configured camera and fixed axes, no curves yet.
pub(crate) fn base_scene(config: &RenderConfig) -> SceneBuilder {
    let mut scene = SceneBuilder::new();
    scene.set_camera(config.camera.position(&config.viewport), config.camera.frame_center);
    let label = if config.theme == crate::template::Theme::Dark {
        (0.9, 0.9, 0.9)
    } else {
        (0.2, 0.2, 0.25)
    };
    scene.set_axes(config.viewport, config.theme.axis_hex(), label);
    scene
}

pub(crate) fn stats_html(title: &str, ensemble: &Ensemble) -> String {
    let p = ensemble.parameters();
    let mut html = String::new();
    let _ = write!(html, "<h3>{}</h3>", escape_html(title));
    let rows = [
        ("σ", format!("{}", p.sigma)),
        ("ρ", format!("{}", p.rho)),
        ("β", format!("{:.4}", p.beta)),
        ("Curves", ensemble.len().to_string()),
        ("Duration", format!("{}", ensemble.duration())),
        ("dt", format!("{}", ensemble.dt())),
        ("Samples", ensemble.total_samples().to_string()),
    ];
    for (key, val) in rows {
        let _ = write!(html, r#"<div class="stat-row"><span class="key">{}</span><span class="val">{}</span></div>"#, key, val);
    }
    html
}

/// One clickable swatch + "Curve i" entry per member, numbered from 1.
pub(crate) fn legend_html(colors: &[Rgb]) -> String {
    let mut html = String::new();
    for (i, c) in colors.iter().enumerate() {
        let _ = write!(html, r#"<div class="color-legend legend-entry" data-index="{i}" style="cursor: pointer;"><span class="swatch" style="background: {hex};"></span><span>Curve {label}</span></div>"#,
            i = i,
            label = i + 1,
            hex = rgb_to_hex(*c),
        );
    }
    html
}

/// Legend clicks toggle the matching curve and its marker.
pub(crate) const LEGEND_TOGGLE_JS: &str = r#"
document.querySelectorAll('.legend-entry').forEach((el) => {
    el.addEventListener('click', () => {
        const i = Number(el.dataset.index);
        if (!curves[i]) return;
        curves[i].visible = !curves[i].visible;
        if (markers[i]) markers[i].visible = curves[i].visible;
        el.style.opacity = curves[i].visible ? 1.0 : 0.4;
    });
});
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_title() {
        let t = default_title(&SystemParameters::CANONICAL);
        assert_eq!(t, "Lorenz Attractor (σ=10, ρ=28, β=2.667)");
    }

    #[test]
    fn test_legend_entries() {
        let html = legend_html(&[(1.0, 0.0, 0.0), (0.0, 0.0, 1.0)]);
        assert!(html.contains(r#"data-index="0" style="cursor: pointer;"><span class="swatch" style="background: #ff0000;"></span><span>Curve 1</span>"#));
        assert!(html.contains(r#"data-index="1" style="cursor: pointer;"><span class="swatch" style="background: #0000ff;"></span><span>Curve 2</span>"#));
        assert!(!html.contains("Curve 0"));
    }
}
