// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! HTML document template for attractor pages.
//!
//! Generates self-contained HTML documents with embedded Three.js,
//! optional OrbitControls, and HUD overlay panels.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

/// Position anchor for HUD panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomCenter,
}

impl PanelPosition {
    fn css(&self) -> &'static str {
        match self {
            Self::TopLeft => "top: 10px; left: 10px;",
            Self::TopRight => "top: 10px; right: 10px;",
            Self::BottomLeft => "bottom: 10px; left: 10px;",
            Self::BottomCenter => "bottom: 10px; left: 50%; transform: translateX(-50%);",
        }
    }
}

/// A HUD overlay panel rendered on top of the 3D scene.
#[derive(Debug, Clone)]
pub struct HudPanel {
    pub id: String,
    pub position: PanelPosition,
    pub content_html: String,
    pub width: Option<String>,
}

/// Page color theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn bg_color(&self) -> &'static str {
        match self {
            Self::Dark => "#000000",
            Self::Light => "#f0f0f5",
        }
    }

    pub fn text_color(&self) -> &'static str {
        match self {
            Self::Dark => "#e0e0e0",
            Self::Light => "#1a1a2e",
        }
    }

    pub fn panel_bg(&self) -> &'static str {
        match self {
            Self::Dark => "rgba(10, 10, 20, 0.85)",
            Self::Light => "rgba(240, 240, 245, 0.9)",
        }
    }

    pub fn accent_color(&self) -> &'static str {
        match self {
            Self::Dark => "#58c4dd",
            Self::Light => "#0066cc",
        }
    }

    /// Scene background as a Three.js hex literal.
    pub fn scene_bg_hex(&self) -> &'static str {
        match self {
            Self::Dark => "0x000000",
            Self::Light => "0xf0f0f5",
        }
    }

    /// Axis and tick color as a Three.js hex literal.
    pub fn axis_hex(&self) -> &'static str {
        match self {
            Self::Dark => "0xbbbbbb",
            Self::Light => "0x444455",
        }
    }
}

/// Escape text for inclusion in HTML element content or attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Builder for self-contained HTML visualization documents.
pub struct HtmlDocument {
    title: String,
    theme: Theme,
    panels: Vec<HudPanel>,
    scene_js: String,
    animation_js: String,
    canvas_size: Option<(u32, u32)>,
    use_orbit_controls: bool,
    orbit_target: [f64; 3],
}

impl HtmlDocument {
    pub fn new(title: &str, theme: Theme) -> Self {
        Self {
            title: title.to_string(),
            theme,
            panels: Vec::new(),
            scene_js: String::new(),
            animation_js: String::new(),
            canvas_size: None,
            use_orbit_controls: true,
            orbit_target: [0.0, 0.0, 0.0],
        }
    }

    pub fn add_panel(&mut self, id: &str, position: PanelPosition, content: &str) {
        self.panels.push(HudPanel {
            id: id.to_string(),
            position,
            content_html: content.to_string(),
            width: None,
        });
    }

    pub fn add_panel_with_width(&mut self, id: &str, position: PanelPosition, content: &str, width: &str) {
        self.panels.push(HudPanel {
            id: id.to_string(),
            position,
            content_html: content.to_string(),
            width: Some(width.to_string()),
        });
    }

    pub fn set_scene_js(&mut self, js: &str) {
        self.scene_js = js.to_string();
    }

    pub fn set_animation_js(&mut self, js: &str) {
        self.animation_js = js.to_string();
    }

    /// Fixed canvas size in pixels; `None` fills the window.
    pub fn set_canvas_size(&mut self, size: Option<(u32, u32)>) {
        self.canvas_size = size;
    }

    pub fn set_orbit_controls(&mut self, enabled: bool) {
        self.use_orbit_controls = enabled;
    }

    /// Point the orbit controls pivot at `target`.
    pub fn set_orbit_target(&mut self, target: [f64; 3]) {
        self.orbit_target = target;
    }

    /// Render the complete self-contained HTML document.
    pub fn render(&self) -> String {
        let mut html = String::with_capacity(32768 + self.scene_js.len());

        let _ = write!(html, r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
"#, title = escape_html(&self.title));

        html.push_str(r#"<script src="https://cdnjs.cloudflare.com/ajax/libs/three.js/r128/three.min.js"></script>
"#);
        if self.use_orbit_controls {
            html.push_str(r#"<script src="https://cdn.jsdelivr.net/npm/three@0.128.0/examples/js/controls/OrbitControls.js"></script>
"#);
        }

        let canvas_layout = match self.canvas_size {
            Some((w, h)) => format!("top: 0; left: 0; width: {}px; height: {}px;", w, h),
            None => "top: 0; left: 0; width: 100%; height: 100%;".to_string(),
        };

        let _ = write!(html, r#"<style>
* {{ margin: 0; padding: 0; box-sizing: border-box; }}
body {{
    background: {bg};
    color: {text};
    font-family: 'Segoe UI', 'Helvetica Neue', Arial, sans-serif;
    overflow: hidden;
}}
#canvas-container {{
    position: fixed;
    {canvas_layout}
}}
.hud-panel {{
    position: absolute;
    background: {panel_bg};
    border: 1px solid {accent}44;
    border-radius: 8px;
    padding: 12px 16px;
    font-size: 13px;
    line-height: 1.5;
    z-index: 10;
    box-shadow: 0 4px 24px rgba(0, 0, 0, 0.4);
}}
.hud-panel h3 {{
    color: {accent};
    font-size: 12px;
    letter-spacing: 1px;
    margin-bottom: 6px;
    font-weight: 600;
}}
.stat-row {{
    display: flex;
    justify-content: space-between;
    gap: 12px;
    padding: 2px 0;
}}
.stat-row .key {{ color: {text}88; }}
.stat-row .val {{ color: {accent}; font-weight: 600; font-variant-numeric: tabular-nums; }}
.color-legend {{
    display: flex;
    align-items: center;
    gap: 6px;
    padding: 1px 0;
}}
.color-legend .swatch {{
    width: 18px;
    height: 4px;
    border-radius: 2px;
}}
</style>
"#,
            bg = self.theme.bg_color(),
            text = self.theme.text_color(),
            panel_bg = self.theme.panel_bg(),
            accent = self.theme.accent_color(),
            canvas_layout = canvas_layout,
        );

        html.push_str("</head>\n<body>\n");
        html.push_str("<div id=\"canvas-container\"></div>\n");

        for panel in &self.panels {
            let width_css = panel.width.as_deref().map(|w| format!("width: {};", w)).unwrap_or_default();
            let _ = write!(html, r#"<div id="{id}" class="hud-panel" style="{pos} {width}">
{content}
</div>
"#,
                id = panel.id,
                pos = panel.position.css(),
                width = width_css,
                content = panel.content_html,
            );
        }

        let _ = write!(html, r#"<script>
// Scene setup
const container = document.getElementById('canvas-container');
const scene = new THREE.Scene();
scene.background = new THREE.Color({bg});

const camera = new THREE.PerspectiveCamera(45, container.clientWidth / container.clientHeight, 0.1, 2000);
camera.up.set(0, 0, 1);

const renderer = new THREE.WebGLRenderer({{ antialias: true, preserveDrawingBuffer: true }});
renderer.setSize(container.clientWidth, container.clientHeight);
renderer.setPixelRatio(window.devicePixelRatio);
container.appendChild(renderer.domElement);
"#,
            bg = self.theme.scene_bg_hex(),
        );

        html.push_str("\n// === Scene Content ===\n");
        html.push_str(&self.scene_js);

        // Controls read camera.up when constructed, so they come after the scene camera setup
        if self.use_orbit_controls {
            let _ = write!(html, r#"
const controls = new THREE.OrbitControls(camera, renderer.domElement);
controls.target.set({tx}, {ty}, {tz});
controls.enableDamping = true;
controls.dampingFactor = 0.05;
controls.update();
"#,
                tx = self.orbit_target[0], ty = self.orbit_target[1], tz = self.orbit_target[2],
            );
        }

        let _ = write!(html, r#"
// === Animation Loop ===
function animate() {{
    requestAnimationFrame(animate);
    const time = performance.now() * 0.001;
{animation}
{controls}
    renderer.render(scene, camera);
}}

// Resize handler
window.addEventListener('resize', () => {{
    camera.aspect = container.clientWidth / container.clientHeight;
    camera.updateProjectionMatrix();
    renderer.setSize(container.clientWidth, container.clientHeight);
}});

animate();
</script>
</body>
</html>"#,
            controls = if self.use_orbit_controls { "    controls.update();" } else { "" },
            animation = self.animation_js,
        );

        html
    }
}
