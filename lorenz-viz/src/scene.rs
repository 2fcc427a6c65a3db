// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Three.js scene builder for trajectory rendering.
//!
//! `SceneBuilder` accumulates curves, markers, axes and labels and serializes
//! them to JavaScript that constructs a Three.js scene. Curves land in a JS
//! array `curves` and markers in `markers`, in insertion order, so animation
//! code can address them by member index.

use std::fmt::Write;

use crate::color::{rgb_to_threejs_hex, Rgb};
use crate::config::Viewport;

/// A 3D polyline through trajectory samples.
#[derive(Debug, Clone)]
pub struct ScenePolyline {
    pub name: String,
    pub points: Vec<[f64; 3]>,
    pub color: Rgb,
    pub width: f64,
    pub opacity: f64,
    /// Initial number of drawn vertices; `None` draws all of them
    pub draw_count: Option<usize>,
}

/// A small sphere marking a single position.
#[derive(Debug, Clone)]
pub struct SceneMarker {
    pub name: String,
    pub position: [f64; 3],
    pub radius: f64,
    pub color: Rgb,
}

/// A text label in 3D space (rendered as a Sprite with canvas texture).
#[derive(Debug, Clone)]
pub struct SceneLabel {
    pub position: [f64; 3],
    pub text: String,
    pub color: Rgb,
    pub scale: f64,
}

/// Fixed x/y/z axes through the origin with tick marks.
#[derive(Debug, Clone)]
pub struct SceneAxes {
    pub viewport: Viewport,
    pub color_hex: String,
    pub tick_len: f64,
}

/// Camera configuration.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub position: [f64; 3],
    pub look_at: [f64; 3],
    pub fov: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [60.0, 60.0, 40.0],
            look_at: [0.0, 0.0, 0.0],
            fov: 45.0,
        }
    }
}

/// Format a coordinate for JS source. Non-finite values map to JS literals.
fn js_num(v: f64) -> String {
    if v.is_finite() {
        let s = format!("{:.4}", v);
        let s = s.trim_end_matches('0').trim_end_matches('.');
        if s.is_empty() || s == "-" || s == "-0" {
            "0".to_string()
        } else {
            s.to_string()
        }
    } else if v.is_nan() {
        "NaN".to_string()
    } else if v > 0.0 {
        "Infinity".to_string()
    } else {
        "-Infinity".to_string()
    }
}

/// Builder that accumulates Three.js scene objects and emits JavaScript.
///
/// Usage:
/// ```ignore
/// let mut scene = SceneBuilder::new();
/// scene.set_camera([60.0, 60.0, 40.0], [0.0, 0.0, 3.0]);
/// scene.add_polyline("curve_0", points, (0.3, 0.8, 0.9), 3.0, 0.7, None);
/// scene.add_marker("start_0", points[0], 0.4, (0.3, 0.8, 0.9));
/// let js = scene.build_js();
/// ```
#[derive(Debug, Default)]
pub struct SceneBuilder {
    camera: CameraConfig,
    polylines: Vec<ScenePolyline>,
    markers: Vec<SceneMarker>,
    labels: Vec<SceneLabel>,
    axes: Option<SceneAxes>,
    custom_js: Vec<String>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_camera(&mut self, position: [f64; 3], look_at: [f64; 3]) {
        self.camera.position = position;
        self.camera.look_at = look_at;
    }

    pub fn add_polyline(
        &mut self,
        name: &str,
        points: Vec<[f64; 3]>,
        color: Rgb,
        width: f64,
        opacity: f64,
        draw_count: Option<usize>,
    ) {
        self.polylines.push(ScenePolyline {
            name: name.to_string(),
            points,
            color,
            width,
            opacity,
            draw_count,
        });
    }

    pub fn add_marker(&mut self, name: &str, position: [f64; 3], radius: f64, color: Rgb) {
        self.markers.push(SceneMarker {
            name: name.to_string(),
            position,
            radius,
            color,
        });
    }

    pub fn add_label(&mut self, position: [f64; 3], text: &str, color: Rgb, scale: f64) {
        self.labels.push(SceneLabel {
            position,
            text: text.to_string(),
            color,
            scale,
        });
    }

    /// Draw axes over `viewport`, labeled at their positive ends.
    pub fn set_axes(&mut self, viewport: Viewport, color_hex: &str, label_color: Rgb) {
        let tick_len = (viewport.span() * 0.01).max(0.1);
        let label_off = tick_len * 4.0;
        self.add_label([viewport.x_range[1] + label_off, 0.0, 0.0], "x", label_color, 4.0);
        self.add_label([0.0, viewport.y_range[1] + label_off, 0.0], "y", label_color, 4.0);
        self.add_label([0.0, 0.0, viewport.z_range[1] + label_off], "z", label_color, 4.0);
        self.axes = Some(SceneAxes {
            viewport,
            color_hex: color_hex.to_string(),
            tick_len,
        });
    }

    pub fn add_custom_js(&mut self, js: &str) {
        self.custom_js.push(js.to_string());
    }

    /// Emit the complete Three.js scene construction as a JavaScript string.
    pub fn build_js(&self) -> String {
        let vertex_count: usize = self.polylines.iter().map(|p| p.points.len()).sum();
        let mut js = String::with_capacity(4096 + vertex_count * 32);

        let _ = write!(js, r#"
camera.position.set({cx}, {cy}, {cz});
camera.lookAt({lx}, {ly}, {lz});
camera.fov = {fov};
camera.updateProjectionMatrix();
const curves = [];
const markers = [];
"#,
            cx = js_num(self.camera.position[0]), cy = js_num(self.camera.position[1]), cz = js_num(self.camera.position[2]),
            lx = js_num(self.camera.look_at[0]), ly = js_num(self.camera.look_at[1]), lz = js_num(self.camera.look_at[2]),
            fov = self.camera.fov,
        );

        if let Some(axes) = &self.axes {
            self.build_axes_js(&mut js, axes);
        }

        for line in &self.polylines {
            self.build_polyline_js(&mut js, line);
        }

        for marker in &self.markers {
            self.build_marker_js(&mut js, marker);
        }

        for (i, label) in self.labels.iter().enumerate() {
            self.build_label_js(&mut js, label, i);
        }

        for chunk in &self.custom_js {
            js.push_str(chunk);
            js.push('\n');
        }

        js
    }

    fn build_polyline_js(&self, js: &mut String, line: &ScenePolyline) {
        let n = line.points.len();
        js.push_str("{\n    const pos = new Float32Array([");
        for (i, p) in line.points.iter().enumerate() {
            if i > 0 {
                js.push(',');
            }
            let _ = write!(js, "{},{},{}", js_num(p[0]), js_num(p[1]), js_num(p[2]));
        }
        js.push_str("]);\n");

        let draw_range = match line.draw_count {
            Some(k) => format!("    geo.setDrawRange(0, {});\n", k.min(n)),
            None => String::new(),
        };

        let _ = write!(js, r#"    const geo = new THREE.BufferGeometry();
    geo.setAttribute('position', new THREE.BufferAttribute(pos, 3));
{draw_range}    const mat = new THREE.LineBasicMaterial({{
        color: {color}, linewidth: {width}, transparent: true, opacity: {opacity}
    }});
    const line = new THREE.Line(geo, mat);
    line.name = '{name}';
    line.userData.count = {n};
    scene.add(line);
    curves.push(line);
}}
"#,
            draw_range = draw_range,
            color = rgb_to_threejs_hex(line.color),
            width = line.width,
            opacity = line.opacity,
            name = line.name.replace('\'', "\\'"),
            n = n,
        );
    }

    fn build_marker_js(&self, js: &mut String, m: &SceneMarker) {
        let _ = write!(js, r#"{{
    const geo = new THREE.SphereGeometry({r}, 16, 12);
    const mat = new THREE.MeshBasicMaterial({{ color: {color} }});
    const m = new THREE.Mesh(geo, mat);
    m.position.set({x}, {y}, {z});
    m.name = '{name}';
    scene.add(m);
    markers.push(m);
}}
"#,
            r = m.radius,
            color = rgb_to_threejs_hex(m.color),
            x = js_num(m.position[0]), y = js_num(m.position[1]), z = js_num(m.position[2]),
            name = m.name.replace('\'', "\\'"),
        );
    }

    fn build_axes_js(&self, js: &mut String, axes: &SceneAxes) {
        let v = &axes.viewport;
        let t = axes.tick_len;
        let mut segments: Vec<([f64; 3], [f64; 3])> = vec![
            ([v.x_range[0], 0.0, 0.0], [v.x_range[1], 0.0, 0.0]),
            ([0.0, v.y_range[0], 0.0], [0.0, v.y_range[1], 0.0]),
            ([0.0, 0.0, v.z_range[0]], [0.0, 0.0, v.z_range[1]]),
        ];
        segments.extend(v.ticks(v.x_range).into_iter().map(|x| ([x, -t, 0.0], [x, t, 0.0])));
        segments.extend(v.ticks(v.y_range).into_iter().map(|y| ([-t, y, 0.0], [t, y, 0.0])));
        segments.extend(v.ticks(v.z_range).into_iter().map(|z| ([-t, 0.0, z], [t, 0.0, z])));

        js.push_str("{\n    const axisPos = new Float32Array([");
        for (i, (a, b)) in segments.iter().enumerate() {
            if i > 0 {
                js.push(',');
            }
            let _ = write!(js, "{},{},{},{},{},{}",
                js_num(a[0]), js_num(a[1]), js_num(a[2]),
                js_num(b[0]), js_num(b[1]), js_num(b[2]),
            );
        }
        let _ = write!(js, r#"]);
    const axisGeo = new THREE.BufferGeometry();
    axisGeo.setAttribute('position', new THREE.BufferAttribute(axisPos, 3));
    const axisMat = new THREE.LineBasicMaterial({{ color: {color} }});
    const axes = new THREE.LineSegments(axisGeo, axisMat);
    axes.name = 'axes';
    scene.add(axes);
}}
"#, color = axes.color_hex);
    }

    fn build_label_js(&self, js: &mut String, label: &SceneLabel, idx: usize) {
        let _ = write!(js, r#"{{
    const canvas = document.createElement('canvas');
    canvas.width = 128; canvas.height = 128;
    const ctx = canvas.getContext('2d');
    ctx.fillStyle = 'rgba({r},{g},{b},0.9)';
    ctx.font = 'italic 72px serif';
    ctx.textAlign = 'center';
    ctx.fillText('{text}', 64, 88);
    const tex = new THREE.CanvasTexture(canvas);
    const mat = new THREE.SpriteMaterial({{ map: tex, transparent: true, depthWrite: false }});
    const sprite = new THREE.Sprite(mat);
    sprite.position.set({x}, {y}, {z});
    sprite.scale.set({scale}, {scale}, 1);
    sprite.name = 'label_{idx}';
    scene.add(sprite);
}}
"#,
            r = (label.color.0.clamp(0.0, 1.0) * 255.0).round() as u8,
            g = (label.color.1.clamp(0.0, 1.0) * 255.0).round() as u8,
            b = (label.color.2.clamp(0.0, 1.0) * 255.0).round() as u8,
            text = label.text.replace('\\', "\\\\").replace('\'', "\\'"),
            x = js_num(label.position[0]), y = js_num(label.position[1]), z = js_num(label.position[2]),
            scale = label.scale,
            idx = idx,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scene() {
        let scene = SceneBuilder::new();
        let js = scene.build_js();
        assert!(js.contains("camera.position.set"));
        assert!(js.contains("const curves = [];"));
        assert!(js.contains("const markers = [];"));
    }

    #[test]
    fn test_camera_config() {
        let mut scene = SceneBuilder::new();
        scene.set_camera([1.0, 2.0, 3.0], [4.0, 5.0, 6.5]);
        let js = scene.build_js();
        assert!(js.contains("camera.position.set(1, 2, 3)"));
        assert!(js.contains("camera.lookAt(4, 5, 6.5)"));
    }

    #[test]
    fn test_js_num_formatting() {
        assert_eq!(js_num(1.0), "1");
        assert_eq!(js_num(-2.5), "-2.5");
        assert_eq!(js_num(0.123456), "0.1235");
        assert_eq!(js_num(-0.00001), "0");
        assert_eq!(js_num(f64::NAN), "NaN");
        assert_eq!(js_num(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_polyline() {
        let mut scene = SceneBuilder::new();
        scene.add_polyline(
            "curve_0",
            vec![[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]],
            (1.0, 0.0, 0.0),
            3.0,
            0.7,
            None,
        );
        let js = scene.build_js();
        assert!(js.contains("new Float32Array([0,0,0,1,2,3])"));
        assert!(js.contains("THREE.Line(geo, mat)"));
        assert!(js.contains("line.name = 'curve_0'"));
        assert!(js.contains("opacity: 0.7"));
        assert!(js.contains("0xff0000"));
        assert!(js.contains("line.userData.count = 2"));
        assert!(!js.contains("setDrawRange"));
        assert_eq!(js.matches("new THREE.Line(").count(), 1);
    }

    #[test]
    fn test_polyline_draw_range_clamped() {
        let mut scene = SceneBuilder::new();
        scene.add_polyline("c", vec![[0.0; 3]; 4], (0.0, 0.0, 1.0), 3.0, 1.0, Some(10));
        assert!(scene.build_js().contains("geo.setDrawRange(0, 4)"));
    }

    #[test]
    fn test_marker() {
        let mut scene = SceneBuilder::new();
        scene.add_marker("start_0", [1.0, 1.0, 1.0], 0.4, (0.0, 1.0, 0.0));
        let js = scene.build_js();
        assert!(js.contains("SphereGeometry(0.4"));
        assert!(js.contains("m.name = 'start_0'"));
        assert!(js.contains("markers.push(m)"));
    }

    #[test]
    fn test_axes_with_labels() {
        let mut scene = SceneBuilder::new();
        scene.set_axes(Viewport::default(), "0xbbbbbb", (1.0, 1.0, 1.0));
        let js = scene.build_js();
        assert!(js.contains("LineSegments"));
        assert!(js.contains("axes.name = 'axes'"));
        assert!(js.contains("fillText('z'"));
        // axis lines plus 12 + 12 + 10 ticks, two vertices each
        let start = js.find("axisPos = new Float32Array([").unwrap();
        let end = start + js[start..].find("])").unwrap();
        let values = js[start..end].split(',').count();
        assert_eq!(values, (3 + 34) * 6);
    }

    #[test]
    fn test_custom_js() {
        let mut scene = SceneBuilder::new();
        scene.add_custom_js("console.log('hello');");
        let js = scene.build_js();
        assert!(js.contains("console.log('hello');"));
    }

    #[test]
    fn test_label_escapes_quotes() {
        let mut scene = SceneBuilder::new();
        scene.add_label([0.0, 1.0, 0.0], "it's", (1.0, 1.0, 1.0), 2.0);
        let js = scene.build_js();
        assert!(js.contains("Sprite"));
        assert!(js.contains("it\\'s"));
    }
}
