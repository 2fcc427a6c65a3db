// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Curve palettes for Lorenz visualizations.
//!
//! Colors are (r, g, b) tuples in [0.0, 1.0], converted to "#RRGGBB" for
//! HTML/CSS or "0xRRGGBB" for Three.js materials.

/// Linear RGB color with components in [0.0, 1.0].
pub type Rgb = (f32, f32, f32);

/// Start color of the animation gradient (#58C4DD).
pub const BLUE: [u8; 3] = [0x58, 0xC4, 0xDD];

/// End color of the animation gradient (#FFFF00).
pub const YELLOW: [u8; 3] = [0xFF, 0xFF, 0x00];

/// Five viridis stops used for the interactive page, dark to light.
pub const VIRIDIS: [[u8; 3]; 5] = [
    [68, 1, 84],
    [59, 81, 138],
    [34, 144, 140],
    [96, 200, 96],
    [253, 231, 37],
];

pub fn rgb8([r, g, b]: [u8; 3]) -> Rgb {
    (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
}

/// One viridis color per curve, cycling through the five stops.
pub fn viridis_palette(n: usize) -> Vec<Rgb> {
    (0..n).map(|i| rgb8(VIRIDIS[i % VIRIDIS.len()])).collect()
}

/// `n` colors evenly spaced from `from` to `to`, both ends included.
///
/// `n == 1` yields just `from`; `n == 0` yields nothing.
pub fn gradient(from: Rgb, to: Rgb, n: usize) -> Vec<Rgb> {
    match n {
        0 => Vec::new(),
        1 => vec![from],
        _ => (0..n)
            .map(|i| lerp(from, to, i as f32 / (n - 1) as f32))
            .collect(),
    }
}

/// Componentwise linear interpolation, `t` clamped to [0, 1].
pub fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    (
        a.0 + (b.0 - a.0) * t,
        a.1 + (b.1 - a.1) * t,
        a.2 + (b.2 - a.2) * t,
    )
}

fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Convert (r, g, b) in [0,1] to a CSS hex color string "#RRGGBB".
pub fn rgb_to_hex(c: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", channel(c.0), channel(c.1), channel(c.2))
}

/// Convert (r, g, b) in [0,1] to a Three.js hex integer literal "0xRRGGBB".
pub fn rgb_to_threejs_hex(c: Rgb) -> String {
    format!("0x{:02x}{:02x}{:02x}", channel(c.0), channel(c.1), channel(c.2))
}
