// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

//! Mapping animation progress onto trajectory samples.
//!
//! A moving dot is a pure function of its trajectory and the progress
//! fraction α; nothing is carried between frames. The page script uses
//! [`PROGRESS_INDEX_JS`], which mirrors [`progress_index`].

use lorenz_field::{State, Trajectory};

pub use lorenz_field::progress_index;

/// State the dot for `trajectory` sits on at progress `alpha`.
pub fn sample_at_progress(trajectory: &Trajectory, alpha: f64) -> Option<State> {
    trajectory.sample_at_progress(alpha)
}

/// JS `progressIndex(alpha, n)`, returning -1 for empty curves.
pub const PROGRESS_INDEX_JS: &str = r#"
function progressIndex(alpha, n) {
    if (n <= 0) return -1;
    const a = Number.isNaN(alpha) ? 0 : Math.min(Math.max(alpha, 0), 1);
    return Math.min(Math.floor(a * (n - 1)), n - 1);
}
"#;
