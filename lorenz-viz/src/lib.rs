// Copyright (c) 2025-2026 brdigetrlol. All rights reserved.
// SPDX-License-Identifier: LicenseRef-Icarus-Proprietary
// See LICENSE in the repository root for full license terms.

pub mod color;
pub mod config;
pub mod progress;
pub mod template;
pub mod scene;
pub mod renderers;

pub use config::{CameraOrientation, RenderConfig, RenderMode, Viewport, WindowConfig};
pub use progress::{progress_index, sample_at_progress};
pub use renderers::{render_animation, render_interactive, AnimationTiming, TimelinePhase};
pub use template::Theme;
