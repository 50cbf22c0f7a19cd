// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render loop configuration.

use crate::render::RenderListConfig;
use crate::time::Duration;

/// Which render loop drives the display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Background transformer plus time-budgeted incremental drawing.
    #[default]
    Adaptive,
    /// The whole graph is transformed and drawn every frame.
    Nonadaptive,
}

/// Configuration for a [`RenderLoopHandle`](crate::render_loop::RenderLoopHandle).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderConfig {
    /// Which render loop to run.
    pub mode: RenderMode,
    /// Classify nodes into levels of detail by radius.
    pub use_node_sizes: bool,
    /// Draw nodes and links in their stored colors.
    pub include_colors: bool,
    /// Follow non-tree links while transforming, so nodes reached only
    /// through them are placed too.
    pub transform_nontree_links: bool,
    /// Time budget of each frame while rotating.
    pub max_rotation_duration: Duration,
    /// Time budget of each frame while translating.
    pub max_translation_duration: Duration,
    /// Time budget of each refinement pass once the display is at rest.
    pub max_completion_duration: Duration,
}

impl RenderConfig {
    /// Adaptive rendering with budgets suited to interactive frame rates.
    #[must_use]
    pub const fn interactive() -> Self {
        Self {
            mode: RenderMode::Adaptive,
            use_node_sizes: true,
            include_colors: true,
            transform_nontree_links: false,
            max_rotation_duration: Duration::from_millis(50),
            max_translation_duration: Duration::from_millis(100),
            max_completion_duration: Duration::MAX,
        }
    }

    /// Adaptive rendering where every frame draws everything.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_rotation_duration: Duration::MAX,
            max_translation_duration: Duration::MAX,
            ..Self::interactive()
        }
    }

    /// Nonadaptive rendering, for small graphs.
    #[must_use]
    pub const fn nonadaptive() -> Self {
        Self {
            mode: RenderMode::Nonadaptive,
            ..Self::unbounded()
        }
    }

    /// Render list settings implied by this configuration.
    #[must_use]
    pub const fn render_list(&self) -> RenderListConfig {
        RenderListConfig::new(self.use_node_sizes, self.include_colors)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::interactive()
    }
}
