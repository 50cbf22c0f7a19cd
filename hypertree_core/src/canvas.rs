// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing contract for platform integrations.
//!
//! Hypertree does not rasterize anything itself. The render loops prepare
//! classified geometry in a [`DrawBatch`] and hand it to a [`Canvas`], which
//! owns the actual graphics context. A canvas provides the following pieces:
//!
//! - **Drawing**: [`Canvas::draw_batch`] draws points and segments already
//!   transformed into display coordinates; the canvas applies its own model
//!   transform on top.
//!
//! - **Buffering**: [`Canvas::clear_frame`] and [`Canvas::present_frame`]
//!   bracket a double-buffered frame. While refining, the adaptive loop
//!   switches to front-buffer rendering so partial results appear at once.
//!
//! - **Time**: [`Canvas::now`] is the clock time budgets are measured against.
//!
//! - **View**: [`Canvas::view_transform`] maps the object frame to device
//!   coordinates, for picking.

use kurbo::Point;

use crate::geometry::Transform3d;
use crate::render::DrawBatch;
use crate::time::HostTime;

/// A drawing surface driven by a render loop thread.
///
/// # Frame loop pseudocode
///
/// One animation frame of the adaptive loop looks like this:
///
/// ```rust,ignore
/// view.extend(&delta);
/// canvas.clear_frame();
/// canvas.set_model_transform(&view.object_transform());
/// renderer.render(&mut canvas); // draw_batch, possibly several times
/// canvas.present_frame();
/// ```
///
/// When no animation is running the loop refines in place:
///
/// ```rust,ignore
/// canvas.set_front_buffer_rendering(true);
/// while !renderer.is_finished() {
///     renderer.refine(&mut canvas);
/// }
/// canvas.set_front_buffer_rendering(false);
/// ```
pub trait Canvas {
    /// Draws a prepared batch under the current model transform.
    fn draw_batch(&mut self, batch: &DrawBatch);

    /// Object-to-device transform of the current view, excluding the model
    /// transform.
    fn view_transform(&self) -> Transform3d;

    /// Current time on the canvas's monotonic clock.
    fn now(&self) -> HostTime;

    /// Clears the back buffer.
    fn clear_frame(&mut self);

    /// Makes the back buffer visible.
    fn present_frame(&mut self);

    /// Directs drawing at the visible buffer instead of the back buffer.
    fn set_front_buffer_rendering(&mut self, enabled: bool);

    /// Sets the object transform applied to subsequently drawn geometry.
    fn set_model_transform(&mut self, transform: &Transform3d);

    /// Marks a picked node at device position `at`.
    fn draw_highlight(&mut self, at: Point) {
        let _ = at;
    }
}

impl<C: Canvas + ?Sized> Canvas for Box<C> {
    fn draw_batch(&mut self, batch: &DrawBatch) {
        (**self).draw_batch(batch);
    }

    fn view_transform(&self) -> Transform3d {
        (**self).view_transform()
    }

    fn now(&self) -> HostTime {
        (**self).now()
    }

    fn clear_frame(&mut self) {
        (**self).clear_frame();
    }

    fn present_frame(&mut self) {
        (**self).present_frame();
    }

    fn set_front_buffer_rendering(&mut self, enabled: bool) {
        (**self).set_front_buffer_rendering(enabled);
    }

    fn set_model_transform(&mut self, transform: &Transform3d) {
        (**self).set_model_transform(transform);
    }

    fn draw_highlight(&mut self, at: Point) {
        (**self).draw_highlight(at);
    }
}
