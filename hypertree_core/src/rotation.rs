// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sources of incremental rotations for the `Rotate` render loop state.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::geometry::Transform3d;

/// Supplies rotation deltas to a render loop.
///
/// The render loop calls [`get_rotation`](Self::get_rotation) once per frame
/// and leaves the `Rotate` state when it returns `None`.
pub trait RotationRequest {
    /// Next rotation to apply to the object transform, or `None` once the
    /// rotation is over. May block while more input is expected.
    fn get_rotation(&self) -> Option<Transform3d>;
}

/// Rotation about the vertical axis by `horizontal` after rotation about
/// the horizontal axis by `vertical`.
fn compose(horizontal: f64, vertical: f64) -> Transform3d {
    Transform3d::rotation_y(horizontal) * Transform3d::rotation_x(vertical)
}

#[derive(Debug)]
struct Interactive {
    rotating: bool,
    drained: bool,
    horizontal: f64,
    vertical: f64,
}

/// Rotation driven by pointer drags.
///
/// Deltas reported through [`rotate`](Self::rotate) accumulate until the
/// render loop takes them, so a slow frame never drops input. While the drag
/// is in progress and nothing has accumulated,
/// [`get_rotation`](RotationRequest::get_rotation) blocks.
#[derive(Debug)]
pub struct InteractiveRotationRequest {
    inner: Mutex<Interactive>,
    changed: Condvar,
}

impl InteractiveRotationRequest {
    /// Creates a request in the rotating state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Interactive {
                rotating: true,
                drained: false,
                horizontal: 0.0,
                vertical: 0.0,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Interactive> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begins a new drag, dropping any unconsumed deltas.
    pub fn start(&self) {
        let mut inner = self.lock();
        inner.rotating = true;
        inner.drained = false;
        inner.horizontal = 0.0;
        inner.vertical = 0.0;
    }

    /// Adds a drag delta, in radians about the vertical and horizontal axes.
    pub fn rotate(&self, horizontal: f64, vertical: f64) {
        let mut inner = self.lock();
        inner.horizontal += horizontal;
        inner.vertical += vertical;
        drop(inner);
        self.changed.notify_all();
    }

    /// Ends the drag. Accumulated deltas are still delivered.
    pub fn end(&self) {
        self.lock().rotating = false;
        self.changed.notify_all();
    }

    /// Ends the drag and blocks until the render loop has taken the last
    /// delta and observed the end.
    pub fn finish(&self) {
        let mut inner = self.lock();
        inner.rotating = false;
        self.changed.notify_all();
        while !inner.drained {
            inner = self
                .changed
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Default for InteractiveRotationRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationRequest for InteractiveRotationRequest {
    fn get_rotation(&self) -> Option<Transform3d> {
        let mut inner = self.lock();
        loop {
            if inner.horizontal != 0.0 || inner.vertical != 0.0 {
                let rotation = compose(inner.horizontal, inner.vertical);
                inner.horizontal = 0.0;
                inner.vertical = 0.0;
                return Some(rotation);
            }
            if !inner.rotating {
                inner.drained = true;
                drop(inner);
                self.changed.notify_all();
                return None;
            }
            inner = self
                .changed
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

#[derive(Debug)]
struct Repeating {
    rotating: bool,
    horizontal: f64,
    vertical: f64,
}

/// Rotation that repeats one delta every frame until ended, for spinning
/// the display continuously.
#[derive(Debug)]
pub struct RepeatingRotationRequest {
    inner: Mutex<Repeating>,
}

impl RepeatingRotationRequest {
    /// Creates a request spinning by `horizontal` and `vertical` radians per
    /// frame.
    #[must_use]
    pub fn new(horizontal: f64, vertical: f64) -> Self {
        Self {
            inner: Mutex::new(Repeating {
                rotating: true,
                horizontal,
                vertical,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Repeating> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restarts spinning with a zero delta.
    pub fn start(&self) {
        let mut inner = self.lock();
        inner.rotating = true;
        inner.horizontal = 0.0;
        inner.vertical = 0.0;
    }

    /// Replaces the per-frame delta.
    pub fn rotate(&self, horizontal: f64, vertical: f64) {
        let mut inner = self.lock();
        inner.horizontal = horizontal;
        inner.vertical = vertical;
    }

    /// Stops spinning after the current frame.
    pub fn end(&self) {
        self.lock().rotating = false;
    }
}

impl RotationRequest for RepeatingRotationRequest {
    fn get_rotation(&self) -> Option<Transform3d> {
        let inner = self.lock();
        inner
            .rotating
            .then(|| compose(inner.horizontal, inner.vertical))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn interactive_accumulates_deltas() {
        let r = InteractiveRotationRequest::new();
        r.rotate(0.1, 0.0);
        r.rotate(0.2, 0.3);
        let rot = r.get_rotation().unwrap();
        assert!(rot.max_abs_diff(&compose(0.3, 0.3)) < 1e-12);
        r.end();
        assert_eq!(r.get_rotation(), None);
    }

    #[test]
    fn interactive_delivers_pending_delta_after_end() {
        let r = InteractiveRotationRequest::new();
        r.rotate(0.5, 0.0);
        r.end();
        assert!(r.get_rotation().is_some());
        assert_eq!(r.get_rotation(), None);
    }

    #[test]
    fn interactive_blocks_until_input() {
        let r = Arc::new(InteractiveRotationRequest::new());
        let consumer = {
            let r = Arc::clone(&r);
            thread::spawn(move || {
                let mut frames = 0;
                while r.get_rotation().is_some() {
                    frames += 1;
                }
                frames
            })
        };
        thread::sleep(Duration::from_millis(20));
        r.rotate(0.1, 0.1);
        r.finish();
        let frames = consumer.join().unwrap();
        assert_eq!(frames, 1, "one delta yields one frame");
    }

    #[test]
    fn start_clears_state() {
        let r = InteractiveRotationRequest::new();
        r.rotate(0.1, 0.0);
        r.end();
        r.start();
        r.end();
        assert_eq!(r.get_rotation(), None);
    }

    #[test]
    fn repeating_returns_same_delta_until_ended() {
        let r = RepeatingRotationRequest::new(0.0, 0.2);
        let a = r.get_rotation().unwrap();
        let b = r.get_rotation().unwrap();
        assert_eq!(a, b);
        assert!(a.max_abs_diff(&Transform3d::rotation_x(0.2)) < 1e-12);
        r.end();
        assert_eq!(r.get_rotation(), None);
    }
}
