// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lock-free attribute columns.
//!
//! Attribute arrays are written by one worker at a time (the transformer or
//! the render loop) and read concurrently by renderers. Cross-thread ordering
//! is established by the render queue's mutex, so individual cells only need
//! `Relaxed` atomics to stay data-race free.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// An `f64` cell stored as its bit pattern.
#[derive(Debug, Default)]
pub(crate) struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub(crate) fn new(v: f64) -> Self {
        Self(AtomicU64::new(v.to_bits()))
    }

    #[inline]
    pub(crate) fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub(crate) fn store(&self, v: f64) {
        self.0.store(v.to_bits(), Ordering::Relaxed);
    }
}

/// A column of `f64` values.
#[derive(Debug)]
pub(crate) struct F64Column(Vec<AtomicF64>);

impl F64Column {
    pub(crate) fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        Self(values.into_iter().map(AtomicF64::new).collect())
    }

    #[inline]
    pub(crate) fn get(&self, i: usize) -> f64 {
        self.0[i].load()
    }

    #[inline]
    pub(crate) fn set(&self, i: usize, v: f64) {
        self.0[i].store(v);
    }
}

/// A column of packed `0xRRGGBB` colors.
#[derive(Debug)]
pub(crate) struct ColorColumn(Vec<AtomicU32>);

impl ColorColumn {
    pub(crate) fn from_values(values: impl IntoIterator<Item = u32>) -> Self {
        Self(values.into_iter().map(AtomicU32::new).collect())
    }

    #[inline]
    pub(crate) fn get(&self, i: usize) -> u32 {
        self.0[i].load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set(&self, i: usize, v: u32) {
        self.0[i].store(v, Ordering::Relaxed);
    }

    pub(crate) fn fill(&self, v: u32) {
        for c in &self.0 {
            c.store(v, Ordering::Relaxed);
        }
    }
}

/// A column of boolean flags.
#[derive(Debug)]
pub(crate) struct FlagColumn(Vec<AtomicBool>);

impl FlagColumn {
    pub(crate) fn new(len: usize, value: bool) -> Self {
        Self((0..len).map(|_| AtomicBool::new(value)).collect())
    }

    #[inline]
    pub(crate) fn get(&self, i: usize) -> bool {
        self.0[i].load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set(&self, i: usize, v: bool) {
        self.0[i].store(v, Ordering::Relaxed);
    }

    pub(crate) fn fill(&self, v: bool) {
        for f in &self.0 {
            f.store(v, Ordering::Relaxed);
        }
    }

    /// Sets every flag for which `keep(i)` holds.
    pub(crate) fn fill_where(&self, v: bool, keep: impl Fn(usize) -> bool) {
        for (i, f) in self.0.iter().enumerate() {
            if keep(i) {
                f.store(v, Ordering::Relaxed);
            }
        }
    }

    /// `self[i] = a[i] && b[i]` for every slot.
    pub(crate) fn assign_conjunction(&self, a: &Self, b: &Self) {
        for (i, f) in self.0.iter().enumerate() {
            f.store(a.get(i) && b.get(i), Ordering::Relaxed);
        }
    }

    pub(crate) fn all(&self) -> bool {
        self.0.iter().all(|f| f.load(Ordering::Relaxed))
    }

    pub(crate) fn count(&self) -> usize {
        self.0.iter().filter(|f| f.load(Ordering::Relaxed)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_round_trips_special_values() {
        let c = F64Column::from_values([0.0, -0.0, f64::INFINITY]);
        assert_eq!(c.get(2), f64::INFINITY);
        c.set(0, f64::NAN);
        assert!(c.get(0).is_nan());
        assert!(c.get(1).is_sign_negative());
    }

    #[test]
    fn conjunction_is_elementwise() {
        let a = FlagColumn::new(3, true);
        let b = FlagColumn::new(3, true);
        b.set(1, false);
        let out = FlagColumn::new(3, false);
        out.assign_conjunction(&a, &b);
        assert!(out.get(0));
        assert!(!out.get(1));
        assert!(out.get(2));
        assert_eq!(out.count(), 2);
        assert!(!out.all());
    }

    #[test]
    fn fill_where_filters_slots() {
        let f = FlagColumn::new(4, false);
        f.fill_where(true, |i| i % 2 == 0);
        assert!(f.get(0) && !f.get(1) && f.get(2) && !f.get(3));
    }
}
