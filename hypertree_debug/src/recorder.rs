// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use hypertree_core::render_loop::LoopState;
use hypertree_core::time::HostTime;
use hypertree_core::trace::{
    BatchFlushEvent, FrameBeginEvent, FrameEndEvent, FrameKind, FrameSummary,
    GenerationBeginEvent, GenerationEndEvent, StateChangeEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_GENERATION_BEGIN: u8 = 1;
const TAG_GENERATION_END: u8 = 2;
const TAG_BATCH_FLUSH: u8 = 3;
const TAG_STATE_CHANGE: u8 = 4;
const TAG_FRAME_BEGIN: u8 = 5;
const TAG_FRAME_END: u8 = 6;
const TAG_FRAME_SUMMARY: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_state(&mut self, s: LoopState) {
        self.write_u8(match s {
            LoopState::Idle => 0,
            LoopState::Rotate => 1,
            LoopState::Translate => 2,
            LoopState::Refresh => 3,
            LoopState::CompleteInit => 4,
            LoopState::Complete => 5,
            LoopState::Shutdown => 6,
        });
    }

    fn write_kind(&mut self, k: FrameKind) {
        self.write_u8(match k {
            FrameKind::Rotate => 0,
            FrameKind::Translate => 1,
            FrameKind::Refresh => 2,
            FrameKind::Refine => 3,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_generation_begin(&mut self, e: &GenerationBeginEvent) {
        self.write_u8(TAG_GENERATION_BEGIN);
        self.write_u64(e.generation);
        self.write_u32(e.starting_node);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_generation_end(&mut self, e: &GenerationEndEvent) {
        self.write_u8(TAG_GENERATION_END);
        self.write_u64(e.generation);
        self.write_u32(e.elements);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_batch_flush(&mut self, e: &BatchFlushEvent) {
        self.write_u8(TAG_BATCH_FLUSH);
        self.write_u64(e.generation);
        self.write_u32(e.batch_len);
        self.write_u32(e.queue_len);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_state_change(&mut self, e: &StateChangeEvent) {
        self.write_u8(TAG_STATE_CHANGE);
        self.write_state(e.from);
        self.write_state(e.to);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        self.write_u8(TAG_FRAME_BEGIN);
        self.write_u64(e.frame_index);
        self.write_kind(e.kind);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        self.write_u8(TAG_FRAME_END);
        self.write_u64(e.frame_index);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_kind(s.kind);
        self.write_u64(s.begin.nanos());
        self.write_u64(s.duration_nanos);
        self.write_u32(s.elements_drawn);
        self.write_u8(u8::from(s.budget_exhausted));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`GenerationBeginEvent`].
    GenerationBegin(GenerationBeginEvent),
    /// A [`GenerationEndEvent`].
    GenerationEnd(GenerationEndEvent),
    /// A [`BatchFlushEvent`].
    BatchFlush(BatchFlushEvent),
    /// A [`StateChangeEvent`].
    StateChange(StateChangeEvent),
    /// A [`FrameBeginEvent`].
    FrameBegin(FrameBeginEvent),
    /// A [`FrameEndEvent`].
    FrameEnd(FrameEndEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        Some(self.take::<1>()?[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take()?))
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_state(&mut self) -> Option<LoopState> {
        Some(match self.read_u8()? {
            0 => LoopState::Idle,
            1 => LoopState::Rotate,
            2 => LoopState::Translate,
            3 => LoopState::Refresh,
            4 => LoopState::CompleteInit,
            5 => LoopState::Complete,
            6 => LoopState::Shutdown,
            _ => return None,
        })
    }

    fn read_kind(&mut self) -> Option<FrameKind> {
        Some(match self.read_u8()? {
            0 => FrameKind::Rotate,
            1 => FrameKind::Translate,
            2 => FrameKind::Refresh,
            3 => FrameKind::Refine,
            _ => return None,
        })
    }

    fn decode_generation_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::GenerationBegin(GenerationBeginEvent {
            generation: self.read_u64()?,
            starting_node: self.read_u32()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_generation_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::GenerationEnd(GenerationEndEvent {
            generation: self.read_u64()?,
            elements: self.read_u32()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_batch_flush(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::BatchFlush(BatchFlushEvent {
            generation: self.read_u64()?,
            batch_len: self.read_u32()?,
            queue_len: self.read_u32()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_state_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::StateChange(StateChangeEvent {
            from: self.read_state()?,
            to: self.read_state()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_frame_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameBegin(FrameBeginEvent {
            frame_index: self.read_u64()?,
            kind: self.read_kind()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_frame_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameEnd(FrameEndEvent {
            frame_index: self.read_u64()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index: self.read_u64()?,
            kind: self.read_kind()?,
            begin: self.read_time()?,
            duration_nanos: self.read_u64()?,
            elements_drawn: self.read_u32()?,
            budget_exhausted: self.read_u8()? != 0,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_GENERATION_BEGIN => self.decode_generation_begin(),
            TAG_GENERATION_END => self.decode_generation_end(),
            TAG_BATCH_FLUSH => self.decode_batch_flush(),
            TAG_STATE_CHANGE => self.decode_state_change(),
            TAG_FRAME_BEGIN => self.decode_frame_begin(),
            TAG_FRAME_END => self.decode_frame_end(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> FrameSummary {
        FrameSummary {
            frame_index: 7,
            kind: FrameKind::Refine,
            begin: HostTime(1_000_000),
            duration_nanos: 48_000,
            elements_drawn: 125,
            budget_exhausted: true,
        }
    }

    #[test]
    fn frame_summary_survives_recording() {
        let mut rec = RecorderSink::new();
        let orig = sample_summary();
        rec.on_frame_summary(&orig);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::FrameSummary(s) => {
                assert_eq!(s.frame_index, orig.frame_index);
                assert_eq!(s.kind, orig.kind);
                assert_eq!(s.begin, orig.begin);
                assert_eq!(s.duration_nanos, orig.duration_nanos);
                assert_eq!(s.elements_drawn, orig.elements_drawn);
                assert!(s.budget_exhausted);
            }
            other => panic!("expected FrameSummary, got {other:?}"),
        }
    }

    #[test]
    fn mixed_stream_keeps_order() {
        let mut rec = RecorderSink::new();
        rec.on_generation_begin(&GenerationBeginEvent {
            generation: 3,
            starting_node: 12,
            timestamp: HostTime(10),
        });
        rec.on_batch_flush(&BatchFlushEvent {
            generation: 3,
            batch_len: 100,
            queue_len: 100,
            timestamp: HostTime(20),
        });
        rec.on_state_change(&StateChangeEvent {
            from: LoopState::CompleteInit,
            to: LoopState::Complete,
            timestamp: HostTime(25),
        });
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            kind: FrameKind::Translate,
            timestamp: HostTime(30),
        });
        rec.on_frame_end(&FrameEndEvent {
            frame_index: 0,
            timestamp: HostTime(40),
        });
        rec.on_generation_end(&GenerationEndEvent {
            generation: 3,
            elements: 180,
            timestamp: HostTime(50),
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 6);
        assert!(matches!(
            events[0],
            RecordedEvent::GenerationBegin(GenerationBeginEvent {
                starting_node: 12,
                ..
            })
        ));
        assert!(matches!(events[1], RecordedEvent::BatchFlush(_)));
        match &events[2] {
            RecordedEvent::StateChange(e) => {
                assert_eq!(e.from, LoopState::CompleteInit);
                assert_eq!(e.to, LoopState::Complete);
            }
            other => panic!("expected StateChange, got {other:?}"),
        }
        assert!(matches!(
            events[3],
            RecordedEvent::FrameBegin(FrameBeginEvent {
                kind: FrameKind::Translate,
                ..
            })
        ));
        assert!(matches!(events[4], RecordedEvent::FrameEnd(_)));
        assert!(matches!(
            events[5],
            RecordedEvent::GenerationEnd(GenerationEndEvent { elements: 180, .. })
        ));
    }

    #[test]
    fn truncated_record_ends_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_frame_summary(&sample_summary());
        rec.on_frame_summary(&sample_summary());
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }
}
