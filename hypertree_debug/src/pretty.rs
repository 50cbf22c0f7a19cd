// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in microseconds.

use std::io::Write;

use hypertree_core::render_loop::LoopState;
use hypertree_core::time::HostTime;
use hypertree_core::trace::{
    BatchFlushEvent, FrameBeginEvent, FrameEndEvent, FrameKind, FrameSummary,
    GenerationBeginEvent, GenerationEndEvent, StateChangeEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

fn host_us(t: HostTime) -> f64 {
    us(t.nanos())
}

fn kind_name(kind: FrameKind) -> &'static str {
    match kind {
        FrameKind::Rotate => "rotate",
        FrameKind::Translate => "translate",
        FrameKind::Refresh => "refresh",
        FrameKind::Refine => "refine",
    }
}

fn state_name(state: LoopState) -> &'static str {
    match state {
        LoopState::Idle => "idle",
        LoopState::Rotate => "rotate",
        LoopState::Translate => "translate",
        LoopState::Refresh => "refresh",
        LoopState::CompleteInit => "complete-init",
        LoopState::Complete => "complete",
        LoopState::Shutdown => "shutdown",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_generation_begin(&mut self, e: &GenerationBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[generation:begin] gen={} start={} at={:.1}µs",
            e.generation,
            e.starting_node,
            host_us(e.timestamp),
        );
    }

    fn on_generation_end(&mut self, e: &GenerationEndEvent) {
        let _ = writeln!(
            self.writer,
            "[generation:end] gen={} elements={} at={:.1}µs",
            e.generation,
            e.elements,
            host_us(e.timestamp),
        );
    }

    fn on_batch_flush(&mut self, e: &BatchFlushEvent) {
        let _ = writeln!(
            self.writer,
            "[batch] gen={} len={} queue={} at={:.1}µs",
            e.generation,
            e.batch_len,
            e.queue_len,
            host_us(e.timestamp),
        );
    }

    fn on_state_change(&mut self, e: &StateChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[state] {} -> {} at={:.1}µs",
            state_name(e.from),
            state_name(e.to),
            host_us(e.timestamp),
        );
    }

    fn on_frame_begin(&mut self, e: &FrameBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[frame:begin] frame={} kind={} at={:.1}µs",
            e.frame_index,
            kind_name(e.kind),
            host_us(e.timestamp),
        );
    }

    fn on_frame_end(&mut self, e: &FrameEndEvent) {
        let _ = writeln!(
            self.writer,
            "[frame:end] frame={} at={:.1}µs",
            e.frame_index,
            host_us(e.timestamp),
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} kind={} dur={:.1}µs drawn={}{}",
            s.frame_index,
            kind_name(s.kind),
            us(s.duration_nanos),
            s.elements_drawn,
            if s.budget_exhausted { " (budget)" } else { "" },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_print_writes_lines() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());

        sink.on_state_change(&StateChangeEvent {
            from: LoopState::Refresh,
            to: LoopState::CompleteInit,
            timestamp: HostTime(2_000),
        });
        sink.on_generation_begin(&GenerationBeginEvent {
            generation: 1,
            starting_node: 0,
            timestamp: HostTime(3_000),
        });
        sink.on_frame_summary(&FrameSummary {
            frame_index: 4,
            kind: FrameKind::Refine,
            begin: HostTime(5_000),
            duration_nanos: 12_500,
            elements_drawn: 64,
            budget_exhausted: true,
        });

        let output = String::from_utf8(sink.into_writer()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "[state] refresh -> complete-init at=2.0µs");
        assert!(lines[1].starts_with("[generation:begin] gen=1"), "{output}");
        assert_eq!(
            lines[2],
            "[summary] frame=4 kind=refine dur=12.5µs drawn=64 (budget)"
        );
    }
}
