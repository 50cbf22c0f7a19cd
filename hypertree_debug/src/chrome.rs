// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Frames appear as duration slices on thread 1 and transformer generations
//! as slices on thread 2, so the two workers line up on one timeline.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

const RENDER_LOOP_TID: u32 = 1;
const TRANSFORMER_TID: u32 = 2;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::GenerationBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": "Generation",
                    "cat": "Transformer",
                    "ts": nanos_to_us(e.timestamp.nanos()),
                    "pid": 0,
                    "tid": TRANSFORMER_TID,
                    "args": {
                        "generation": e.generation,
                        "starting_node": e.starting_node,
                    }
                }));
            }
            RecordedEvent::GenerationEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Generation",
                    "cat": "Transformer",
                    "ts": nanos_to_us(e.timestamp.nanos()),
                    "pid": 0,
                    "tid": TRANSFORMER_TID,
                    "args": {
                        "generation": e.generation,
                        "elements": e.elements,
                    }
                }));
            }
            RecordedEvent::BatchFlush(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "BatchFlush",
                    "cat": "Transformer",
                    "ts": nanos_to_us(e.timestamp.nanos()),
                    "pid": 0,
                    "tid": TRANSFORMER_TID,
                    "s": "t",
                    "args": {
                        "generation": e.generation,
                        "batch_len": e.batch_len,
                        "queue_len": e.queue_len,
                    }
                }));
            }
            RecordedEvent::StateChange(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.to),
                    "cat": "State",
                    "ts": nanos_to_us(e.timestamp.nanos()),
                    "pid": 0,
                    "tid": RENDER_LOOP_TID,
                    "s": "g",
                    "args": {
                        "from": format!("{:?}", e.from),
                    }
                }));
            }
            RecordedEvent::FrameBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.kind),
                    "cat": "Frame",
                    "ts": nanos_to_us(e.timestamp.nanos()),
                    "pid": 0,
                    "tid": RENDER_LOOP_TID,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::FrameEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "cat": "Frame",
                    "ts": nanos_to_us(e.timestamp.nanos()),
                    "pid": 0,
                    "tid": RENDER_LOOP_TID,
                    "args": {
                        "frame_index": e.frame_index,
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "FrameSummary",
                    "cat": "Summary",
                    "ts": nanos_to_us(s.begin.nanos() + s.duration_nanos),
                    "pid": 0,
                    "tid": RENDER_LOOP_TID,
                    "s": "t",
                    "args": {
                        "frame_index": s.frame_index,
                        "kind": format!("{:?}", s.kind),
                        "duration_us": nanos_to_us(s.duration_nanos),
                        "elements_drawn": s.elements_drawn,
                        "budget_exhausted": s.budget_exhausted,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use hypertree_core::render_loop::LoopState;
    use hypertree_core::time::HostTime;
    use hypertree_core::trace::{
        FrameBeginEvent, FrameEndEvent, FrameKind, GenerationBeginEvent, StateChangeEvent,
        TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_state_change(&StateChangeEvent {
            from: LoopState::Idle,
            to: LoopState::Translate,
            timestamp: HostTime(1_000_000),
        });
        rec.on_frame_begin(&FrameBeginEvent {
            frame_index: 0,
            kind: FrameKind::Translate,
            timestamp: HostTime(1_000_000),
        });
        rec.on_generation_begin(&GenerationBeginEvent {
            generation: 2,
            starting_node: 5,
            timestamp: HostTime(1_000_050),
        });
        rec.on_frame_end(&FrameEndEvent {
            frame_index: 0,
            timestamp: HostTime(1_000_100),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "Translate");
        assert_eq!(parsed[0]["args"]["from"], "Idle");

        assert_eq!(parsed[1]["ph"], "B");
        assert_eq!(parsed[1]["name"], "Translate");
        assert_eq!(parsed[1]["tid"], RENDER_LOOP_TID);
        assert_eq!(parsed[1]["ts"], 1000.0);

        // Generations run on their own track.
        assert_eq!(parsed[2]["ph"], "B");
        assert_eq!(parsed[2]["tid"], TRANSFORMER_TID);
        assert_eq!(parsed[2]["args"]["starting_node"], 5);

        assert_eq!(parsed[3]["ph"], "E");
        assert_eq!(parsed[3]["ts"], 1000.1);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
