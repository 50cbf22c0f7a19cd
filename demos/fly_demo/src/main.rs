// Copyright 2026 the Hypertree Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless fly-to-node session that exercises the adaptive render loop and
//! the diagnostics pipeline.
//!
//! Builds a synthetic balanced tree, spins it, flies to a leaf and back, then
//! zooms in. Every worker event is recorded into a
//! [`RecorderSink`](hypertree_debug::recorder::RecorderSink). The recording is
//! exported as Chrome trace JSON to the path given as the first argument
//! (default `fly_trace.json`).
//!
//! Set `RUST_LOG=hypertree_core=debug` to see render loop transitions.

use std::fs::File;
use std::io::BufWriter;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use kurbo::Point;

use hypertree_core::canvas::Canvas;
use hypertree_core::config::RenderConfig;
use hypertree_core::error::GraphError;
use hypertree_core::geometry::{Point4, Transform3d};
use hypertree_core::graph::{GraphBuilder, GraphStore, NodeIndex};
use hypertree_core::render::DrawBatch;
use hypertree_core::render_loop::{LoopState, RenderLoop, RenderLoopHandle, Tracers};
use hypertree_core::rotation::RepeatingRotationRequest;
use hypertree_core::time::{Clock, HostTime, MonotonicClock};
use hypertree_core::trace::Tracer;
use hypertree_debug::recorder::RecorderSink;
use tracing_subscriber::EnvFilter;

const BRANCHING: usize = 4;
const DEPTH: u32 = 6;
/// Hyperbolic distance between a parent ring and its children.
const LEVEL_SPACING: f64 = 0.9;
const SPIN_FRAMES: u64 = 40;

/// Counts what the render loop draws instead of rasterizing it.
#[derive(Debug, Default)]
struct Stats {
    frames: AtomicU64,
    batches: AtomicU64,
    elements: AtomicU64,
}

#[derive(Debug)]
struct HeadlessCanvas {
    clock: MonotonicClock,
    stats: Arc<Stats>,
}

impl Canvas for HeadlessCanvas {
    fn draw_batch(&mut self, batch: &DrawBatch) {
        self.stats.batches.fetch_add(1, Ordering::Relaxed);
        self.stats
            .elements
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
    }

    fn view_transform(&self) -> Transform3d {
        Transform3d::from_uniform_scale(400.0)
    }

    fn now(&self) -> HostTime {
        self.clock.now()
    }

    fn clear_frame(&mut self) {}

    fn present_frame(&mut self) {
        self.stats.frames.fetch_add(1, Ordering::Relaxed);
    }

    fn set_front_buffer_rendering(&mut self, _enabled: bool) {}

    fn set_model_transform(&mut self, _transform: &Transform3d) {}

    fn draw_highlight(&mut self, at: Point) {
        tracing::info!(x = at.x, y = at.y, "highlight");
    }
}

/// Balanced tree numbered breadth first, each level on a ring of nodes
/// spread over the sphere by the golden angle.
fn build_tree() -> Result<GraphStore, GraphError> {
    let mut level_sizes = vec![1_usize];
    for _ in 0..DEPTH {
        let last = level_sizes[level_sizes.len() - 1];
        level_sizes.push(last * BRANCHING);
    }
    let num_nodes: usize = level_sizes.iter().sum();
    let mut builder = GraphBuilder::new(num_nodes, num_nodes - 1);
    builder.set_root(NodeIndex::new(0))?;

    let golden = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    let mut first = 0;
    for (level, &size) in level_sizes.iter().enumerate() {
        let r = (LEVEL_SPACING * level as f64).tanh();
        for k in 0..size {
            let z = 1.0 - 2.0 * (k as f64 + 0.5) / size as f64;
            let ring = (1.0 - z * z).sqrt();
            let theta = golden * k as f64;
            let p = Point4::from_affine(r * ring * theta.cos(), r * ring * theta.sin(), r * z);
            builder.set_node_layout(NodeIndex::new(first + k), p)?;
        }
        first += size;
    }

    let num_parents = num_nodes - level_sizes[level_sizes.len() - 1];
    let mut link_id = 0_u32;
    for parent in 0..num_parents {
        let mut links = builder.links(NodeIndex::new(parent))?;
        for c in 0..BRANCHING {
            links.add_child(NodeIndex::new(parent * BRANCHING + c + 1), link_id)?;
            link_id += 1;
        }
        links.end();
    }
    builder.build()
}

fn wait_for(render_loop: &RenderLoopHandle, states: &[LoopState]) {
    while !states.contains(&render_loop.state()) {
        thread::sleep(std::time::Duration::from_millis(2));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "fly_trace.json".to_owned());

    let graph = Arc::new(build_tree()?);
    let leaf = NodeIndex::new(graph.num_nodes() - 1);
    tracing::info!(nodes = graph.num_nodes(), links = graph.num_links(), "built tree");

    // -- sinks -------------------------------------------------------------
    let recorder = Arc::new(Mutex::new(RecorderSink::new()));
    let tracers = Tracers {
        render_loop: Tracer::new(Box::new(Arc::clone(&recorder))),
        transformer: Tracer::new(Box::new(Arc::clone(&recorder))),
    };

    // -- render loop -------------------------------------------------------
    let stats = Arc::new(Stats::default());
    let canvas = HeadlessCanvas {
        clock: MonotonicClock::new(),
        stats: Arc::clone(&stats),
    };
    let render_loop = RenderLoopHandle::spawn(
        Arc::clone(&graph),
        Box::new(canvas),
        RenderConfig::interactive(),
        tracers,
    )?;
    wait_for(&render_loop, &[LoopState::Complete, LoopState::Idle]);

    // Spin for a while.
    let spin = Arc::new(RepeatingRotationRequest::new(0.02, 0.01));
    render_loop.rotate_display(Arc::clone(&spin) as _);
    while stats.frames.load(Ordering::Relaxed) < SPIN_FRAMES {
        thread::sleep(std::time::Duration::from_millis(1));
    }
    spin.end();
    wait_for(&render_loop, &[LoopState::Complete, LoopState::Idle]);

    // Fly to a leaf and back.
    render_loop.save_display_position();
    render_loop.translate(leaf)?;
    wait_for(&render_loop, &[LoopState::Complete, LoopState::Idle]);
    let position = render_loop.display_position();
    tracing::info!(center = ?position.center_node, "arrived");

    if let Some(pick) = render_loop.highlight_node_at(Point::ZERO) {
        tracing::info!(node = ?pick.node, "node at center");
    }

    render_loop.restore_display_position();
    render_loop.synchronize_with_rendering();
    wait_for(&render_loop, &[LoopState::Idle]);

    // Zoom in, which redraws from scratch.
    render_loop.set_magnification(1.25);
    render_loop.refresh_display();
    wait_for(&render_loop, &[LoopState::Idle]);

    render_loop.shutdown();
    render_loop.wait_for_shutdown();
    tracing::info!(
        frames = stats.frames.load(Ordering::Relaxed),
        batches = stats.batches.load(Ordering::Relaxed),
        elements = stats.elements.load(Ordering::Relaxed),
        "render loop stopped"
    );
    drop(render_loop);

    // -- export Chrome trace -----------------------------------------------
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    let recorder = recorder.lock().unwrap_or_else(PoisonError::into_inner);
    hypertree_debug::chrome::export(recorder.as_bytes(), &mut writer)?;
    println!("Wrote {path}");
    Ok(())
}
