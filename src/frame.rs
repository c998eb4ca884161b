//! Per-tick snapshot for the rendering collaborator
//!
//! Rendering is purely presentational: sinks receive a `Frame` once per tick
//! and nothing flows back into the simulation.

use std::io::Write;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::mask::FlapFrame;

/// Entity as drawn this tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityView {
    pub pilot: usize,
    pub x: f32,
    pub y: f32,
    pub tilt: f32,
    pub frame: FlapFrame,
}

/// Obstacle as drawn this tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstacleView {
    pub id: u32,
    pub x: f32,
    pub gap_anchor: f32,
    pub top: f32,
    pub bottom: f32,
}

/// Debug line from an entity to the reference obstacle
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GuideLine {
    pub from: Vec2,
    pub to: Vec2,
}

/// Everything needed to draw one tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u64,
    pub entities: Vec<EntityView>,
    pub obstacles: Vec<ObstacleView>,
    pub ground: (f32, f32),
    pub ground_y: f32,
    pub score: u64,
    /// Generation as shown on the scoreboard
    pub generation: u32,
    pub alive: usize,
    /// Entity -> reference gap edges; empty when there is no reference obstacle
    pub guide_lines: Vec<GuideLine>,
}

/// Receiver of frames (fire and forget)
pub trait FrameSink {
    fn present(&mut self, frame: &Frame);
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn present(&mut self, frame: &Frame) {
        (**self).present(frame);
    }
}

/// Discards frames (headless training)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _frame: &Frame) {}
}

/// Trace-level one-line summaries
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl FrameSink for LogSink {
    fn present(&mut self, frame: &Frame) {
        log::trace!(
            "tick {} gen {} score {} alive {} obstacles {}",
            frame.tick,
            frame.generation,
            frame.score,
            frame.alive,
            frame.obstacles.len()
        );
    }
}

/// Writes one JSON frame per line; disables itself after the first write error
pub struct JsonLinesSink<W: Write> {
    writer: W,
    failed: bool,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failed: false,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn present(&mut self, frame: &Frame) {
        if self.failed {
            return;
        }
        let result = serde_json::to_writer(&mut self.writer, frame)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"));
        if let Err(e) = result {
            log::warn!("Frame trace disabled: {e}");
            self.failed = true;
        }
    }
}

/// Keeps every frame (tests, replays)
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub frames: Vec<Frame>,
}

impl FrameSink for RecordingSink {
    fn present(&mut self, frame: &Frame) {
        self.frames.push(frame.clone());
    }
}
