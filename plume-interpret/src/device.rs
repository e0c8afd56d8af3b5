//! The command sink: the abstract consumer of everything the interpreter
//! produces.

use crate::color::Paint;
use crate::image::Image;
use crate::text::TextRun;
use crate::FillRule;
use kurbo::{Affine, BezPath, Rect};
use smallvec::SmallVec;
use std::sync::Arc;

/// Paint-mode bit for stroking a committed path.
pub const STROKE: u8 = 1;
/// Paint-mode bit for filling a committed path.
pub const FILL: u8 = 2;
/// Fill and stroke combined.
pub const BOTH: u8 = STROKE | FILL;
/// OR-ed into the mode when the path also becomes the new clip.
pub const CLIP: u8 = 4;

/// A trait for a sink that receives the drawing commands produced while
/// interpreting a content stream.
///
/// The host owns the sink behind an `Arc<Mutex<_>>`; the interpreter holds
/// only a weak reference and upgrades it for the duration of a single
/// iteration step.
pub trait CommandSink: Send {
    /// Save the sink's graphics state.
    fn push(&mut self);
    /// Restore the sink's graphics state.
    fn pop(&mut self);
    /// Concatenate onto the current transformation matrix.
    fn transform(&mut self, transform: Affine);
    fn stroke_width(&mut self, width: f32);
    fn end_cap(&mut self, cap: i32);
    fn line_join(&mut self, join: i32);
    fn miter_limit(&mut self, limit: f32);
    fn dash(&mut self, array: SmallVec<[f32; 4]>, phase: f32);
    fn stroke_alpha(&mut self, alpha: f32);
    fn fill_alpha(&mut self, alpha: f32);
    fn stroke_paint(&mut self, paint: Paint);
    fn fill_paint(&mut self, paint: Paint);
    /// A committed path. `mode` is a combination of [`STROKE`], [`FILL`]
    /// and [`CLIP`].
    fn path(&mut self, path: BezPath, fill_rule: FillRule, mode: u8);
    /// A shading fill. A `None` bounding box means the sink's own bounds.
    fn shade(&mut self, paint: Paint, bbox: Option<Rect>);
    fn image(&mut self, image: Image);
    /// A pre-recorded sub-sequence (the body of a Form XObject).
    fn commands(&mut self, commands: CommandList);
    /// A run of shown text.
    fn text(&mut self, run: TextRun);
    /// The stream is done; no further commands follow.
    fn finish(&mut self);
}

/// A recorded command, one variant per [`CommandSink`] operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Push,
    Pop,
    Transform(Affine),
    StrokeWidth(f32),
    EndCap(i32),
    LineJoin(i32),
    MiterLimit(f32),
    Dash(SmallVec<[f32; 4]>, f32),
    StrokeAlpha(f32),
    FillAlpha(f32),
    StrokePaint(Paint),
    FillPaint(Paint),
    Path {
        path: BezPath,
        fill_rule: FillRule,
        mode: u8,
    },
    Shade {
        paint: Paint,
        bbox: Option<Rect>,
    },
    Image(Image),
    Commands(CommandList),
    Text(TextRun),
}

/// An immutable, shareable list of recorded commands.
pub type CommandList = Arc<Vec<Command>>;

/// A [`CommandSink`] that records everything it receives.
///
/// This is the sink behind Form-XObject sub-interpretation and the natural
/// harness for tests.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<Command>,
    finished: bool,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The commands recorded so far.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Move the recorded commands out of the recorder.
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Whether [`CommandSink::finish`] has been delivered.
    pub fn finished(&self) -> bool {
        self.finished
    }
}

impl CommandSink for CommandRecorder {
    fn push(&mut self) {
        self.commands.push(Command::Push);
    }

    fn pop(&mut self) {
        self.commands.push(Command::Pop);
    }

    fn transform(&mut self, transform: Affine) {
        self.commands.push(Command::Transform(transform));
    }

    fn stroke_width(&mut self, width: f32) {
        self.commands.push(Command::StrokeWidth(width));
    }

    fn end_cap(&mut self, cap: i32) {
        self.commands.push(Command::EndCap(cap));
    }

    fn line_join(&mut self, join: i32) {
        self.commands.push(Command::LineJoin(join));
    }

    fn miter_limit(&mut self, limit: f32) {
        self.commands.push(Command::MiterLimit(limit));
    }

    fn dash(&mut self, array: SmallVec<[f32; 4]>, phase: f32) {
        self.commands.push(Command::Dash(array, phase));
    }

    fn stroke_alpha(&mut self, alpha: f32) {
        self.commands.push(Command::StrokeAlpha(alpha));
    }

    fn fill_alpha(&mut self, alpha: f32) {
        self.commands.push(Command::FillAlpha(alpha));
    }

    fn stroke_paint(&mut self, paint: Paint) {
        self.commands.push(Command::StrokePaint(paint));
    }

    fn fill_paint(&mut self, paint: Paint) {
        self.commands.push(Command::FillPaint(paint));
    }

    fn path(&mut self, path: BezPath, fill_rule: FillRule, mode: u8) {
        self.commands.push(Command::Path {
            path,
            fill_rule,
            mode,
        });
    }

    fn shade(&mut self, paint: Paint, bbox: Option<Rect>) {
        self.commands.push(Command::Shade { paint, bbox });
    }

    fn image(&mut self, image: Image) {
        self.commands.push(Command::Image(image));
    }

    fn commands(&mut self, commands: CommandList) {
        self.commands.push(Command::Commands(commands));
    }

    fn text(&mut self, run: TextRun) {
        self.commands.push(Command::Text(run));
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}
