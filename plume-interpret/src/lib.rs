/*!
An interpreter for PDF content streams.

The interpreter consumes the decoded byte stream of a single page (or Form
XObject) together with its resource dictionary and drives a
[`CommandSink`]: an abstract recorder of drawing commands. It is the
evaluation half of the `plume` workspace; lexing and object parsing live in
`plume-syntax`.

Everything the content-stream language merely *references* is treated as an
external collaborator and reached through resolver callbacks in
[`InterpreterSettings`]: fonts, images, color spaces, patterns and
shadings. The defaults wrap the raw objects without interpreting them,
which is enough to record faithful command streams; renderers install their
own resolvers to get richer products.

# Driving the interpreter

The interpreter is externally steppable. The host owns the sink and hands
the interpreter a weak reference:

```
use plume_interpret::{CommandRecorder, Interpreter, Resources, Watchable};
use std::sync::{Arc, Mutex};

let sink = Arc::new(Mutex::new(CommandRecorder::new()));
let data = b"0.5 g 10 10 20 20 re f";

let mut interpreter = Interpreter::new(&sink, data, Resources::default());
interpreter.go().unwrap();

let recorder = sink.lock().unwrap();
assert_eq!(recorder.commands().len(), 2);
```

Each [`Watchable::iterate`] call executes one operator (or pushes one
operand) and reports whether the stream is [`RunState::Running`],
[`RunState::Completed`], or [`RunState::Stopped`] because the sink was
dropped.
*/

pub mod color;
pub mod device;
pub mod error;
pub mod font;
pub mod image;
pub mod resources;
pub mod shading;
pub mod text;

mod interpret;
mod stack;
mod util;
mod x_object;

pub use plume_syntax;

pub use color::{Color, ColorComponents, ColorSpace, ColorSpaceHandle, Paint, PatternPaint};
pub use device::{Command, CommandList, CommandRecorder, CommandSink};
pub use error::{Error, Result};
pub use font::Font;
pub use image::Image;
pub use interpret::Interpreter;
pub use resources::Resources;
pub use shading::Shading;
pub use text::{TextElement, TextRun};

use plume_syntax::PdfObject;
use std::sync::Arc;

/// The policy deciding which regions lie inside a path.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// The result of one driver step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunState {
    /// More steps are needed.
    Running,
    /// The stream is exhausted.
    Completed,
    /// The command sink is gone; iteration cannot continue.
    Stopped,
}

/// An externally driven unit of work.
///
/// The host calls [`Watchable::setup`] once, then [`Watchable::iterate`]
/// until it returns something other than [`RunState::Running`], then
/// [`Watchable::cleanup`], or just [`Watchable::go`], which does all of
/// that in a blocking loop. `cleanup` runs even when an `iterate` failed,
/// so a sink always sees `finish`, with whatever partial command sequence
/// was emitted.
pub trait Watchable {
    /// Prepare for iteration.
    fn setup(&mut self);

    /// Advance by one step.
    fn iterate(&mut self) -> Result<RunState>;

    /// Release per-run state and signal completion downstream.
    fn cleanup(&mut self);

    /// Run to completion on the calling thread.
    fn go(&mut self) -> Result<()> {
        self.setup();

        let result = loop {
            match self.iterate() {
                Ok(RunState::Running) => {}
                Ok(_) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.cleanup();
        result
    }
}

/// Warnings surfaced through [`InterpreterSettings::warning_sink`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InterpreterWarning {
    /// An operator failed inside a `BX … EX` bracket and was skipped.
    OperatorSkipped,
    /// A shading could not be built; the `sh` was dropped.
    ShadingFailure,
    /// Residual operands were cleared after an operator completed.
    ResidualOperands,
}

/// Resolves a color-space object into a [`ColorSpaceHandle`].
pub type ColorSpaceResolverFn =
    Arc<dyn Fn(&Arc<PdfObject>, &Resources) -> Result<ColorSpaceHandle> + Send + Sync>;
/// Resolves a font dictionary into a [`Font`].
pub type FontResolverFn = Arc<dyn Fn(&Arc<PdfObject>, &Resources) -> Result<Font> + Send + Sync>;
/// Resolves an image stream object into an [`Image`].
pub type ImageResolverFn = Arc<dyn Fn(&Arc<PdfObject>, &Resources) -> Result<Image> + Send + Sync>;
/// Builds a paint from a pattern object and the numeric components that
/// preceded its name on the operand stack.
pub type PatternResolverFn =
    Arc<dyn Fn(&Arc<PdfObject>, &[f32], &Resources) -> Result<Paint> + Send + Sync>;
/// Resolves a shading dictionary into a [`Shading`].
pub type ShaderResolverFn =
    Arc<dyn Fn(&Arc<PdfObject>, &Resources) -> Result<Shading> + Send + Sync>;
/// Receives [`InterpreterWarning`]s as they occur.
pub type WarningSinkFn = Arc<dyn Fn(InterpreterWarning) + Send + Sync>;

/// The collaborator seams of the interpreter.
///
/// Every concern the content-stream language references but does not
/// define (font programs, image decoding, non-device color spaces,
/// patterns, shadings) enters through one of these callbacks.
#[derive(Clone)]
pub struct InterpreterSettings {
    pub color_space_resolver: ColorSpaceResolverFn,
    pub font_resolver: FontResolverFn,
    pub image_resolver: ImageResolverFn,
    pub pattern_resolver: PatternResolverFn,
    pub shader_resolver: ShaderResolverFn,
    pub warning_sink: WarningSinkFn,
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            color_space_resolver: Arc::new(|object, _| {
                object
                    .as_name()
                    .and_then(color::named)
                    .ok_or_else(|| Error::Collaborator("unsupported color space".into()))
            }),
            font_resolver: Arc::new(|object, _| Ok(Font::new(object.clone()))),
            image_resolver: Arc::new(|object, _| Ok(Image::new(object.clone()))),
            pattern_resolver: Arc::new(|object, components, _| {
                Ok(Paint::Pattern(PatternPaint {
                    object: object.clone(),
                    components: components.into(),
                }))
            }),
            shader_resolver: Arc::new(|_, _| {
                Err(Error::Collaborator(
                    "no shader collaborator installed".into(),
                ))
            }),
            warning_sink: Arc::new(|_| {}),
        }
    }
}
