//! The operator dispatcher and the steppable driver loop.

use crate::color::{self, ColorComponents, ColorSpaceHandle, Paint};
use crate::device::{CommandSink, BOTH, CLIP, FILL, STROKE};
use crate::error::{Error, Result};
use crate::interpret::path::PathBuilder;
use crate::interpret::state::{affine_from_row, apply_ext_g_state, GraphicsState};
use crate::resources::{category, Resources};
use crate::stack::OperandStack;
use crate::x_object;
use crate::{InterpreterSettings, InterpreterWarning, RunState, Watchable};
use log::warn;
use plume_syntax::{ContentItem, ObjectParser, Value};
use std::sync::{Arc, Mutex, Weak};

pub(crate) mod path;
pub(crate) mod state;

/// The content-stream interpreter.
///
/// Constructed over the decoded bytes of a single content stream, its
/// resources, and a host-owned command sink. The host keeps the sink alive;
/// the interpreter only observes it weakly and stops once it is gone.
pub struct Interpreter<'a> {
    data: &'a [u8],
    pub(crate) parser: ObjectParser<'a>,
    stack: OperandStack,
    states: Vec<GraphicsState>,
    state: GraphicsState,
    path: PathBuilder,
    clip: u8,
    catch_exceptions: bool,
    sink: Weak<Mutex<dyn CommandSink>>,
    pub(crate) resources: Resources,
    pub(crate) settings: InterpreterSettings,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter with default [`InterpreterSettings`].
    pub fn new<S: CommandSink + 'static>(
        sink: &Arc<Mutex<S>>,
        data: &'a [u8],
        resources: Resources,
    ) -> Self {
        Self::with_settings(sink, data, resources, InterpreterSettings::default())
    }

    /// Create an interpreter with explicit settings.
    pub fn with_settings<S: CommandSink + 'static>(
        sink: &Arc<Mutex<S>>,
        data: &'a [u8],
        resources: Resources,
        settings: InterpreterSettings,
    ) -> Self {
        let sink: Arc<Mutex<dyn CommandSink>> = sink.clone();

        Self {
            data,
            parser: ObjectParser::new(data),
            stack: OperandStack::new(),
            states: Vec::new(),
            state: GraphicsState::new(),
            path: PathBuilder::new(),
            clip: 0,
            catch_exceptions: false,
            sink: Arc::downgrade(&sink),
            resources,
            settings,
        }
    }

    /// Execute a single operator.
    fn execute(&mut self, op: &[u8], sink: &mut dyn CommandSink) -> Result<()> {
        match op {
            b"q" => self.save_state(sink),
            b"Q" => self.restore_state(sink),
            b"cm" => {
                let row = self.stack.pop_floats(6)?;
                sink.transform(affine_from_row(&row));
            }
            b"w" => {
                let width = self.stack.pop_float()?;
                sink.stroke_width(width);
            }
            b"J" => {
                let cap = self.stack.pop_int()?;
                sink.end_cap(cap);
            }
            b"j" => {
                let join = self.stack.pop_int()?;
                sink.line_join(join);
            }
            b"M" => {
                let limit = self.stack.pop_int()?;
                sink.miter_limit(limit as f32);
            }
            b"d" => {
                let phase = self.stack.pop_float()?;
                let array = self.stack.pop_float_array()?;
                sink.dash(array, phase);
            }
            // Rendering intent and flatness are consumed and ignored.
            b"ri" => {
                self.stack.pop_string()?;
            }
            b"i" => {
                self.stack.pop_float()?;
            }
            b"gs" => {
                let name = self.pop_name()?;
                let dict = self.resources.find(&name, category::EXT_G_STATE)?;
                apply_ext_g_state(&dict, &mut self.state, &self.resources, &self.settings, sink)?;
            }

            // Path construction.
            b"m" => {
                let y = self.stack.pop_float()?;
                let x = self.stack.pop_float()?;
                self.path.move_to(x, y);
            }
            b"l" => {
                let y = self.stack.pop_float()?;
                let x = self.stack.pop_float()?;
                self.path.line_to(x, y);
            }
            b"c" => {
                let coords = self.stack.pop_floats(6)?;
                self.path.curve_to(&coords);
            }
            b"v" => {
                let coords = self.stack.pop_floats(4)?;
                self.path.curve_from_current(&coords);
            }
            b"y" => {
                let coords = self.stack.pop_floats(4)?;
                self.path.curve_to_endpoint(&coords);
            }
            b"h" => self.path.close(),
            b"re" => {
                let coords = self.stack.pop_floats(4)?;
                self.path.rect(coords[0], coords[1], coords[2], coords[3]);
            }

            // Path painting. Each commit resets the path and the clip flag.
            b"S" => self.commit_path(sink, STROKE),
            b"s" => {
                self.path.close();
                self.commit_path(sink, STROKE);
            }
            b"f" | b"F" => self.commit_path(sink, FILL),
            b"f*" => {
                self.path.set_even_odd();
                self.commit_path(sink, FILL);
            }
            b"B" => self.commit_path(sink, BOTH),
            b"B*" => {
                self.path.set_even_odd();
                self.commit_path(sink, BOTH);
            }
            b"b" => {
                self.path.close();
                self.commit_path(sink, BOTH);
            }
            b"b*" => {
                self.path.close();
                self.path.set_even_odd();
                self.commit_path(sink, BOTH);
            }
            b"n" => self.commit_path(sink, 0),
            b"W" => self.clip = CLIP,
            b"W*" => {
                self.path.set_even_odd();
                self.clip = CLIP;
            }

            // Color.
            b"CS" => {
                let name = self.pop_name()?;
                self.state.stroke_space = self.resolve_color_space(&name)?;
            }
            b"cs" => {
                let name = self.pop_name()?;
                self.state.fill_space = self.resolve_color_space(&name)?;
            }
            b"SC" => {
                let paint = self.solid_paint(true)?;
                sink.stroke_paint(paint);
            }
            b"sc" => {
                let paint = self.solid_paint(false)?;
                sink.fill_paint(paint);
            }
            b"SCN" => self.special_color(sink, true)?,
            b"scn" => self.special_color(sink, false)?,
            b"G" => {
                self.state.stroke_space = color::device_gray();
                let paint = self.solid_paint(true)?;
                sink.stroke_paint(paint);
            }
            b"g" => {
                self.state.fill_space = color::device_gray();
                let paint = self.solid_paint(false)?;
                sink.fill_paint(paint);
            }
            b"RG" => {
                self.state.stroke_space = color::device_rgb();
                let paint = self.solid_paint(true)?;
                sink.stroke_paint(paint);
            }
            b"rg" => {
                self.state.fill_space = color::device_rgb();
                let paint = self.solid_paint(false)?;
                sink.fill_paint(paint);
            }
            b"K" => {
                self.state.stroke_space = color::device_cmyk();
                let paint = self.solid_paint(true)?;
                sink.stroke_paint(paint);
            }
            b"k" => {
                self.state.fill_space = color::device_cmyk();
                let paint = self.solid_paint(false)?;
                sink.fill_paint(paint);
            }

            // External objects.
            b"Do" => {
                let name = self.pop_name()?;
                let object = self.resources.find(&name, category::X_OBJECT)?;
                x_object::invoke(self, &object, sink)?;
            }
            b"sh" => self.shade(sink)?,
            b"BI" => x_object::inline_image(self, sink)?,

            // Text.
            b"BT" => self.state.text.reset(sink),
            b"ET" => self.state.text.end(sink),
            b"Tc" => {
                let value = self.stack.pop_float()?;
                self.state.text.set_char_space(sink, value);
            }
            b"Tw" => {
                let value = self.stack.pop_float()?;
                self.state.text.set_word_space(sink, value);
            }
            b"Tz" => {
                let value = self.stack.pop_float()?;
                self.state.text.set_horizontal_scale(sink, value);
            }
            b"TL" => {
                let value = self.stack.pop_float()?;
                self.state.text.set_leading(value);
            }
            b"Ts" => {
                let value = self.stack.pop_float()?;
                self.state.text.set_rise(sink, value);
            }
            b"Tf" => {
                let size = self.stack.pop_float()?;
                let name = self.pop_name()?;
                let object = self.resources.find(&name, category::FONT)?;
                let font = (self.settings.font_resolver)(&object, &self.resources)?;
                self.state.text.set_font(sink, font, size);
            }
            b"Tr" => {
                let mode = self.stack.pop_int()?;
                self.state.text.set_render_mode(sink, mode);
            }
            b"Td" => {
                let ty = self.stack.pop_float()?;
                let tx = self.stack.pop_float()?;
                self.state.text.translate(sink, tx, ty);
            }
            b"TD" => {
                let ty = self.stack.pop_float()?;
                let tx = self.stack.pop_float()?;
                self.state.text.set_leading(-ty);
                self.state.text.translate(sink, tx, ty);
            }
            b"Tm" => {
                let row = self.stack.pop_floats(6)?;
                self.state.text.set_matrix(sink, affine_from_row(&row));
            }
            b"T*" => self.state.text.next_line(sink),
            b"Tj" => {
                let text = self.stack.pop_string()?;
                self.state.text.show(text);
            }
            b"'" => {
                let text = self.stack.pop_string()?;
                self.state.text.next_line(sink);
                self.state.text.show(text);
            }
            b"\"" => {
                let text = self.stack.pop_string()?;
                let char_space = self.stack.pop_float()?;
                let word_space = self.stack.pop_float()?;
                self.state.text.set_word_space(sink, word_space);
                self.state.text.set_char_space(sink, char_space);
                self.state.text.next_line(sink);
                self.state.text.show(text);
            }
            b"TJ" => {
                let elements = self.stack.pop_array()?;
                for value in elements {
                    match value {
                        Value::Number(n) => self.state.text.adjust(n as f32),
                        Value::Str(bytes) => self.state.text.show(bytes),
                        other => warn!("ignoring {other:?} in a TJ array"),
                    }
                }
            }

            // Marked content: operands are consumed, nothing is emitted.
            b"MP" | b"BMC" => {
                self.stack.pop_string()?;
            }
            b"DP" | b"BDC" => {
                let _ = self.stack.pop();
                self.stack.pop_string()?;
            }
            b"EMC" => {}

            // Type-3 glyph metrics.
            b"d0" => {
                self.stack.pop_floats(2)?;
            }
            b"d1" => {
                self.stack.pop_floats(6)?;
            }

            // Error-suppression bracket.
            b"BX" => self.catch_exceptions = true,
            b"EX" => self.catch_exceptions = false,

            // Some encoders mush operator pairs into a single token.
            b"QBT" => {
                self.restore_state(sink);
                self.state.text.reset(sink);
            }
            b"Qq" => {
                self.restore_state(sink);
                self.save_state(sink);
            }
            b"qBT" => {
                self.save_state(sink);
                self.state.text.reset(sink);
            }

            // Seen in the wild; nothing sensible to do with them.
            b"q0" | b"q1" => {
                warn!("ignoring unhandled operator {}", display_op(op));
            }

            other => {
                return Err(Error::UnknownOperator(display_op(other)));
            }
        }

        Ok(())
    }

    /// `q`: clone the graphics state onto the save stack.
    fn save_state(&mut self, sink: &mut dyn CommandSink) {
        self.states.push(self.state.clone());
        sink.push();
    }

    /// `Q`: the pop is mirrored to the sink even when the save stack is
    /// empty; the state itself is only replaced when there is something to
    /// replace it with.
    fn restore_state(&mut self, sink: &mut dyn CommandSink) {
        sink.pop();
        if let Some(previous) = self.states.pop() {
            self.state = previous;
        }
    }

    /// Commit the current path with the given paint mode, resetting the
    /// path and the clip flag. A bare `n` (mode 0, no clip pending) emits
    /// nothing.
    fn commit_path(&mut self, sink: &mut dyn CommandSink, mode: u8) {
        let clip = std::mem::take(&mut self.clip);
        let (path, fill_rule) = self.path.take();

        if mode != 0 || clip != 0 {
            sink.path(path, fill_rule, mode | clip);
        }
    }

    /// Pop a name operand as UTF-8 text.
    fn pop_name(&mut self) -> Result<String> {
        let bytes = self.stack.pop_string()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Resolve a color-space name: device spaces and `Pattern` directly,
    /// anything else through the `ColorSpace` resource category and the
    /// color-space collaborator.
    fn resolve_color_space(&mut self, name: &str) -> Result<ColorSpaceHandle> {
        if let Some(space) = color::named(name) {
            return Ok(space);
        }

        let object = self.resources.find(name, category::COLOR_SPACE)?;
        (self.settings.color_space_resolver)(&object, &self.resources)
    }

    /// Pop as many components as the current space has and build a solid
    /// paint (`SC`/`sc` and the device-color shorthands).
    fn solid_paint(&mut self, stroke: bool) -> Result<Paint> {
        let space = if stroke {
            self.state.stroke_space.clone()
        } else {
            self.state.fill_space.clone()
        };

        let components = self.stack.pop_floats(space.num_components())?;
        Ok(Paint::solid(space, &components))
    }

    /// `SCN`/`scn`: like `SC`/`sc`, unless the current space is a Pattern
    /// space, in which case a trailing name selects a pattern resource.
    fn special_color(&mut self, sink: &mut dyn CommandSink, stroke: bool) -> Result<()> {
        let space = if stroke {
            self.state.stroke_space.clone()
        } else {
            self.state.fill_space.clone()
        };

        let paint = if space.is_pattern() {
            self.pattern_paint()?
        } else {
            if self.stack.top_is_string() {
                self.stack.pop_string()?;
                warn!("ignoring a pattern name for a non-pattern color space");
            }
            self.solid_paint(stroke)?
        };

        if stroke {
            sink.stroke_paint(paint);
        } else {
            sink.fill_paint(paint);
        }

        Ok(())
    }

    /// Pop a pattern name plus any preceding numeric components and hand
    /// them to the pattern collaborator.
    fn pattern_paint(&mut self) -> Result<Paint> {
        let name = self.pop_name()?;
        let object = self.resources.find(&name, category::PATTERN)?;

        let components = if self.stack.is_empty() {
            ColorComponents::new()
        } else {
            let popped = self.stack.pop_floats(self.stack.len())?;
            ColorComponents::from_slice(&popped)
        };

        (self.settings.pattern_resolver)(&object, &components, &self.resources)
    }

    /// `sh`: resolution and construction failures are tolerated with a
    /// warning.
    fn shade(&mut self, sink: &mut dyn CommandSink) -> Result<()> {
        let name = self.pop_name()?;

        let shading = self
            .resources
            .find(&name, category::SHADING)
            .and_then(|object| (self.settings.shader_resolver)(&object, &self.resources));

        match shading {
            Ok(shading) => {
                sink.push();
                sink.shade(shading.paint().clone(), shading.bbox());
                sink.pop();
            }
            Err(e) => {
                warn!("dropping sh: {e}");
                (self.settings.warning_sink)(InterpreterWarning::ShadingFailure);
            }
        }

        Ok(())
    }
}

impl Watchable for Interpreter<'_> {
    fn setup(&mut self) {
        self.parser = ObjectParser::new(self.data);
        self.stack = OperandStack::new();
        self.states = Vec::new();
        self.state = GraphicsState::new();
        self.path = PathBuilder::new();
        self.clip = 0;
        self.catch_exceptions = false;
    }

    fn iterate(&mut self) -> Result<RunState> {
        // Resolve the sink for the duration of this step only, so the host
        // can reclaim it between steps.
        let Some(sink) = self.sink.upgrade() else {
            warn!("command sink is gone, stopping");
            return Ok(RunState::Stopped);
        };
        let mut sink = sink.lock().unwrap();
        let sink: &mut dyn CommandSink = &mut *sink;

        let Some(item) = self.parser.parse_object()? else {
            return Ok(RunState::Completed);
        };

        match item {
            ContentItem::Value(value) => self.stack.push(value),
            ContentItem::Operator(op) => {
                if let Err(e) = self.execute(op, sink) {
                    if self.catch_exceptions && e.is_suppressible() {
                        warn!("skipping operator {}: {e}", display_op(op));
                        (self.settings.warning_sink)(InterpreterWarning::OperatorSkipped);
                    } else {
                        return Err(e);
                    }
                }

                if !self.stack.is_empty() {
                    warn!(
                        "operand stack not empty after {} ({} left)",
                        display_op(op),
                        self.stack.len()
                    );
                    (self.settings.warning_sink)(InterpreterWarning::ResidualOperands);
                    self.stack.clear();
                }
            }
        }

        Ok(RunState::Running)
    }

    fn cleanup(&mut self) {
        if let Some(sink) = self.sink.upgrade() {
            let mut sink = sink.lock().unwrap();
            let sink: &mut dyn CommandSink = &mut *sink;

            self.state.text.flush(sink);
            sink.finish();
        }
    }
}

fn display_op(op: &[u8]) -> String {
    String::from_utf8_lossy(op).into_owned()
}

#[cfg(test)]
mod tests {
    use super::Interpreter;
    use crate::device::{Command, CommandRecorder};
    use crate::resources::Resources;
    use crate::{Error, InterpreterSettings, InterpreterWarning, RunState, Watchable};
    use std::sync::{Arc, Mutex};

    fn run(data: &[u8]) -> (Vec<Command>, Interpreter<'_>) {
        let sink = Arc::new(Mutex::new(CommandRecorder::new()));
        let mut interpreter = Interpreter::new(&sink, data, Resources::default());
        interpreter.go().unwrap();

        let commands = sink.lock().unwrap().take_commands();
        (commands, interpreter)
    }

    #[test]
    fn save_restore_round_trips_the_state() {
        let (commands, interpreter) = run(b"q 1 0 0 RG Q");

        assert_eq!(commands[0], Command::Push);
        assert_eq!(*commands.last().unwrap(), Command::Pop);
        // The restored state is the pre-save one.
        assert_eq!(interpreter.state.stroke_space.name(), "DeviceGray");
    }

    #[test]
    fn restore_on_an_empty_save_stack_is_a_noop() {
        let (commands, interpreter) = run(b"Q 1 w");
        assert_eq!(
            commands,
            vec![Command::Pop, Command::StrokeWidth(1.0)]
        );
        assert_eq!(interpreter.state.stroke_space.name(), "DeviceGray");
    }

    #[test]
    fn painting_resets_path_and_clip_flag() {
        let (_, interpreter) = run(b"0 0 5 5 re W n");
        assert!(interpreter.path.is_empty());
        assert_eq!(interpreter.clip, 0);
    }

    #[test]
    fn residual_operands_are_cleared_with_a_warning() {
        let warnings = Arc::new(Mutex::new(Vec::new()));
        let settings = {
            let warnings = warnings.clone();
            InterpreterSettings {
                warning_sink: Arc::new(move |w| warnings.lock().unwrap().push(w)),
                ..Default::default()
            }
        };

        let sink = Arc::new(Mutex::new(CommandRecorder::new()));
        let mut interpreter =
            Interpreter::with_settings(&sink, b"1 2 3 w", Resources::default(), settings);
        interpreter.go().unwrap();

        assert_eq!(
            sink.lock().unwrap().commands(),
            &[Command::StrokeWidth(3.0)]
        );
        assert_eq!(
            warnings.lock().unwrap().as_slice(),
            &[InterpreterWarning::ResidualOperands]
        );
        assert!(interpreter.stack.is_empty());
    }

    #[test]
    fn unknown_operator_is_fatal_outside_a_bracket() {
        let sink = Arc::new(Mutex::new(CommandRecorder::new()));
        let mut interpreter = Interpreter::new(&sink, b"3 4 bar", Resources::default());

        let error = interpreter.go().unwrap_err();
        assert!(matches!(error, Error::UnknownOperator(op) if op == "bar"));
        // The sink still sees finish, with the partial sequence.
        assert!(sink.lock().unwrap().finished());
    }

    #[test]
    fn bracket_downgrades_unknown_operators() {
        let (commands, _) = run(b"BX 1 2 foo EX 5 w");
        assert_eq!(commands, vec![Command::StrokeWidth(5.0)]);
    }

    #[test]
    fn lost_sink_stops_iteration() {
        let sink = Arc::new(Mutex::new(CommandRecorder::new()));
        let mut interpreter = Interpreter::new(&sink, b"1 w", Resources::default());
        interpreter.setup();

        drop(sink);
        assert_eq!(interpreter.iterate().unwrap(), RunState::Stopped);
    }

    #[test]
    fn mushed_operators_decompose() {
        let (commands, _) = run(b"q Qq Q");
        assert_eq!(
            commands,
            vec![Command::Push, Command::Pop, Command::Push, Command::Pop]
        );
    }
}
