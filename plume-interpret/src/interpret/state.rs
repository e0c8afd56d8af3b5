//! The graphics state and the application of external graphics-state
//! dictionaries.

use crate::color::{self, ColorSpaceHandle};
use crate::device::CommandSink;
use crate::error::Result;
use crate::resources::{category, Resources};
use crate::text::TextFormat;
use crate::util::OptionLog;
use crate::InterpreterSettings;
use kurbo::Affine;
use plume_syntax::PdfObject;
use smallvec::SmallVec;
use std::sync::Arc;

/// The interpreter's slice of the graphics state: the current color spaces
/// and the text formatter. Everything else (transform, stroke parameters,
/// alphas) lives in the sink, which mirrors `q`/`Q` through
/// [`CommandSink::push`]/[`CommandSink::pop`].
#[derive(Clone, Debug)]
pub(crate) struct GraphicsState {
    /// Shared handle; color spaces are immutable.
    pub(crate) fill_space: ColorSpaceHandle,
    pub(crate) stroke_space: ColorSpaceHandle,
    /// Cloned by value on save.
    pub(crate) text: TextFormat,
}

impl GraphicsState {
    pub(crate) fn new() -> Self {
        Self {
            fill_space: color::device_gray(),
            stroke_space: color::device_gray(),
            text: TextFormat::new(),
        }
    }
}

/// Apply a named `ExtGState` dictionary (`gs`).
///
/// The supported subset is `LW`, `LC`, `LJ`, `Font`, `ML`, `D`, `CA` and
/// `ca`; unknown entries are ignored.
pub(crate) fn apply_ext_g_state(
    dict: &Arc<PdfObject>,
    state: &mut GraphicsState,
    resources: &Resources,
    settings: &InterpreterSettings,
    sink: &mut dyn CommandSink,
) -> Result<()> {
    if let Some(width) = dict.get("LW").and_then(|v| v.as_f32()) {
        sink.stroke_width(width);
    }

    if let Some(cap) = dict.get("LC").and_then(|v| v.as_i32()) {
        sink.end_cap(cap);
    }

    if let Some(join) = dict.get("LJ").and_then(|v| v.as_i32()) {
        sink.line_join(join);
    }

    if let Some(limit) = dict.get("ML").and_then(|v| v.as_f32()) {
        sink.miter_limit(limit);
    }

    if let Some(font_entry) = dict.get("Font") {
        apply_font_entry(font_entry, state, resources, settings, sink)?;
    }

    if let Some(dash) = dict.get("D") {
        apply_dash_entry(dash, sink)
            .warn_none("invalid dash entry in graphics state dictionary");
    }

    if let Some(alpha) = dict.get("CA").and_then(|v| v.as_f32()) {
        sink.stroke_alpha(alpha);
    }

    if let Some(alpha) = dict.get("ca").and_then(|v| v.as_f32()) {
        sink.fill_alpha(alpha);
    }

    Ok(())
}

/// `Font` entry: a `[name, size]` pair resolved through the font
/// collaborator, like `Tf`.
fn apply_font_entry(
    entry: &Arc<PdfObject>,
    state: &mut GraphicsState,
    resources: &Resources,
    settings: &InterpreterSettings,
    sink: &mut dyn CommandSink,
) -> Result<()> {
    let (Some(name), Some(size)) = (
        entry.at(0).and_then(|n| n.as_name()),
        entry.at(1).and_then(|s| s.as_f32()),
    ) else {
        log::warn!("invalid Font entry in graphics state dictionary");
        return Ok(());
    };

    let object = resources.find(name, category::FONT)?;
    let font = (settings.font_resolver)(&object, resources)?;
    state.text.set_font(sink, font, size);

    Ok(())
}

/// `D` entry: `[dash-array, phase]`.
fn apply_dash_entry(entry: &Arc<PdfObject>, sink: &mut dyn CommandSink) -> Option<()> {
    let array = entry.at(0)?;
    let phase = entry.at(1)?.as_f32()?;

    let dashes: SmallVec<[f32; 4]> = array
        .elements()?
        .iter()
        .map(|e| e.as_f32())
        .collect::<Option<_>>()?;

    sink.dash(dashes, phase);
    Some(())
}

/// Build an affine out of the six numbers of a `cm`/`Tm`/`Matrix` row.
pub(crate) fn affine_from_row(row: &[f32]) -> Affine {
    Affine::new([
        f64::from(row[0]),
        f64::from(row[1]),
        f64::from(row[2]),
        f64::from(row[3]),
        f64::from(row[4]),
        f64::from(row[5]),
    ])
}

#[cfg(test)]
mod tests {
    use super::{apply_ext_g_state, GraphicsState};
    use crate::device::{Command, CommandRecorder};
    use crate::resources::Resources;
    use crate::InterpreterSettings;
    use plume_syntax::PdfObject;
    use smallvec::smallvec;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn entry(key: &str, value: PdfObject) -> (String, Arc<PdfObject>) {
        (key.to_string(), Arc::new(value))
    }

    #[test]
    fn applies_the_supported_subset() {
        let dict = Arc::new(PdfObject::dict(HashMap::from([
            entry("LW", PdfObject::number(2.0)),
            entry("LC", PdfObject::number(1.0)),
            entry("CA", PdfObject::number(0.5)),
            entry("ca", PdfObject::number(0.25)),
            entry("Ignored", PdfObject::name("Whatever")),
        ])));

        let mut state = GraphicsState::new();
        let mut recorder = CommandRecorder::new();
        apply_ext_g_state(
            &dict,
            &mut state,
            &Resources::default(),
            &InterpreterSettings::default(),
            &mut recorder,
        )
        .unwrap();

        let commands = recorder.commands();
        assert!(commands.contains(&Command::StrokeWidth(2.0)));
        assert!(commands.contains(&Command::EndCap(1)));
        assert!(commands.contains(&Command::StrokeAlpha(0.5)));
        assert!(commands.contains(&Command::FillAlpha(0.25)));
    }

    #[test]
    fn applies_dash_arrays() {
        let dash_array = PdfObject::array(vec![
            Arc::new(PdfObject::number(3.0)),
            Arc::new(PdfObject::number(1.0)),
        ]);
        let dict = Arc::new(PdfObject::dict(HashMap::from([entry(
            "D",
            PdfObject::array(vec![
                Arc::new(dash_array),
                Arc::new(PdfObject::number(0.5)),
            ]),
        )])));

        let mut state = GraphicsState::new();
        let mut recorder = CommandRecorder::new();
        apply_ext_g_state(
            &dict,
            &mut state,
            &Resources::default(),
            &InterpreterSettings::default(),
            &mut recorder,
        )
        .unwrap();

        assert_eq!(
            recorder.commands(),
            &[Command::Dash(smallvec![3.0, 1.0], 0.5)]
        );
    }
}
