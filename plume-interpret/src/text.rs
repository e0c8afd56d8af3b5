//! The text formatter.
//!
//! Tracks the text and line matrices plus the spacing parameters, and
//! batches shown strings into [`TextRun`]s. A run stays open across
//! consecutive shows and is flushed whenever the matrix is repositioned,
//! the font changes, a spacing parameter changes, or the text object ends.

use crate::device::CommandSink;
use crate::font::Font;
use kurbo::Affine;

/// One element of a glyph run.
#[derive(Clone, Debug, PartialEq)]
pub enum TextElement {
    /// Raw string bytes to be mapped to glyphs downstream.
    Show(Vec<u8>),
    /// A kerning adjustment in thousandths of text-space units, as found
    /// between the strings of a `TJ` array.
    Adjust(f32),
}

/// A run of shown text together with the formatter parameters it was shown
/// under. Glyph mapping and advance widths are the consumer's job.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub font: Option<Font>,
    pub size: f32,
    /// The text matrix at the start of the run.
    pub matrix: Affine,
    pub char_space: f32,
    pub word_space: f32,
    /// Horizontal scaling in percent (`Tz` units).
    pub horizontal_scale: f32,
    pub rise: f32,
    pub render_mode: i32,
    pub elements: Vec<TextElement>,
}

/// The mutable text state of a graphics state.
///
/// Cloned by value on `q`: unlike the shared color-space handles it carries
/// matrices and a pending run that must not leak across a save.
#[derive(Clone, Debug)]
pub(crate) struct TextFormat {
    char_space: f32,
    word_space: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
    render_mode: i32,
    font: Option<(Font, f32)>,
    matrix: Affine,
    line_matrix: Affine,
    pending: Vec<TextElement>,
    /// The text matrix at the moment the pending run started.
    run_matrix: Affine,
}

impl Default for TextFormat {
    fn default() -> Self {
        Self {
            char_space: 0.0,
            word_space: 0.0,
            horizontal_scale: 100.0,
            leading: 0.0,
            rise: 0.0,
            render_mode: 0,
            font: None,
            matrix: Affine::IDENTITY,
            line_matrix: Affine::IDENTITY,
            pending: Vec::new(),
            run_matrix: Affine::IDENTITY,
        }
    }
}

impl TextFormat {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Begin a text object (`BT`): both matrices return to identity.
    pub(crate) fn reset(&mut self, sink: &mut dyn CommandSink) {
        self.flush(sink);
        self.matrix = Affine::IDENTITY;
        self.line_matrix = Affine::IDENTITY;
    }

    /// End a text object (`ET`).
    pub(crate) fn end(&mut self, sink: &mut dyn CommandSink) {
        self.flush(sink);
    }

    /// Translate the line matrix and restart the text matrix from it
    /// (`Td`).
    pub(crate) fn translate(&mut self, sink: &mut dyn CommandSink, tx: f32, ty: f32) {
        self.flush(sink);
        self.line_matrix *= Affine::translate((f64::from(tx), f64::from(ty)));
        self.matrix = self.line_matrix;
    }

    /// Advance to the next line using the current leading (`T*`).
    pub(crate) fn next_line(&mut self, sink: &mut dyn CommandSink) {
        let leading = self.leading;
        self.translate(sink, 0.0, -leading);
    }

    /// Set the text matrix directly (`Tm`).
    pub(crate) fn set_matrix(&mut self, sink: &mut dyn CommandSink, matrix: Affine) {
        self.flush(sink);
        self.matrix = matrix;
        self.line_matrix = matrix;
    }

    pub(crate) fn set_char_space(&mut self, sink: &mut dyn CommandSink, value: f32) {
        self.flush(sink);
        self.char_space = value;
    }

    pub(crate) fn set_word_space(&mut self, sink: &mut dyn CommandSink, value: f32) {
        self.flush(sink);
        self.word_space = value;
    }

    pub(crate) fn set_horizontal_scale(&mut self, sink: &mut dyn CommandSink, value: f32) {
        self.flush(sink);
        self.horizontal_scale = value;
    }

    pub(crate) fn set_leading(&mut self, value: f32) {
        self.leading = value;
    }

    pub(crate) fn set_rise(&mut self, sink: &mut dyn CommandSink, value: f32) {
        self.flush(sink);
        self.rise = value;
    }

    pub(crate) fn set_render_mode(&mut self, sink: &mut dyn CommandSink, mode: i32) {
        self.flush(sink);
        self.render_mode = mode;
    }

    pub(crate) fn set_font(&mut self, sink: &mut dyn CommandSink, font: Font, size: f32) {
        self.flush(sink);
        self.font = Some((font, size));
    }

    /// Append shown bytes to the pending run.
    pub(crate) fn show(&mut self, bytes: Vec<u8>) {
        if self.pending.is_empty() {
            self.run_matrix = self.matrix;
        }
        self.pending.push(TextElement::Show(bytes));
    }

    /// Append a kerning adjustment to the pending run.
    pub(crate) fn adjust(&mut self, amount: f32) {
        if self.pending.is_empty() {
            self.run_matrix = self.matrix;
        }
        self.pending.push(TextElement::Adjust(amount));
    }

    /// Emit the pending run, if any.
    pub(crate) fn flush(&mut self, sink: &mut dyn CommandSink) {
        if self.pending.is_empty() {
            return;
        }

        let (font, size) = match &self.font {
            Some((font, size)) => (Some(font.clone()), *size),
            None => (None, 0.0),
        };

        sink.text(TextRun {
            font,
            size,
            matrix: self.run_matrix,
            char_space: self.char_space,
            word_space: self.word_space,
            horizontal_scale: self.horizontal_scale,
            rise: self.rise,
            render_mode: self.render_mode,
            elements: std::mem::take(&mut self.pending),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{TextElement, TextFormat};
    use crate::device::{Command, CommandRecorder, CommandSink};
    use kurbo::Affine;

    #[test]
    fn consecutive_shows_share_a_run() {
        let mut format = TextFormat::new();
        let mut recorder = CommandRecorder::new();

        format.show(b"ab".to_vec());
        format.adjust(-50.0);
        format.show(b"cd".to_vec());
        format.end(&mut recorder);

        let [Command::Text(run)] = recorder.commands() else {
            panic!("expected one text run, got {:?}", recorder.commands());
        };
        assert_eq!(
            run.elements,
            vec![
                TextElement::Show(b"ab".to_vec()),
                TextElement::Adjust(-50.0),
                TextElement::Show(b"cd".to_vec()),
            ]
        );
    }

    #[test]
    fn translate_flushes_and_moves_both_matrices() {
        let mut format = TextFormat::new();
        let mut recorder = CommandRecorder::new();

        format.show(b"x".to_vec());
        format.translate(&mut recorder, 100.0, 200.0);
        format.show(b"y".to_vec());
        format.end(&mut recorder);

        assert_eq!(recorder.commands().len(), 2);
        let Command::Text(second) = &recorder.commands()[1] else {
            panic!("expected a text run");
        };
        assert_eq!(second.matrix, Affine::translate((100.0, 200.0)));
    }

    #[test]
    fn next_line_uses_negative_leading() {
        let mut format = TextFormat::new();
        let mut recorder = CommandRecorder::new();

        format.set_leading(14.0);
        format.next_line(&mut recorder);
        assert_eq!(format.matrix, Affine::translate((0.0, -14.0)));
    }

    #[test]
    fn reset_restores_identity_matrices() {
        let mut format = TextFormat::new();
        let mut recorder = CommandRecorder::new();

        format.translate(&mut recorder, 5.0, 5.0);
        format.reset(&mut recorder);
        assert_eq!(format.matrix, Affine::IDENTITY);
    }

    #[test]
    fn empty_flush_emits_nothing() {
        let mut format = TextFormat::new();
        let mut recorder = CommandRecorder::new();
        format.flush(&mut recorder);
        assert!(recorder.commands().is_empty());
    }
}
