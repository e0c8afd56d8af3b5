//! End-to-end scenarios: whole streams in, recorded command sequences out.

use kurbo::{Affine, BezPath, Rect, Shape};
use plume_interpret::device::{BOTH, CLIP, FILL, STROKE};
use plume_interpret::{
    color, Command, CommandRecorder, Error, FillRule, Interpreter, InterpreterSettings, Paint,
    PatternPaint, Resources, Shading, TextElement, Watchable,
};
use plume_syntax::PdfObject;
use smallvec::smallvec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn record_with(
    data: &[u8],
    resources: Resources,
    settings: InterpreterSettings,
) -> Vec<Command> {
    let sink = Arc::new(Mutex::new(CommandRecorder::new()));
    let mut interpreter = Interpreter::with_settings(&sink, data, resources, settings);
    interpreter.go().unwrap();

    let commands = sink.lock().unwrap().take_commands();
    assert!(sink.lock().unwrap().finished());
    commands
}

fn record(data: &[u8], resources: Resources) -> Vec<Command> {
    record_with(data, resources, InterpreterSettings::default())
}

fn num(value: f64) -> Arc<PdfObject> {
    Arc::new(PdfObject::number(value))
}

/// A resource map with a single category sub-dictionary.
fn resources_with(category: &str, name: &str, object: Arc<PdfObject>) -> Resources {
    let mut sub = HashMap::new();
    sub.insert(name.to_string(), object);

    let mut map = HashMap::new();
    map.insert(category.to_string(), Arc::new(PdfObject::dict(sub)));
    Resources::new(map)
}

fn rect_path(x: f64, y: f64, w: f64, h: f64) -> BezPath {
    let mut path = BezPath::new();
    path.move_to((x, y));
    path.line_to((x + w, y));
    path.line_to((x + w, y + h));
    path.line_to((x, y + h));
    path.close_path();
    path
}

#[test]
fn minimal_fill() {
    let commands = record(b"0.5 g 10 10 20 20 re f", Resources::default());

    assert_eq!(
        commands,
        vec![
            Command::FillPaint(Paint::solid(color::device_gray(), &[0.5])),
            Command::Path {
                path: rect_path(10.0, 10.0, 20.0, 20.0),
                fill_rule: FillRule::NonZero,
                mode: FILL,
            },
        ]
    );
}

#[test]
fn save_restore_pairing() {
    let commands = record(b"q 2 w Q 1 w", Resources::default());

    assert_eq!(
        commands,
        vec![
            Command::Push,
            Command::StrokeWidth(2.0),
            Command::Pop,
            Command::StrokeWidth(1.0),
        ]
    );
}

#[test]
fn even_odd_fill_and_stroke() {
    let commands = record(
        b"1 0 0 RG 0 g 0 0 10 10 re 5 5 20 20 re B*",
        Resources::default(),
    );

    let mut path = rect_path(0.0, 0.0, 10.0, 10.0);
    path.extend(rect_path(5.0, 5.0, 20.0, 20.0));

    assert_eq!(
        commands,
        vec![
            Command::StrokePaint(Paint::solid(color::device_rgb(), &[1.0, 0.0, 0.0])),
            Command::FillPaint(Paint::solid(color::device_gray(), &[0.0])),
            Command::Path {
                path,
                fill_rule: FillRule::EvenOdd,
                mode: BOTH,
            },
        ]
    );
}

#[test]
fn clip_then_paint() {
    let commands = record(
        b"0 0 100 100 re W n 10 10 20 20 re f",
        Resources::default(),
    );

    assert_eq!(
        commands,
        vec![
            Command::Path {
                path: rect_path(0.0, 0.0, 100.0, 100.0),
                fill_rule: FillRule::NonZero,
                mode: CLIP,
            },
            Command::Path {
                path: rect_path(10.0, 10.0, 20.0, 20.0),
                fill_rule: FillRule::NonZero,
                mode: FILL,
            },
        ]
    );
}

#[test]
fn text_line_with_kerning() {
    let mut font_dict = HashMap::new();
    font_dict.insert(
        "BaseFont".to_string(),
        Arc::new(PdfObject::name("Helvetica")),
    );
    let resources = resources_with("Font", "F1", Arc::new(PdfObject::dict(font_dict)));

    let commands = record(
        b"BT /F1 12 Tf 100 200 Td [(Hel) -50 (lo)] TJ ET",
        resources,
    );

    let [Command::Text(run)] = commands.as_slice() else {
        panic!("expected a single text run, got {commands:?}");
    };

    assert_eq!(
        run.font.as_ref().and_then(|f| f.base_name()),
        Some("Helvetica")
    );
    assert_eq!(run.size, 12.0);
    assert_eq!(run.matrix, Affine::translate((100.0, 200.0)));
    assert_eq!(
        run.elements,
        vec![
            TextElement::Show(b"Hel".to_vec()),
            TextElement::Adjust(-50.0),
            TextElement::Show(b"lo".to_vec()),
        ]
    );
}

#[test]
fn tolerant_bracket_swallows_only_inside() {
    // `foo` is bracketed and skipped; `bar` is not and kills the stream.
    let sink = Arc::new(Mutex::new(CommandRecorder::new()));
    let mut interpreter = Interpreter::new(
        &sink,
        b"BX 1 2 foo EX 3 4 bar",
        Resources::default(),
    );

    let error = interpreter.go().unwrap_err();
    assert!(matches!(error, Error::UnknownOperator(op) if op == "bar"));

    let recorder = sink.lock().unwrap();
    assert!(recorder.commands().is_empty());
    // Even a fatal error delivers finish with the partial sequence.
    assert!(recorder.finished());
}

#[test]
fn transform_concatenation() {
    let commands = record(b"2 0 0 2 10 10 cm", Resources::default());
    assert_eq!(
        commands,
        vec![Command::Transform(Affine::new([
            2.0, 0.0, 0.0, 2.0, 10.0, 10.0
        ]))]
    );
}

#[test]
fn dash_pattern() {
    let commands = record(b"[3 1] 0.5 d", Resources::default());
    assert_eq!(commands, vec![Command::Dash(smallvec![3.0, 1.0], 0.5)]);
}

#[test]
fn form_xobject_is_interpreted_once_and_cached() {
    let mut form_dict = HashMap::new();
    form_dict.insert("Subtype".to_string(), Arc::new(PdfObject::name("Form")));
    form_dict.insert(
        "BBox".to_string(),
        Arc::new(PdfObject::array(vec![
            num(0.0),
            num(0.0),
            num(10.0),
            num(10.0),
        ])),
    );
    let form = Arc::new(PdfObject::stream(
        form_dict,
        b"0.5 g 0 0 10 10 re f".to_vec(),
    ));
    let resources = resources_with("XObject", "Fm0", form);

    let commands = record(b"/Fm0 Do /Fm0 Do", resources);

    let [Command::Push, Command::Commands(first), Command::Pop, Command::Push, Command::Commands(second), Command::Pop] =
        commands.as_slice()
    else {
        panic!("expected two bracketed sub-command lists, got {commands:?}");
    };

    // The same memoized list is emitted both times.
    assert!(Arc::ptr_eq(first, second));

    assert_eq!(
        **first,
        vec![
            Command::Transform(Affine::IDENTITY),
            Command::Path {
                path: Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1),
                fill_rule: FillRule::NonZero,
                mode: CLIP,
            },
            Command::FillPaint(Paint::solid(color::device_gray(), &[0.5])),
            Command::Path {
                path: rect_path(0.0, 0.0, 10.0, 10.0),
                fill_rule: FillRule::NonZero,
                mode: FILL,
            },
        ]
    );
}

#[test]
fn shading_failure_is_tolerated() {
    let resources = resources_with(
        "Shading",
        "Sh0",
        Arc::new(PdfObject::dict(HashMap::new())),
    );

    // The default shader collaborator refuses; the `sh` is dropped and the
    // stream continues.
    let commands = record(b"/Sh0 sh 1 w", resources);
    assert_eq!(commands, vec![Command::StrokeWidth(1.0)]);
}

#[test]
fn shading_paints_between_push_and_pop() {
    let resources = resources_with(
        "Shading",
        "Sh0",
        Arc::new(PdfObject::dict(HashMap::new())),
    );

    let settings = InterpreterSettings {
        shader_resolver: Arc::new(|_, _| {
            Ok(Shading::new(
                Paint::solid(color::device_rgb(), &[1.0, 0.0, 0.0]),
                None,
            ))
        }),
        ..Default::default()
    };

    let commands = record_with(b"/Sh0 sh", resources, settings);
    assert_eq!(
        commands,
        vec![
            Command::Push,
            Command::Shade {
                paint: Paint::solid(color::device_rgb(), &[1.0, 0.0, 0.0]),
                bbox: None,
            },
            Command::Pop,
        ]
    );
}

#[test]
fn scn_in_a_pattern_space_resolves_the_pattern() {
    let pattern = Arc::new(PdfObject::dict(HashMap::new()));
    let resources = resources_with("Pattern", "P0", pattern.clone());

    let commands = record(b"/Pattern cs /P0 scn", resources);
    assert_eq!(
        commands,
        vec![Command::FillPaint(Paint::Pattern(PatternPaint {
            object: pattern,
            components: smallvec![],
        }))]
    );
}

#[test]
fn scn_with_a_stray_name_in_a_device_space() {
    // A trailing name outside a Pattern space is popped and ignored with a
    // warning.
    let commands = record(
        b"/DeviceRGB CS 0.1 0.2 0.3 /P0 SCN",
        Resources::default(),
    );
    assert_eq!(
        commands,
        vec![Command::StrokePaint(Paint::solid(
            color::device_rgb(),
            &[0.1, 0.2, 0.3]
        ))]
    );
}

#[test]
fn inline_image_round_trip() {
    let commands = record(
        b"BI /W 4 /H 1 /IM true ID \xde\xad\xbe\xef EI 1 w",
        Resources::default(),
    );

    let [Command::Image(image), Command::StrokeWidth(_)] = commands.as_slice() else {
        panic!("expected an image then a stroke width, got {commands:?}");
    };

    assert_eq!(image.width(), Some(4.0));
    assert_eq!(image.height(), Some(1.0));
    assert!(image.is_mask());
    assert_eq!(image.data(), Some(&b"\xde\xad\xbe\xef"[..]));

    // A mask without a Decode entry gets the [0 1] default injected.
    let decode = image.object().get("Decode").unwrap();
    assert_eq!(decode.at(0).unwrap().as_f64(), Some(0.0));
    assert_eq!(decode.at(1).unwrap().as_f64(), Some(1.0));
}

#[test]
fn stroke_and_close_stroke() {
    let commands = record(b"0 0 m 10 0 l S 0 0 m 10 0 l s", Resources::default());

    let mut open = BezPath::new();
    open.move_to((0.0, 0.0));
    open.line_to((10.0, 0.0));

    let mut closed = open.clone();
    closed.close_path();

    assert_eq!(
        commands,
        vec![
            Command::Path {
                path: open,
                fill_rule: FillRule::NonZero,
                mode: STROKE,
            },
            Command::Path {
                path: closed,
                fill_rule: FillRule::NonZero,
                mode: STROKE,
            },
        ]
    );
}

#[test]
fn next_line_show_reuses_leading() {
    // `'` is `T*` followed by a show; `TL` supplies the leading.
    let commands = record(b"BT 14 TL (a) Tj (b) ' ET", Resources::default());

    let [Command::Text(first), Command::Text(second)] = commands.as_slice() else {
        panic!("expected two text runs, got {commands:?}");
    };

    assert_eq!(first.elements, vec![TextElement::Show(b"a".to_vec())]);
    assert_eq!(first.matrix, Affine::IDENTITY);
    assert_eq!(second.elements, vec![TextElement::Show(b"b".to_vec())]);
    assert_eq!(second.matrix, Affine::translate((0.0, -14.0)));
}
