//! `Do` targets and inline images.

use crate::device::{CommandList, CommandRecorder, CommandSink, CLIP};
use crate::error::{Error, Result};
use crate::interpret::state::affine_from_row;
use crate::interpret::Interpreter;
use crate::{FillRule, Watchable};
use kurbo::{Affine, Rect, Shape};
use log::warn;
use plume_syntax::{ContentItem, PdfObject, SyntaxError, Token};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Execute a `Do` on a resolved XObject.
pub(crate) fn invoke(
    interpreter: &mut Interpreter<'_>,
    object: &Arc<PdfObject>,
    sink: &mut dyn CommandSink,
) -> Result<()> {
    // Some producers abbreviate `Subtype` to `S`.
    let subtype = object
        .get("Subtype")
        .or_else(|| object.get("S"))
        .and_then(|s| s.as_name());

    match subtype {
        Some("Image") => draw_image(interpreter, object, sink),
        Some("Form") => draw_form(interpreter, object, sink),
        other => Err(Error::Resource(format!(
            "unknown XObject subtype: {}",
            other.unwrap_or("(missing)")
        ))),
    }
}

fn draw_image(
    interpreter: &mut Interpreter<'_>,
    object: &Arc<PdfObject>,
    sink: &mut dyn CommandSink,
) -> Result<()> {
    let image = (interpreter.settings.image_resolver)(object, &interpreter.resources)?;
    sink.image(image);

    Ok(())
}

/// Inline a Form XObject: interpret its stream once, memoize the produced
/// command list in the form object's cache slot, and emit the list
/// bracketed by push/pop.
fn draw_form(
    interpreter: &mut Interpreter<'_>,
    object: &Arc<PdfObject>,
    sink: &mut dyn CommandSink,
) -> Result<()> {
    let list = match object.cached::<CommandList>() {
        Some(list) => list.clone(),
        None => {
            let list = record_form(interpreter, object)?;
            object.store(list.clone());
            list
        }
    };

    sink.push();
    sink.commands(list);
    sink.pop();

    Ok(())
}

/// Drive a sub-interpreter over the form's stream and merged resources,
/// recording into a fresh sink. The recording starts with the form's
/// `Matrix` and a clip to its `BBox`.
fn record_form(interpreter: &Interpreter<'_>, object: &Arc<PdfObject>) -> Result<CommandList> {
    let data = object
        .stream_data()
        .ok_or_else(|| Error::Resource("Form XObject has no stream data".into()))?;

    let matrix = object
        .get("Matrix")
        .and_then(|m| matrix_from_object(m))
        .unwrap_or(Affine::IDENTITY);
    let bbox = object
        .get("BBox")
        .and_then(|b| rect_from_object(b))
        .ok_or_else(|| Error::Resource("Form XObject has no BBox".into()))?;

    let resources = interpreter.resources.merged(object.get("Resources"));

    let recorder = Arc::new(Mutex::new(CommandRecorder::new()));
    {
        let mut prelude = recorder.lock().unwrap();
        prelude.transform(matrix);
        prelude.path(bbox.to_path(0.1), FillRule::NonZero, CLIP);
    }

    let mut sub = Interpreter::with_settings(
        &recorder,
        data,
        resources,
        interpreter.settings.clone(),
    );
    sub.go()?;

    let commands = recorder.lock().unwrap().take_commands();
    Ok(Arc::new(commands))
}

fn matrix_from_object(object: &PdfObject) -> Option<Affine> {
    let elements = object.elements()?;
    if elements.len() != 6 {
        return None;
    }

    let mut row = [0.0f32; 6];
    for (slot, element) in row.iter_mut().zip(elements) {
        *slot = element.as_f32()?;
    }

    Some(affine_from_row(&row))
}

fn rect_from_object(object: &PdfObject) -> Option<Rect> {
    let elements = object.elements()?;
    if elements.len() != 4 {
        return None;
    }

    Some(Rect::new(
        elements[0].as_f64()?,
        elements[1].as_f64()?,
        elements[2].as_f64()?,
        elements[3].as_f64()?,
    ))
}

/// Parse an inline image (`BI … ID … EI`) and emit it through the image
/// collaborator.
pub(crate) fn inline_image(
    interpreter: &mut Interpreter<'_>,
    sink: &mut dyn CommandSink,
) -> Result<()> {
    let start = interpreter.parser.lexer_mut().offset();
    let mut dict: HashMap<String, Arc<PdfObject>> = HashMap::new();

    loop {
        let token = interpreter.parser.lexer_mut().next_token()?;
        match token {
            Token::Operator(b"ID") => break,
            Token::Name(name) => {
                let key = expand_image_key(&String::from_utf8_lossy(name)).to_string();
                let value = parse_image_value(interpreter, start)?;
                dict.insert(key, Arc::new(value));
            }
            Token::Eof => return Err(SyntaxError::UnterminatedDict(start).into()),
            other => warn!("ignoring {other:?} in an inline image dictionary"),
        }
    }

    {
        let lexer = interpreter.parser.lexer_mut();
        lexer.skip_inline_image_separator();
        let data = lexer.read_inline_image_data()?.to_vec();

        // A stencil mask defaults to Decode [0 1].
        let is_mask = dict
            .get("ImageMask")
            .and_then(|m| m.as_bool())
            .unwrap_or(false);
        if is_mask && !dict.contains_key("Decode") {
            dict.insert(
                "Decode".to_string(),
                Arc::new(PdfObject::array(vec![
                    Arc::new(PdfObject::number(0.0)),
                    Arc::new(PdfObject::number(1.0)),
                ])),
            );
        }

        let object = Arc::new(PdfObject::stream(dict, data));
        let image = (interpreter.settings.image_resolver)(&object, &interpreter.resources)?;
        sink.image(image);
    }

    Ok(())
}

fn parse_image_value(interpreter: &mut Interpreter<'_>, start: usize) -> Result<PdfObject> {
    match interpreter.parser.parse_object()? {
        Some(ContentItem::Value(value)) => Ok(PdfObject::from_value(value)),
        // Booleans and null appear as bare keywords.
        Some(ContentItem::Operator(b"true")) => Ok(PdfObject::boolean(true)),
        Some(ContentItem::Operator(b"false")) => Ok(PdfObject::boolean(false)),
        Some(ContentItem::Operator(b"null")) => Ok(PdfObject::null()),
        _ => Err(SyntaxError::ExpectedDictValue(start).into()),
    }
}

/// Expand the abbreviated inline-image dictionary keys to their canonical
/// names.
fn expand_image_key(key: &str) -> &str {
    match key {
        "BPC" => "BitsPerComponent",
        "CS" => "ColorSpace",
        "D" => "Decode",
        "DP" => "DecodeParms",
        "F" => "Filter",
        "H" => "Height",
        "IM" => "ImageMask",
        "W" => "Width",
        "I" => "Interpolate",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::expand_image_key;

    #[test]
    fn image_keys_expand() {
        assert_eq!(expand_image_key("BPC"), "BitsPerComponent");
        assert_eq!(expand_image_key("W"), "Width");
        assert_eq!(expand_image_key("Width"), "Width");
        assert_eq!(expand_image_key("X"), "X");
    }
}
