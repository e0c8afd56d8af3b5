//! Literal values, the object parser, and the object-model interface.

use crate::error::{Result, SyntaxError};
use crate::lexer::{Lexer, Token};
use log::warn;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, OnceLock};

/// A literal value read from a content stream.
///
/// Names and strings share the [`Value::Str`] case; operators that care
/// about the difference distinguish them by context.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Str(Vec<u8>),
    Array(Vec<Value>),
    Dict(HashMap<String, Arc<PdfObject>>),
}

/// A resolved PDF object, handed to the interpreter by the surrounding
/// object model.
///
/// The object carries a single-slot, set-once cache so that interpreters can
/// memoize derived data (the command list of a Form XObject) on the object
/// itself. The cache is advisory: a miss simply means recomputing.
pub struct PdfObject {
    kind: ObjectKind,
    cache: OnceLock<Box<dyn Any + Send + Sync>>,
}

/// The payload of a [`PdfObject`].
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectKind {
    Null,
    Bool(bool),
    Number(f64),
    Str(Vec<u8>),
    Name(String),
    Array(Vec<Arc<PdfObject>>),
    Dict(HashMap<String, Arc<PdfObject>>),
    Stream {
        dict: HashMap<String, Arc<PdfObject>>,
        data: Vec<u8>,
    },
}

impl PdfObject {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            cache: OnceLock::new(),
        }
    }

    pub fn null() -> Self {
        Self::new(ObjectKind::Null)
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(ObjectKind::Bool(value))
    }

    pub fn number(value: f64) -> Self {
        Self::new(ObjectKind::Number(value))
    }

    pub fn string(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(ObjectKind::Str(bytes.into()))
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self::new(ObjectKind::Name(name.into()))
    }

    pub fn array(elements: Vec<Arc<PdfObject>>) -> Self {
        Self::new(ObjectKind::Array(elements))
    }

    pub fn dict(entries: HashMap<String, Arc<PdfObject>>) -> Self {
        Self::new(ObjectKind::Dict(entries))
    }

    pub fn stream(dict: HashMap<String, Arc<PdfObject>>, data: Vec<u8>) -> Self {
        Self::new(ObjectKind::Stream { dict, data })
    }

    /// Lift a parsed literal into an object.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Number(n) => Self::number(n),
            Value::Str(s) => Self::string(s),
            Value::Array(elements) => Self::array(
                elements
                    .into_iter()
                    .map(|e| Arc::new(Self::from_value(e)))
                    .collect(),
            ),
            Value::Dict(entries) => Self::dict(entries),
        }
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// Look up `key` in a dictionary or in a stream's dictionary.
    pub fn get(&self, key: &str) -> Option<&Arc<PdfObject>> {
        match &self.kind {
            ObjectKind::Dict(entries) | ObjectKind::Stream { dict: entries, .. } => {
                entries.get(key)
            }
            _ => None,
        }
    }

    /// Index into an array.
    pub fn at(&self, index: usize) -> Option<&Arc<PdfObject>> {
        match &self.kind {
            ObjectKind::Array(elements) => elements.get(index),
            _ => None,
        }
    }

    pub fn elements(&self) -> Option<&[Arc<PdfObject>]> {
        match &self.kind {
            ObjectKind::Array(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.kind {
            ObjectKind::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        self.as_f64().map(|n| n as f32)
    }

    pub fn as_i32(&self) -> Option<i32> {
        self.as_f64().map(|n| n as i32)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            ObjectKind::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// The textual value of a name, or of a string that stands in for one.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ObjectKind::Name(name) => Some(name),
            ObjectKind::Str(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    pub fn string_bytes(&self) -> Option<&[u8]> {
        match &self.kind {
            ObjectKind::Str(bytes) => Some(bytes),
            ObjectKind::Name(name) => Some(name.as_bytes()),
            _ => None,
        }
    }

    /// The raw bytes of a stream object.
    pub fn stream_data(&self) -> Option<&[u8]> {
        match &self.kind {
            ObjectKind::Stream { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Read the cache slot, if it holds a value of type `T`.
    pub fn cached<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.cache.get().and_then(|slot| slot.downcast_ref())
    }

    /// Fill the cache slot. The first store wins; later stores are dropped.
    pub fn store<T: Any + Send + Sync>(&self, value: T) {
        let _ = self.cache.set(Box::new(value));
    }
}

impl Debug for PdfObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}

impl PartialEq for PdfObject {
    fn eq(&self, other: &Self) -> bool {
        // The cache is derived data and does not take part in equality.
        self.kind == other.kind
    }
}

/// One step of output from the object parser.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentItem<'a> {
    /// A literal value, destined for the operand stack.
    Value(Value),
    /// A bare operator keyword, destined for the dispatcher.
    Operator(&'a [u8]),
}

/// Parses tokens into literal values, passing operator keywords through
/// untouched.
pub struct ObjectParser<'a> {
    lexer: Lexer<'a>,
}

/// Result of one recursive parsing step: a value, an operator, or a token
/// that ends the enclosing construct.
enum Parsed<'a> {
    Value(Value),
    Operator(&'a [u8]),
    Stop(Token<'a>),
}

impl<'a> ObjectParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(data),
        }
    }

    /// Access to the underlying lexer, for callers that need to take over
    /// mid-stream (inline images).
    pub fn lexer_mut(&mut self) -> &mut Lexer<'a> {
        &mut self.lexer
    }

    /// Parse the next object out of the stream.
    ///
    /// Returns `None` when there is nothing left to parse: at the end of the
    /// stream, or on a stray token that cannot start an object (which is
    /// logged and swallowed).
    pub fn parse_object(&mut self) -> Result<Option<ContentItem<'a>>> {
        match self.parse_inner()? {
            Parsed::Value(value) => Ok(Some(ContentItem::Value(value))),
            Parsed::Operator(op) => Ok(Some(ContentItem::Operator(op))),
            Parsed::Stop(Token::Eof) => Ok(None),
            Parsed::Stop(token) => {
                warn!("stray token {token:?} in content stream");
                Ok(None)
            }
        }
    }

    fn parse_inner(&mut self) -> Result<Parsed<'a>> {
        let offset = self.lexer.offset();
        let token = self.lexer.next_token()?;

        match token {
            Token::Number(n) => Ok(Parsed::Value(Value::Number(n))),
            Token::Str(s) | Token::HexStr(s) => Ok(Parsed::Value(Value::Str(s))),
            Token::Name(n) => Ok(Parsed::Value(Value::Str(n.to_vec()))),
            Token::DictBegin => self.parse_dict(offset).map(Parsed::Value),
            Token::ArrayBegin => self.parse_array(offset).map(Parsed::Value),
            Token::Operator(op) => Ok(Parsed::Operator(op)),
            other => Ok(Parsed::Stop(other)),
        }
    }

    /// Read alternating name/value pairs up to the closing `>>`.
    fn parse_dict(&mut self, start: usize) -> Result<Value> {
        let mut entries = HashMap::new();

        loop {
            let key = match self.parse_inner()? {
                Parsed::Stop(Token::DictEnd) => break,
                Parsed::Value(Value::Str(key)) => String::from_utf8_lossy(&key).into_owned(),
                Parsed::Stop(_) => return Err(SyntaxError::UnterminatedDict(start)),
                _ => return Err(SyntaxError::ExpectedDictKey(start)),
            };

            let value = match self.parse_inner()? {
                Parsed::Value(value) => Arc::new(PdfObject::from_value(value)),
                Parsed::Operator(op) => match keyword_object(op) {
                    Some(object) => Arc::new(object),
                    None => return Err(SyntaxError::ExpectedDictValue(start)),
                },
                Parsed::Stop(_) => return Err(SyntaxError::ExpectedDictValue(start)),
            };

            entries.insert(key, value);
        }

        Ok(Value::Dict(entries))
    }

    /// Collect values up to the closing `]`.
    fn parse_array(&mut self, start: usize) -> Result<Value> {
        let mut elements = Vec::new();

        loop {
            match self.parse_inner()? {
                Parsed::Stop(Token::ArrayEnd) => break,
                Parsed::Value(value) => elements.push(value),
                Parsed::Operator(op) if keyword_object(op).is_some() => {
                    // Literal values carry no boolean/null cases; such
                    // keywords only matter in dictionaries.
                    warn!(
                        "dropping keyword {} inside an array",
                        String::from_utf8_lossy(op)
                    );
                }
                _ => return Err(SyntaxError::UnterminatedArray(start)),
            }
        }

        Ok(Value::Array(elements))
    }
}

/// Keywords that denote objects rather than operators.
pub(crate) fn keyword_object(op: &[u8]) -> Option<PdfObject> {
    match op {
        b"true" => Some(PdfObject::boolean(true)),
        b"false" => Some(PdfObject::boolean(false)),
        b"null" => Some(PdfObject::null()),
        _ => None,
    }
}
