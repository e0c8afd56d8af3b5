//! The untyped operand stack.

use crate::error::{Error, Result};
use log::warn;
use plume_syntax::Value;
use smallvec::{smallvec, SmallVec};

/// The LIFO of literal values accumulated between operator keywords.
///
/// Operands are pushed untyped and type-checked at the pop sites; a
/// mismatch is a [`Error::Type`] error.
#[derive(Debug, Default)]
pub(crate) struct OperandStack {
    values: Vec<Value>,
}

impl OperandStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub(crate) fn pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }

    /// Whether the topmost operand is a string or name.
    pub(crate) fn top_is_string(&self) -> bool {
        matches!(self.values.last(), Some(Value::Str(_)))
    }

    /// Pop a number as a float. An empty stack yields `0.0` with a warning
    /// rather than an error.
    pub(crate) fn pop_float(&mut self) -> Result<f32> {
        let Some(value) = self.values.pop() else {
            warn!("operand stack ran dry while popping a number");
            return Ok(0.0);
        };

        match value {
            Value::Number(n) => Ok(n as f32),
            _ => Err(Error::Type { expected: "number" }),
        }
    }

    /// Pop a number, truncated toward zero.
    pub(crate) fn pop_int(&mut self) -> Result<i32> {
        match self.values.pop() {
            Some(Value::Number(n)) => Ok(n as i32),
            _ => Err(Error::Type { expected: "number" }),
        }
    }

    /// Pop `count` floats. The result reads left to right as the operands
    /// appeared in the source, i.e. it is filled in reverse pop order.
    pub(crate) fn pop_floats(&mut self, count: usize) -> Result<SmallVec<[f32; 6]>> {
        let mut out: SmallVec<[f32; 6]> = smallvec![0.0; count];
        for slot in out.iter_mut().rev() {
            *slot = self.pop_float()?;
        }

        Ok(out)
    }

    /// Pop an array whose elements are all numbers.
    pub(crate) fn pop_float_array(&mut self) -> Result<SmallVec<[f32; 4]>> {
        let Some(Value::Array(elements)) = self.values.pop() else {
            return Err(Error::Type { expected: "array" });
        };

        elements
            .into_iter()
            .map(|e| match e {
                Value::Number(n) => Ok(n as f32),
                _ => Err(Error::Type {
                    expected: "array of numbers",
                }),
            })
            .collect()
    }

    /// Pop a string or name payload.
    pub(crate) fn pop_string(&mut self) -> Result<Vec<u8>> {
        match self.values.pop() {
            Some(Value::Str(bytes)) => Ok(bytes),
            _ => Err(Error::Type { expected: "string" }),
        }
    }

    /// Pop an array of arbitrary values.
    pub(crate) fn pop_array(&mut self) -> Result<Vec<Value>> {
        match self.values.pop() {
            Some(Value::Array(elements)) => Ok(elements),
            _ => Err(Error::Type { expected: "array" }),
        }
    }
}
