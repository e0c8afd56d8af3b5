/*!
Lexing and object parsing for PDF content streams.

A content stream is the byte-level program of a PDF page: literal values
(numbers, names, strings, arrays, inline dictionaries) interleaved with
operator keywords. This crate turns those bytes into [`Token`]s and
[`Value`]s and leaves the evaluation of operators to a consumer, the
`plume-interpret` crate.

The [`PdfObject`] type is the interface to the surrounding object model.
Indirect-reference resolution, cross-reference tables and stream decoding
happen outside of this crate; whoever constructs a [`PdfObject`] hands over
fully resolved data.
*/

pub mod error;
pub mod lexer;
pub mod object;
pub mod reader;
pub mod trivia;

pub use error::{Result, SyntaxError};
pub use lexer::{Lexer, Token};
pub use object::{ContentItem, ObjectKind, ObjectParser, PdfObject, Value};
pub use reader::Reader;
