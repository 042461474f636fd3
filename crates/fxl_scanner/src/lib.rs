//! fxl_scanner: Lexer/tokenizer for formula source text.
//!
//! Produces tokens for literals, quoted and unquoted identifiers, keywords,
//! operators and interpolated strings (`$"text {expr} text"`). Positions are
//! byte offsets.

mod char_codes;
mod scanner;
mod token;

pub use scanner::{Scanner, ScannerState};
pub use token::TokenInfo;
