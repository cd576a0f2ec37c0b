//! Test Module Parser Component
//!
//! Provides the lexer, parser and AST for the script dialect test modules
//! are written in.
//!
//! # Overview
//!
//! - [`Lexer`] - Tokenizes module source code
//! - [`Token`] - Token types including identifiers, literals, keywords
//! - [`Parser`] - Recursive descent parser producing a [`Program`]
//! - [`Statement`] / [`Expression`] - Abstract Syntax Tree node types
//!
//! Parsing never evaluates anything; a parse failure is returned as a
//! [`core_types::JsError`] of kind `SyntaxError`.
//!
//! # Example
//!
//! ```
//! use parser::Parser;
//!
//! let source = "function testFoo() { var x = 42; }";
//! let mut parser = Parser::new(source);
//! let program = parser.parse().unwrap();
//! assert_eq!(program.function_declarations().count(), 1);
//!
//! let err = Parser::new("var x = ;").parse().unwrap_err();
//! assert!(err.is_syntax_error());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{Expression, FunctionDef, Program, Statement};
pub use lexer::{Keyword, Lexer, Punctuator, SpannedToken, Token};
pub use parser::{parse_program, Parser, MAX_NESTING_DEPTH};
