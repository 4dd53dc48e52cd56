//! cfglang core library.
//!
//! This crate implements a reader for the CFG configuration format: a
//! superset of JSON with comments, unquoted keys, trailing commas, numbers
//! in several radices, complex and date-time literals, back-tick strings
//! (environment lookups, ISO date-times, `${path}` interpolation),
//! expressions with the usual precedence, cross-entry references, slicing,
//! and composition through file inclusion and mapping merges.
//!
//! The pipeline is: UTF-8 decoding over a byte stream, a push-back
//! tokenizer, a recursive-descent expression parser, and a lazy evaluator
//! that resolves references and includes on demand. Loading a file parses
//! it once; values are only computed when queried.
//!
//! ```no_run
//! use cfglang::{Config, Value};
//!
//! let config = Config::from_file("app.cfg")?;
//! let name = config.get("server.name")?;
//! assert!(matches!(name, Value::String(_)));
//! # Ok::<(), cfglang::CfgError>(())
//! ```

pub mod ast;
pub mod complex;
pub mod config;
pub mod convert;
pub mod decoder;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod path;
pub mod position;
pub mod time;
pub mod tokens;
pub mod value;

pub use complex::Complex;
pub use config::Config;
pub use convert::{default_string_converter, StringConverter};
pub use diagnostics::{CfgError, CfgResult, ConfigError, RecognizerError};
pub use path::{is_identifier, parse_path, to_source, unpack_path};
pub use position::Location;
pub use time::DateTime;
pub use tokens::{Token, TokenKind, TokenValue};
pub use value::{Value, ValueMap};

/// Version of the cfglang crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
