use std::io::Cursor;
use std::path::PathBuf;

use cfglang::lexer::Tokenizer;
use cfglang::{CfgError, Config, Token, TokenKind, Value};

pub fn config(source: &str) -> Config {
    Config::from_source(source).expect("failed to load configuration")
}

pub fn lookup(config: &Config, key: &str) -> Value {
    config
        .get(key)
        .unwrap_or_else(|error| panic!("lookup of `{key}` failed: {error}"))
}

pub fn lookup_err(config: &Config, key: &str) -> CfgError {
    match config.get(key) {
        Ok(value) => panic!("lookup of `{key}` unexpectedly produced {value:?}"),
        Err(error) => error,
    }
}

pub fn load_err(source: &str) -> CfgError {
    match Config::from_source(source) {
        Ok(_) => panic!("source unexpectedly loaded: {source}"),
        Err(error) => error,
    }
}

/// Tokenize a whole source string, including the final EOF token.
pub fn tokens(source: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(Cursor::new(source.as_bytes().to_vec()));
    let mut out = Vec::new();
    loop {
        let token = tokenizer.get_token().expect("tokenizer failed");
        let done = token.kind == TokenKind::Eof;
        out.push(token);
        if done {
            return out;
        }
    }
}

pub fn token_err(source: &str) -> CfgError {
    let mut tokenizer = Tokenizer::new(Cursor::new(source.as_bytes().to_vec()));
    loop {
        match tokenizer.get_token() {
            Ok(token) if token.kind == TokenKind::Eof => {
                panic!("tokenizing unexpectedly succeeded: {source}")
            }
            Ok(_) => continue,
            Err(error) => return error,
        }
    }
}

pub fn data_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("data");
    path
}

pub fn string(text: &str) -> Value {
    Value::String(text.to_string())
}

pub fn strings(texts: &[&str]) -> Value {
    Value::List(texts.iter().map(|t| string(t)).collect())
}
