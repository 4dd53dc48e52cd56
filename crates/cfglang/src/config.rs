use crate::ast::{AstNode, BinaryNode, MappingNode, SliceNode, UnaryNode};
use crate::complex::Complex;
use crate::convert::{default_string_converter, StringConverter};
use crate::diagnostics::{CfgError, CfgResult};
use crate::parser::Parser;
use crate::path::{is_identifier, parse_path, to_source, unpack_path};
use crate::position::Location;
use crate::tokens::{Token, TokenKind, TokenValue};
use crate::value::{Value, ValueMap};
use hashlink::LinkedHashMap;
use smol_str::SmolStr;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

type AstTable = LinkedHashMap<SmolStr, AstNode>;

/// A loaded configuration: an ordered table of top-level entries kept as
/// unevaluated AST, evaluated on demand when queried.
///
/// A `Config` is not thread-safe; callers needing one from several threads
/// must synchronize externally.
#[derive(Clone)]
pub struct Config {
    /// Reject mapping literals that repeat a key (default true).
    pub no_duplicates: bool,
    /// Raise when a back-tick string fails to convert (default true).
    pub strict_conversions: bool,
    /// Directories searched, in order, by `@"path"` includes.
    pub include_path: Vec<PathBuf>,
    /// Variables visible to bare words inside expressions.
    pub context: HashMap<SmolStr, Value>,
    /// Conversion applied to back-tick literals.
    pub string_converter: StringConverter,
    path: Option<PathBuf>,
    root_dir: Option<PathBuf>,
    parent: Option<Box<Config>>,
    data: Option<Rc<AstTable>>,
    cache: Option<Rc<RefCell<HashMap<SmolStr, Value>>>>,
    refs_seen: Rc<RefCell<HashSet<(String, Location)>>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .field("no_duplicates", &self.no_duplicates)
            .field("strict_conversions", &self.strict_conversions)
            .field("include_path", &self.include_path)
            .field("loaded", &self.data.is_some())
            .finish()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            no_duplicates: true,
            strict_conversions: true,
            include_path: Vec::new(),
            context: HashMap::new(),
            string_converter: default_string_converter,
            path: None,
            root_dir: None,
            parent: None,
            data: None,
            cache: None,
            refs_seen: Rc::new(RefCell::new(HashSet::new())),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> CfgResult<Self> {
        let mut config = Config::new();
        config.load_file(path)?;
        Ok(config)
    }

    pub fn from_source(source: &str) -> CfgResult<Self> {
        let mut config = Config::new();
        config.load(Cursor::new(source.as_bytes()))?;
        Ok(config)
    }

    /// Turn result caching on or off. Turning it off drops any cached
    /// values.
    pub fn set_cache(&mut self, enabled: bool) {
        if enabled {
            if self.cache.is_none() {
                self.cache = Some(Rc::new(RefCell::new(HashMap::new())));
            }
        } else {
            self.cache = None;
        }
    }

    /// The file this configuration was loaded from, when there is one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The including configuration, for configurations loaded via `@`.
    pub fn parent(&self) -> Option<&Config> {
        self.parent.as_deref()
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> CfgResult<()> {
        let path = path.as_ref();
        let file = File::open(path)?;
        self.path = Some(path.to_path_buf());
        self.root_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf);
        self.load(BufReader::new(file))
    }

    /// Parse a whole configuration from a byte stream. The root must be a
    /// mapping; with `no_duplicates` set, every mapping literal in the
    /// stream is checked for repeated keys here, at load time.
    pub fn load(&mut self, reader: impl Read) -> CfgResult<()> {
        let mut parser = Parser::new(reader)?;
        let root = parser.container()?;
        if !parser.at_end() {
            return Err(CfgError::parser(
                parser.current().start,
                format!("unexpected: {}", parser.current().kind),
            ));
        }
        let mapping = match root {
            AstNode::Mapping(mapping) => mapping,
            _ => return Err(CfgError::config("root configuration must be a mapping")),
        };
        if self.no_duplicates {
            validate_no_duplicates(&mapping)?;
        }
        self.data = Some(Rc::new(wrap_mapping(&mapping)));
        if let Some(cache) = &self.cache {
            cache.borrow_mut().clear();
        }
        Ok(())
    }

    /// Look up `key` (an identifier or a path such as `a.b[0]`) and return
    /// the fully evaluated value. Missing keys raise; see [`Config::get_or`]
    /// for the defaulting variant.
    pub fn get(&self, key: &str) -> CfgResult<Value> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.borrow().get(key) {
                return Ok(hit.clone());
            }
        }
        self.refs_seen.borrow_mut().clear();
        let value = self.fetch(key)?;
        if let Some(cache) = &self.cache {
            cache.borrow_mut().insert(SmolStr::from(key), value.clone());
        }
        Ok(value)
    }

    /// Like [`Config::get`], but a missing key or failed path walk yields
    /// `default` instead of an error. Tokenizer and parser failures in the
    /// key still raise.
    pub fn get_or(&self, key: &str, default: Value) -> CfgResult<Value> {
        if self.data.is_none() {
            return Err(CfgError::config("no data in configuration"));
        }
        match self.get(key) {
            Ok(value) => Ok(value),
            Err(CfgError::Config(_)) => Ok(default),
            Err(error) => Err(error),
        }
    }

    /// The resolved value at `key` must be an included sub-configuration;
    /// it is returned as its own `Config`, so further queries resolve
    /// against its context and include path.
    pub fn get_sub_config(&self, key: &str) -> CfgResult<Config> {
        self.refs_seen.borrow_mut().clear();
        let raw = self.fetch_raw(key)?;
        match raw {
            Value::Config(child) => Ok(child),
            _ => Err(CfgError::config(format!("not a sub-configuration: {key}"))),
        }
    }

    /// Evaluate and unwrap every top-level entry, in source order.
    pub fn as_dict(&self) -> CfgResult<ValueMap> {
        let data = self.data_table()?;
        let mut out = ValueMap::new();
        for (key, node) in data.iter() {
            self.refs_seen.borrow_mut().clear();
            let value = self.evaluate(node)?;
            out.insert(key.clone(), self.unwrap_value(&value)?);
        }
        Ok(out)
    }

    fn data_table(&self) -> CfgResult<&AstTable> {
        self.data
            .as_deref()
            .ok_or_else(|| CfgError::config("no data in configuration"))
    }

    /// The uncached, un-reset lookup behind `get`; also used by the default
    /// string converter so `${...}` interpolation participates in the
    /// caller's circular-reference tracking.
    pub(crate) fn fetch(&self, key: &str) -> CfgResult<Value> {
        let raw = self.fetch_raw(key)?;
        self.unwrap_value(&raw)
    }

    fn fetch_raw(&self, key: &str) -> CfgResult<Value> {
        let data = self.data_table()?;
        if is_identifier(key) {
            match data.get(key) {
                Some(node) => self.evaluate(node),
                None => Err(CfgError::config(format!("not found in configuration: {key}"))),
            }
        } else {
            let path = parse_path(key)?;
            self.get_from_path(&path)
        }
    }

    fn get_from_path(&self, path: &AstNode) -> CfgResult<Value> {
        let elements = unpack_path(path)?;
        self.walk(Value::Config(self.clone()), &elements)
    }

    fn walk(&self, start: Value, elements: &[(TokenKind, AstNode)]) -> CfgResult<Value> {
        let mut ctx = self.clone();
        let mut current = start;
        for (op, operand) in elements {
            current = match op {
                TokenKind::Dot => match operand {
                    AstNode::Token(token) => self.keyed_access(&current, token, &mut ctx)?,
                    other => {
                        return Err(CfgError::config_at(
                            other.start(),
                            format!("invalid path element: {}", to_source(other)),
                        ))
                    }
                },
                TokenKind::LeftBracket => {
                    let at = operand.start();
                    let index = match ctx.evaluate_fully(operand)? {
                        Value::Integer(index) => index,
                        other => {
                            return Err(CfgError::config_at(
                                at,
                                format!("index is not an integer, but {}", other.type_name()),
                            ))
                        }
                    };
                    self.indexed_access(&current, index, at, &ctx)?
                }
                TokenKind::Colon => match operand {
                    AstNode::Slice(slice) => self.sliced_access(&current, slice, &ctx)?,
                    other => {
                        return Err(CfgError::config_at(
                            other.start(),
                            format!("invalid path element: {}", to_source(other)),
                        ))
                    }
                },
                op => {
                    return Err(CfgError::config_at(
                        operand.start(),
                        format!("invalid path operation: {op}"),
                    ))
                }
            };
        }
        Ok(current)
    }

    /// A `.word` step. Reading through a nested configuration retargets
    /// `ctx`, so later steps evaluate inside the included file.
    fn keyed_access(&self, container: &Value, token: &Token, ctx: &mut Config) -> CfgResult<Value> {
        let key = token.key_text();
        let at = token.start;
        match container {
            Value::Config(child) => {
                *ctx = child.clone();
                child.lookup(&key, at)
            }
            Value::InternalMapping(table) => match table.get(key.as_str()) {
                Some(node) => ctx.evaluate(node),
                None => Err(CfgError::config_at(
                    at,
                    format!("not found in configuration: {key}"),
                )),
            },
            Value::Mapping(map) => map.get(key.as_str()).cloned().ok_or_else(|| {
                CfgError::config_at(at, format!("not found in configuration: {key}"))
            }),
            other => Err(CfgError::config_at(
                at,
                format!("invalid container for keyed access: {}", other.type_name()),
            )),
        }
    }

    fn lookup(&self, key: &str, at: Location) -> CfgResult<Value> {
        let data = self.data_table()?;
        match data.get(key) {
            Some(node) => self.evaluate(node),
            None => Err(CfgError::config_at(
                at,
                format!("not found in configuration: {key}"),
            )),
        }
    }

    fn indexed_access(
        &self,
        container: &Value,
        index: i64,
        at: Location,
        ctx: &Config,
    ) -> CfgResult<Value> {
        match container {
            Value::InternalList(elements) => {
                let slot = normalize_index(index, elements.len(), at)?;
                ctx.evaluate(&elements[slot])
            }
            Value::List(items) => {
                let slot = normalize_index(index, items.len(), at)?;
                Ok(items[slot].clone())
            }
            other => Err(CfgError::config_at(
                at,
                format!("invalid container for numeric index: {}", other.type_name()),
            )),
        }
    }

    fn sliced_access(
        &self,
        container: &Value,
        slice: &SliceNode,
        ctx: &Config,
    ) -> CfgResult<Value> {
        let step = match &slice.step {
            None => 1,
            Some(node) => match ctx.evaluate_fully(node)? {
                Value::Integer(step) => step,
                other => {
                    return Err(CfgError::config_at(
                        node.start(),
                        format!("step is not an integer, but {}", other.type_name()),
                    ))
                }
            },
        };
        if step == 0 {
            return Err(CfgError::config_at(slice.start, "step cannot be zero"));
        }
        let start = self.slice_bound(&slice.start_index, "start", ctx)?;
        let stop = self.slice_bound(&slice.stop_index, "stop", ctx)?;
        match container {
            Value::InternalList(elements) => {
                let picked = slice_indices(elements.len(), start, stop, step)
                    .into_iter()
                    .map(|slot| elements[slot].clone())
                    .collect();
                Ok(Value::InternalList(picked))
            }
            Value::List(items) => {
                let picked = slice_indices(items.len(), start, stop, step)
                    .into_iter()
                    .map(|slot| items[slot].clone())
                    .collect();
                Ok(Value::List(picked))
            }
            other => Err(CfgError::config_at(
                slice.start,
                format!("invalid container for slicing: {}", other.type_name()),
            )),
        }
    }

    fn slice_bound(
        &self,
        node: &Option<AstNode>,
        which: &str,
        ctx: &Config,
    ) -> CfgResult<Option<i64>> {
        match node {
            None => Ok(None),
            Some(node) => match ctx.evaluate_fully(node)? {
                Value::Integer(bound) => Ok(Some(bound)),
                other => Err(CfgError::config_at(
                    node.start(),
                    format!("{which} is not an integer, but {}", other.type_name()),
                )),
            },
        }
    }

    /// Evaluate a node to a value; containers stay deferred as internal
    /// variants until unwrapped.
    fn evaluate(&self, node: &AstNode) -> CfgResult<Value> {
        match node {
            AstNode::Token(token) => self.evaluate_token(token),
            AstNode::Mapping(mapping) => Ok(Value::InternalMapping(wrap_mapping(mapping))),
            AstNode::List(list) => Ok(Value::InternalList(list.elements.clone())),
            AstNode::Unary(unary) => self.eval_unary(unary),
            AstNode::Binary(binary) => self.eval_binary(binary),
            AstNode::Slice(slice) => Err(CfgError::config_at(
                slice.start,
                "unable to evaluate a bare slice",
            )),
        }
    }

    fn evaluate_fully(&self, node: &AstNode) -> CfgResult<Value> {
        let value = self.evaluate(node)?;
        self.unwrap_value(&value)
    }

    fn evaluate_token(&self, token: &Token) -> CfgResult<Value> {
        match token.kind {
            TokenKind::IntegerNumber => match token.value {
                TokenValue::Integer(n) => Ok(Value::Integer(n)),
                _ => Err(self.bad_token(token)),
            },
            TokenKind::FloatNumber => match token.value {
                TokenValue::Float(x) => Ok(Value::Float(x)),
                _ => Err(self.bad_token(token)),
            },
            TokenKind::Complex => match token.value {
                TokenValue::Complex(z) => Ok(Value::Complex(z)),
                _ => Err(self.bad_token(token)),
            },
            TokenKind::StringToken => match &token.value {
                TokenValue::Str(s) => Ok(Value::String(s.clone())),
                _ => Err(self.bad_token(token)),
            },
            TokenKind::True => Ok(Value::Bool(true)),
            TokenKind::False => Ok(Value::Bool(false)),
            TokenKind::None => Ok(Value::None),
            TokenKind::Word => match self.context.get(token.text.as_str()) {
                Some(value) => Ok(value.clone()),
                None => Err(CfgError::config_at(
                    token.start,
                    format!("unknown variable: {}", token.text),
                )),
            },
            TokenKind::BackTick => self.convert_back_tick(token),
            _ => Err(self.bad_token(token)),
        }
    }

    fn bad_token(&self, token: &Token) -> CfgError {
        CfgError::config_at(token.start, format!("unable to evaluate: {}", token.kind))
    }

    /// Run the string converter over a back-tick literal, applying the
    /// strict-conversion rule and guarding against interpolation cycles.
    fn convert_back_tick(&self, token: &Token) -> CfgResult<Value> {
        let source = match &token.value {
            TokenValue::Str(s) => s.clone(),
            _ => return Err(self.bad_token(token)),
        };
        let ref_key = (token.text.to_string(), token.start);
        if !self.refs_seen.borrow_mut().insert(ref_key.clone()) {
            return Err(self.circular_reference(token.start));
        }
        let converted = (self.string_converter)(&source, self);
        self.refs_seen.borrow_mut().remove(&ref_key);
        let converted = converted?;
        if self.strict_conversions {
            if let Value::String(out) = &converted {
                if *out == source {
                    return Err(CfgError::config_at(
                        token.start,
                        format!("unable to convert string: {source}"),
                    ));
                }
            }
        }
        Ok(converted)
    }

    fn circular_reference(&self, at: Location) -> CfgError {
        let mut entries: Vec<(String, Location)> =
            self.refs_seen.borrow().iter().cloned().collect();
        entries.sort_by_key(|(_, loc)| *loc);
        let rendered: Vec<String> = entries
            .iter()
            .map(|(path, loc)| format!("{path} {loc}"))
            .collect();
        CfgError::config_at(at, format!("circular reference: {}", rendered.join(", ")))
    }

    fn eval_unary(&self, node: &UnaryNode) -> CfgResult<Value> {
        match node.op {
            TokenKind::At => self.eval_include(node),
            TokenKind::Dollar => self.eval_reference(node),
            TokenKind::Minus => match self.evaluate_fully(&node.operand)? {
                Value::Integer(n) => Ok(n
                    .checked_neg()
                    .map(Value::Integer)
                    .unwrap_or(Value::Float(-(n as f64)))),
                Value::Float(x) => Ok(Value::Float(-x)),
                Value::Complex(z) => Ok(Value::Complex(-z)),
                other => Err(CfgError::config_at(
                    node.start,
                    format!("cannot negate {}", other.type_name()),
                )),
            },
            TokenKind::Plus => match self.evaluate_fully(&node.operand)? {
                value @ (Value::Integer(_) | Value::Float(_) | Value::Complex(_)) => Ok(value),
                other => Err(CfgError::config_at(
                    node.start,
                    format!("cannot apply '+' to {}", other.type_name()),
                )),
            },
            TokenKind::BitwiseComplement => match self.evaluate_fully(&node.operand)? {
                Value::Integer(n) => Ok(Value::Integer(!n)),
                other => Err(CfgError::config_at(
                    node.start,
                    format!("cannot bitwise-complement {}", other.type_name()),
                )),
            },
            TokenKind::Not => match self.evaluate(&node.operand)?.as_bool() {
                Some(flag) => Ok(Value::Bool(!flag)),
                None => Err(CfgError::config_at(
                    node.start,
                    "cannot logically negate a non-boolean",
                )),
            },
            op => Err(CfgError::config_at(
                node.start,
                format!("unable to evaluate unary {op}"),
            )),
        }
    }

    /// `${path}`: resolve against this configuration's own root, detecting
    /// reference cycles via the node's identity.
    fn eval_reference(&self, node: &UnaryNode) -> CfgResult<Value> {
        let path_text = to_source(&node.operand);
        let ref_key = (path_text, node.start);
        if !self.refs_seen.borrow_mut().insert(ref_key.clone()) {
            return Err(self.circular_reference(node.start));
        }
        let result = self.get_from_path(&node.operand);
        self.refs_seen.borrow_mut().remove(&ref_key);
        result
    }

    /// `@"path"`: parse another file into a nested configuration (mapping
    /// root) or a deferred list (list root).
    fn eval_include(&self, node: &UnaryNode) -> CfgResult<Value> {
        let operand = self.evaluate_fully(&node.operand)?;
        let relative = match operand {
            Value::String(s) => s,
            other => {
                return Err(CfgError::config_at(
                    node.start,
                    format!("include path must be a string, but is {}", other.type_name()),
                ))
            }
        };
        let resolved = self.resolve_include(&relative).ok_or_else(|| {
            CfgError::config_at(node.start, format!("unable to locate {relative}"))
        })?;
        if let Some(own) = &self.path {
            if same_file(own, &resolved) {
                return Err(CfgError::config_at(
                    node.start,
                    format!("configuration cannot include itself: {relative}"),
                ));
            }
        }
        let file = File::open(&resolved)?;
        let mut parser = Parser::new(BufReader::new(file))?;
        let root = parser.container()?;
        if !parser.at_end() {
            return Err(CfgError::parser(
                parser.current().start,
                format!("unexpected: {}", parser.current().kind),
            ));
        }
        match root {
            AstNode::List(list) => Ok(Value::InternalList(list.elements)),
            AstNode::Mapping(mapping) => {
                if self.no_duplicates {
                    validate_no_duplicates(&mapping)?;
                }
                let mut child = Config::new();
                child.no_duplicates = self.no_duplicates;
                child.strict_conversions = self.strict_conversions;
                child.include_path = self.include_path.clone();
                child.context = self.context.clone();
                child.string_converter = self.string_converter;
                if self.cache.is_some() {
                    child.set_cache(true);
                }
                child.root_dir = resolved
                    .parent()
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .map(Path::to_path_buf);
                child.path = Some(resolved);
                // The parent link carries no cache so that the child, which
                // may end up in the parent's cache, cannot keep it alive in
                // a cycle.
                let mut parent_view = self.clone();
                parent_view.cache = None;
                child.parent = Some(Box::new(parent_view));
                child.data = Some(Rc::new(wrap_mapping(&mapping)));
                Ok(Value::Config(child))
            }
            _ => Err(CfgError::config("root configuration must be a mapping")),
        }
    }

    fn resolve_include(&self, relative: &str) -> Option<PathBuf> {
        let candidate = PathBuf::from(relative);
        if candidate.is_absolute() {
            return candidate.exists().then_some(candidate);
        }
        match &self.root_dir {
            Some(root) => {
                let joined = root.join(relative);
                if joined.exists() {
                    return Some(joined);
                }
            }
            None => {
                if candidate.exists() {
                    return Some(candidate);
                }
            }
        }
        for dir in &self.include_path {
            let joined = dir.join(relative);
            if joined.exists() {
                return Some(joined);
            }
        }
        None
    }

    fn eval_binary(&self, node: &BinaryNode) -> CfgResult<Value> {
        use TokenKind::*;
        match node.op {
            Dot | LeftBracket | Colon => self.eval_trailer_chain(node),
            And => {
                let lhs = self.logical_operand(&node.lhs, node.start)?;
                if !lhs {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.logical_operand(&node.rhs, node.start)?))
            }
            Or => {
                let lhs = self.logical_operand(&node.lhs, node.start)?;
                if lhs {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.logical_operand(&node.rhs, node.start)?))
            }
            _ => {
                let lhs = self.evaluate_fully(&node.lhs)?;
                let rhs = self.evaluate_fully(&node.rhs)?;
                self.apply_operator(node.op, lhs, rhs, node.start)
            }
        }
    }

    fn logical_operand(&self, node: &AstNode, at: Location) -> CfgResult<bool> {
        match self.evaluate(node)? {
            Value::Bool(flag) => Ok(flag),
            other => Err(CfgError::config_at(
                at,
                format!("cannot evaluate logical operation on {}", other.type_name()),
            )),
        }
    }

    /// Inline `.word`, `[index]` and `[slice]` trailers on arbitrary atoms;
    /// the chain is flattened so that reading through a nested configuration
    /// keeps evaluating in the right context.
    fn eval_trailer_chain(&self, node: &BinaryNode) -> CfgResult<Value> {
        let mut elements: Vec<(TokenKind, AstNode)> = Vec::new();
        let mut cursor = node;
        let base = loop {
            elements.push((cursor.op, cursor.rhs.clone()));
            match &cursor.lhs {
                AstNode::Binary(inner)
                    if matches!(inner.op, TokenKind::Dot | TokenKind::LeftBracket | TokenKind::Colon) =>
                {
                    cursor = &**inner;
                }
                other => break other.clone(),
            }
        };
        elements.reverse();
        let start = self.evaluate(&base)?;
        self.walk(start, &elements)
    }

    fn apply_operator(
        &self,
        op: TokenKind,
        lhs: Value,
        rhs: Value,
        at: Location,
    ) -> CfgResult<Value> {
        use TokenKind::{
            AltUnequal, BitwiseAnd, BitwiseOr, BitwiseXor, Equal, GreaterThan,
            GreaterThanOrEqual, In, Is, LeftShift, LessThan, LessThanOrEqual, Minus, Modulo,
            Plus, Power, RightShift, Slash, SlashSlash, Star, Unequal,
        };
        match op {
            Plus => self.add_values(lhs, rhs, at),
            Minus => self.sub_values(lhs, rhs, at),
            Star => match numeric_pair(&lhs, &rhs) {
                Some(NumericPair::Int(a, b)) => Ok(a
                    .checked_mul(b)
                    .map(Value::Integer)
                    .unwrap_or(Value::Float(a as f64 * b as f64))),
                Some(NumericPair::Float(a, b)) => Ok(Value::Float(a * b)),
                Some(NumericPair::Complex(a, b)) => Ok(Value::Complex(a * b)),
                None => Err(self.type_error(at, "multiply", &lhs, "by", &rhs)),
            },
            Slash => match numeric_pair(&lhs, &rhs) {
                Some(NumericPair::Int(a, b)) => Ok(Value::Float(a as f64 / b as f64)),
                Some(NumericPair::Float(a, b)) => Ok(Value::Float(a / b)),
                Some(NumericPair::Complex(a, b)) => Ok(Value::Complex(a / b)),
                None => Err(self.type_error(at, "divide", &lhs, "by", &rhs)),
            },
            SlashSlash => match (&lhs, &rhs) {
                (Value::Integer(a), Value::Integer(b)) => {
                    if *b == 0 {
                        Err(CfgError::config_at(at, "division by zero"))
                    } else {
                        Ok(Value::Integer(a / b))
                    }
                }
                _ => Err(self.type_error(at, "integer-divide", &lhs, "by", &rhs)),
            },
            Modulo => match (&lhs, &rhs) {
                (Value::Integer(a), Value::Integer(b)) => {
                    if *b == 0 {
                        Err(CfgError::config_at(at, "division by zero"))
                    } else {
                        Ok(Value::Integer(a % b))
                    }
                }
                _ => Err(self.type_error(at, "take the modulo of", &lhs, "by", &rhs)),
            },
            Power => match numeric_pair(&lhs, &rhs) {
                Some(NumericPair::Int(a, b)) => {
                    if b >= 0 {
                        let exponent = u32::try_from(b).ok();
                        match exponent.and_then(|e| a.checked_pow(e)) {
                            Some(result) => Ok(Value::Integer(result)),
                            None => Ok(Value::Float((a as f64).powf(b as f64))),
                        }
                    } else {
                        Ok(Value::Float((a as f64).powf(b as f64)))
                    }
                }
                Some(NumericPair::Float(a, b)) => Ok(Value::Float(a.powf(b))),
                Some(NumericPair::Complex(a, b)) => Ok(Value::Complex(a.powc(b))),
                None => Err(self.type_error(at, "raise", &lhs, "to the power of", &rhs)),
            },
            LeftShift => match (&lhs, &rhs) {
                (Value::Integer(a), Value::Integer(b)) => {
                    let count = shift_count(*b, at)?;
                    Ok(Value::Integer(a.checked_shl(count).unwrap_or(0)))
                }
                _ => Err(self.type_error(at, "left-shift", &lhs, "by", &rhs)),
            },
            RightShift => match (&lhs, &rhs) {
                (Value::Integer(a), Value::Integer(b)) => {
                    let count = shift_count(*b, at)?;
                    Ok(Value::Integer(a.checked_shr(count).unwrap_or(0)))
                }
                _ => Err(self.type_error(at, "right-shift", &lhs, "by", &rhs)),
            },
            BitwiseAnd => match (&lhs, &rhs) {
                (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a & b)),
                _ => Err(self.type_error(at, "bitwise-and", &lhs, "and", &rhs)),
            },
            BitwiseXor => match (&lhs, &rhs) {
                (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a ^ b)),
                _ => Err(self.type_error(at, "bitwise-xor", &lhs, "and", &rhs)),
            },
            BitwiseOr => match (&lhs, &rhs) {
                (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(a | b)),
                (Value::Mapping(a), Value::Mapping(b)) => Ok(Value::Mapping(merge_maps(a, b))),
                _ => Err(self.type_error(at, "bitwise-or", &lhs, "and", &rhs)),
            },
            Equal | Is => Ok(Value::Bool(lhs == rhs)),
            Unequal | AltUnequal => Ok(Value::Bool(lhs != rhs)),
            LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
                let ordering = compare_values(&lhs, &rhs)
                    .ok_or_else(|| self.type_error(at, "compare", &lhs, "and", &rhs))?;
                Ok(Value::Bool(match op {
                    LessThan => ordering.is_lt(),
                    LessThanOrEqual => ordering.is_le(),
                    GreaterThan => ordering.is_gt(),
                    _ => ordering.is_ge(),
                }))
            }
            In => match (&lhs, &rhs) {
                (Value::String(needle), Value::String(haystack)) => {
                    Ok(Value::Bool(haystack.contains(needle.as_str())))
                }
                (needle, Value::List(items)) => {
                    Ok(Value::Bool(items.iter().any(|item| item == needle)))
                }
                (Value::String(key), Value::Mapping(map)) => {
                    Ok(Value::Bool(map.contains_key(key.as_str())))
                }
                _ => Err(self.type_error(at, "test membership of", &lhs, "in", &rhs)),
            },
            op => Err(CfgError::config_at(
                at,
                format!("unable to evaluate binary {op}"),
            )),
        }
    }

    fn add_values(&self, lhs: Value, rhs: Value, at: Location) -> CfgResult<Value> {
        match (&lhs, &rhs) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            (Value::List(a), Value::List(b)) => {
                let mut joined = a.clone();
                joined.extend(b.iter().cloned());
                Ok(Value::List(joined))
            }
            (Value::Mapping(a), Value::Mapping(b)) => Ok(Value::Mapping(merge_maps(a, b))),
            _ => match numeric_pair(&lhs, &rhs) {
                Some(NumericPair::Int(a, b)) => Ok(a
                    .checked_add(b)
                    .map(Value::Integer)
                    .unwrap_or(Value::Float(a as f64 + b as f64))),
                Some(NumericPair::Float(a, b)) => Ok(Value::Float(a + b)),
                Some(NumericPair::Complex(a, b)) => Ok(Value::Complex(a + b)),
                None => Err(self.type_error(at, "add", &lhs, "and", &rhs)),
            },
        }
    }

    fn sub_values(&self, lhs: Value, rhs: Value, at: Location) -> CfgResult<Value> {
        match (&lhs, &rhs) {
            (Value::Mapping(a), Value::Mapping(b)) => {
                let mut out = a.clone();
                for key in b.keys() {
                    out.remove(key);
                }
                Ok(Value::Mapping(out))
            }
            _ => match numeric_pair(&lhs, &rhs) {
                Some(NumericPair::Int(a, b)) => Ok(a
                    .checked_sub(b)
                    .map(Value::Integer)
                    .unwrap_or(Value::Float(a as f64 - b as f64))),
                Some(NumericPair::Float(a, b)) => Ok(Value::Float(a - b)),
                Some(NumericPair::Complex(a, b)) => Ok(Value::Complex(a - b)),
                None => Err(self.type_error(at, "subtract", &rhs, "from", &lhs)),
            },
        }
    }

    fn type_error(
        &self,
        at: Location,
        verb: &str,
        first: &Value,
        joiner: &str,
        second: &Value,
    ) -> CfgError {
        CfgError::config_at(
            at,
            format!(
                "cannot {verb} {} {joiner} {}",
                first.type_name(),
                second.type_name()
            ),
        )
    }

    /// Convert internal variants into their public equivalents, evaluating
    /// whatever is still deferred.
    fn unwrap_value(&self, value: &Value) -> CfgResult<Value> {
        match value {
            Value::InternalList(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for node in elements {
                    let element = self.evaluate(node)?;
                    items.push(self.unwrap_value(&element)?);
                }
                Ok(Value::List(items))
            }
            Value::InternalMapping(table) => {
                let mut out = ValueMap::new();
                for (key, node) in table.iter() {
                    let element = self.evaluate(node)?;
                    out.insert(key.clone(), self.unwrap_value(&element)?);
                }
                Ok(Value::Mapping(out))
            }
            Value::Config(child) => Ok(Value::Mapping(child.as_dict()?)),
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.unwrap_value(item)?);
                }
                Ok(Value::List(out))
            }
            Value::Mapping(map) => {
                let mut out = ValueMap::new();
                for (key, item) in map.iter() {
                    out.insert(key.clone(), self.unwrap_value(item)?);
                }
                Ok(Value::Mapping(out))
            }
            other => Ok(other.clone()),
        }
    }
}

impl FromStr for Config {
    type Err = CfgError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Config::from_source(source)
    }
}

enum NumericPair {
    Int(i64, i64),
    Float(f64, f64),
    Complex(Complex, Complex),
}

fn numeric_pair(lhs: &Value, rhs: &Value) -> Option<NumericPair> {
    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => Some(NumericPair::Int(*a, *b)),
        (Value::Integer(a), Value::Float(b)) => Some(NumericPair::Float(*a as f64, *b)),
        (Value::Float(a), Value::Integer(b)) => Some(NumericPair::Float(*a, *b as f64)),
        (Value::Float(a), Value::Float(b)) => Some(NumericPair::Float(*a, *b)),
        (Value::Complex(a), Value::Complex(b)) => Some(NumericPair::Complex(*a, *b)),
        (Value::Complex(a), Value::Integer(b)) => {
            Some(NumericPair::Complex(*a, (*b as f64).into()))
        }
        (Value::Complex(a), Value::Float(b)) => Some(NumericPair::Complex(*a, (*b).into())),
        (Value::Integer(a), Value::Complex(b)) => {
            Some(NumericPair::Complex((*a as f64).into(), *b))
        }
        (Value::Float(a), Value::Complex(b)) => Some(NumericPair::Complex((*a).into(), *b)),
        _ => None,
    }
}

fn compare_values(lhs: &Value, rhs: &Value) -> Option<std::cmp::Ordering> {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => match (lhs.as_f64(), rhs.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    }
}

fn shift_count(count: i64, at: Location) -> CfgResult<u32> {
    u32::try_from(count)
        .ok()
        .filter(|&c| c < 64)
        .ok_or_else(|| CfgError::config_at(at, format!("shift count out of range: {count}")))
}

fn normalize_index(index: i64, len: usize, at: Location) -> CfgResult<usize> {
    let n = len as i64;
    let adjusted = if index < 0 { index + n } else { index };
    if adjusted < 0 || adjusted >= n {
        return Err(CfgError::config_at(
            at,
            format!("index out of range: is {index}, must be between 0 and {}", n - 1),
        ));
    }
    Ok(adjusted as usize)
}

/// The index positions selected by a slice, per the inclusive-bounds
/// normalization rules: the `±1` stop adjustment applies only when a stop
/// was supplied, and start/stop swap when iterating backwards.
fn slice_indices(len: usize, start: Option<i64>, stop: Option<i64>, step: i64) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let n = len as i64;

    let mut start = start.unwrap_or(0);
    if start < 0 {
        start = if start >= -n { start + n } else { 0 };
    } else if start >= n {
        start = n - 1;
    }

    let mut stop = match stop {
        None => n - 1,
        Some(mut stop) => {
            if stop < 0 {
                stop = if stop >= -n { stop + n } else { 0 };
            }
            if stop > n {
                stop = n;
            }
            if step < 0 {
                stop + 1
            } else {
                stop - 1
            }
        }
    };

    if step < 0 && start < stop {
        std::mem::swap(&mut start, &mut stop);
    }

    let mut indices = Vec::new();
    let mut i = start;
    while if step > 0 { i <= stop } else { i >= stop } {
        if (0..n).contains(&i) {
            indices.push(i as usize);
        }
        i += step;
    }
    indices
}

/// Build the ordered key table for a mapping literal. Duplicates are
/// resolved later-wins here; rejection happens in `validate_no_duplicates`
/// at load time.
fn wrap_mapping(mapping: &MappingNode) -> AstTable {
    let mut table = AstTable::new();
    for (token, value) in &mapping.entries {
        table.replace(token.key_text(), value.clone());
    }
    table
}

/// Check every mapping literal under `mapping` for repeated keys, naming
/// both source locations when one is found.
fn validate_no_duplicates(mapping: &MappingNode) -> CfgResult<()> {
    let mut seen: HashMap<SmolStr, Location> = HashMap::new();
    for (token, value) in &mapping.entries {
        let key = token.key_text();
        if let Some(previous) = seen.get(&key) {
            return Err(CfgError::config_at(
                token.start,
                format!(
                    "duplicate key {key} seen at {} (previously at {})",
                    token.start, previous
                ),
            ));
        }
        seen.insert(key, token.start);
        validate_node(value)?;
    }
    Ok(())
}

fn validate_node(node: &AstNode) -> CfgResult<()> {
    match node {
        AstNode::Mapping(mapping) => validate_no_duplicates(mapping),
        AstNode::List(list) => {
            for element in &list.elements {
                validate_node(element)?;
            }
            Ok(())
        }
        AstNode::Unary(unary) => validate_node(&unary.operand),
        AstNode::Binary(binary) => {
            validate_node(&binary.lhs)?;
            validate_node(&binary.rhs)
        }
        AstNode::Slice(slice) => {
            for part in [&slice.start_index, &slice.stop_index, &slice.step]
                .into_iter()
                .flatten()
            {
                validate_node(part)?;
            }
            Ok(())
        }
        AstNode::Token(_) => Ok(()),
    }
}

fn merge_maps(lhs: &ValueMap, rhs: &ValueMap) -> ValueMap {
    let mut out = lhs.clone();
    for (key, incoming) in rhs.iter() {
        let merged = match (out.get(key), incoming) {
            (Some(Value::Mapping(a)), Value::Mapping(b)) => Value::Mapping(merge_maps(a, b)),
            _ => incoming.clone(),
        };
        out.replace(key.clone(), merged);
    }
    out
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
