//! Raw resource bodies and the expression data model
//!
//! A resource body is a tree of attributes, nested blocks, and
//! expressions. Turning configuration text into this tree is the job of
//! a front-end parser and is out of scope here; the engine only needs a
//! closed, typed representation it can scan for references and decode
//! against an evaluation context.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static INDEX_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<name>.+)\[(?P<index>\d+)\]$").unwrap());

/// Hook for evaluating function-call expressions
///
/// Function semantics belong to the expression language, not the
/// engine; callers supply a dispatcher when their bodies use calls.
pub type FuncDispatch = dyn Fn(&str, &[Value]) -> anyhow::Result<Value> + Send + Sync;

/// One piece of a template expression
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Literal text
    Literal(String),
    /// An interpolated traversal, e.g. `resource.network.cloud.id`
    Interp(String),
}

/// Binary operators the decoder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Add,
    Sub,
}

/// An attribute expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A plain value, needs no context to decode
    Literal(Value),
    /// A string template with interpolated traversals
    Template(Vec<TemplatePart>),
    /// A bare traversal, e.g. `resource.network.cloud.id`
    Reference(String),
    /// A function call, evaluated through [`FuncDispatch`]
    FuncCall { name: String, args: Vec<Expr> },
    /// `cond ? then : otherwise`
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Object constructor
    Object(Vec<(String, Expr)>),
    /// Tuple constructor
    Tuple(Vec<Expr>),
    /// `source[*].attr` projection over a collection
    Splat {
        source: Box<Expr>,
        attribute: Vec<String>,
    },
}

impl Expr {
    /// Shorthand for a literal string
    pub fn string(s: impl Into<String>) -> Self {
        Self::Literal(Value::String(s.into()))
    }

    /// Shorthand for a literal number
    pub fn number(n: i64) -> Self {
        Self::Literal(Value::from(n))
    }

    /// Shorthand for a literal bool
    pub fn bool(b: bool) -> Self {
        Self::Literal(Value::Bool(b))
    }

    /// Shorthand for a reference traversal
    pub fn reference(path: impl Into<String>) -> Self {
        Self::Reference(path.into())
    }

    /// Evaluate this expression against a variable scope
    ///
    /// `scope` is the locked variable map of the owning module's
    /// evaluation context; `funcs` handles any function calls.
    pub fn evaluate(
        &self,
        scope: &Map<String, Value>,
        funcs: Option<&FuncDispatch>,
    ) -> anyhow::Result<Value> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Reference(path) => lookup_path(scope, path)
                .ok_or_else(|| anyhow::anyhow!("reference '{path}' not found in scope")),
            Self::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Literal(text) => out.push_str(text),
                        TemplatePart::Interp(path) => {
                            let value = lookup_path(scope, path).ok_or_else(|| {
                                anyhow::anyhow!("interpolation '{path}' not found in scope")
                            })?;
                            out.push_str(&display_value(&value)?);
                        }
                    }
                }
                Ok(Value::String(out))
            }
            Self::FuncCall { name, args } => {
                let dispatch = funcs
                    .ok_or_else(|| anyhow::anyhow!("no function dispatcher for call '{name}'"))?;
                let args = args
                    .iter()
                    .map(|a| a.evaluate(scope, funcs))
                    .collect::<anyhow::Result<Vec<_>>>()?;
                dispatch(name, &args)
            }
            Self::Conditional {
                cond,
                then,
                otherwise,
            } => match cond.evaluate(scope, funcs)? {
                Value::Bool(true) => then.evaluate(scope, funcs),
                Value::Bool(false) => otherwise.evaluate(scope, funcs),
                other => anyhow::bail!("conditional expects a bool, got {other}"),
            },
            Self::Binary { op, lhs, rhs } => {
                eval_binary(*op, &lhs.evaluate(scope, funcs)?, &rhs.evaluate(scope, funcs)?)
            }
            Self::Object(entries) => {
                let mut map = Map::new();
                for (key, expr) in entries {
                    map.insert(key.clone(), expr.evaluate(scope, funcs)?);
                }
                Ok(Value::Object(map))
            }
            Self::Tuple(items) => Ok(Value::Array(
                items
                    .iter()
                    .map(|e| e.evaluate(scope, funcs))
                    .collect::<anyhow::Result<Vec<_>>>()?,
            )),
            Self::Splat { source, attribute } => {
                let Value::Array(items) = source.evaluate(scope, funcs)? else {
                    anyhow::bail!("splat source is not a collection");
                };
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let mut current = item;
                    for segment in attribute {
                        current = descend(&current, segment)
                            .ok_or_else(|| anyhow::anyhow!("splat attribute '{segment}' missing"))?;
                    }
                    out.push(current);
                }
                Ok(Value::Array(out))
            }
        }
    }
}

/// A nested block inside a resource body
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    /// Block type, e.g. `port` or `volume`
    pub kind: String,
    pub body: Body,
}

/// The raw, undecoded body of a resource
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    /// Attributes in declaration order
    pub attributes: Vec<(String, Expr)>,
    /// Nested blocks in declaration order
    pub blocks: Vec<Block>,
}

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute, builder style
    pub fn attr(mut self, name: impl Into<String>, expr: Expr) -> Self {
        self.attributes.push((name.into(), expr));
        self
    }

    /// Add a nested block, builder style
    pub fn block(mut self, kind: impl Into<String>, body: Body) -> Self {
        self.blocks.push(Block {
            kind: kind.into(),
            body,
        });
        self
    }

    /// Decode every attribute and block against a variable scope
    ///
    /// Blocks of the same kind collect into an array under the kind
    /// name, preserving declaration order.
    pub fn decode(
        &self,
        scope: &Map<String, Value>,
        funcs: Option<&FuncDispatch>,
    ) -> anyhow::Result<Map<String, Value>> {
        let mut fields = Map::new();
        for (name, expr) in &self.attributes {
            fields.insert(name.clone(), expr.evaluate(scope, funcs)?);
        }
        for block in &self.blocks {
            let decoded = Value::Object(block.body.decode(scope, funcs)?);
            match fields
                .entry(block.kind.clone())
                .or_insert_with(|| Value::Array(Vec::new()))
            {
                Value::Array(items) => items.push(decoded),
                other => anyhow::bail!(
                    "block kind '{}' collides with attribute of type {other}",
                    block.kind
                ),
            }
        }
        Ok(fields)
    }
}

/// Resolve a dotted traversal inside a value scope
///
/// Numeric segments and `name[n]` suffixes index into arrays.
pub fn lookup_path(scope: &Map<String, Value>, path: &str) -> Option<Value> {
    let mut current: Option<&Value> = None;
    for segment in path.split('.') {
        let (key, index) = split_index(segment);
        let next = match current {
            None => scope.get(key),
            Some(value) => descend_ref(value, key),
        }?;
        current = Some(next);
        if let Some(i) = index {
            current = Some(current?.as_array()?.get(i)?);
        }
    }
    current.cloned()
}

fn split_index(segment: &str) -> (&str, Option<usize>) {
    match INDEX_SEGMENT.captures(segment) {
        Some(caps) => {
            let index = caps["index"].parse().ok();
            let name_len = caps["name"].len();
            (&segment[..name_len], index)
        }
        None => (segment, None),
    }
}

fn descend_ref<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => items.get(key.parse::<usize>().ok()?),
        _ => None,
    }
}

fn descend(value: &Value, key: &str) -> Option<Value> {
    let (key, index) = split_index(key);
    let mut found = descend_ref(value, key)?;
    if let Some(i) = index {
        found = found.as_array()?.get(i)?;
    }
    Some(found.clone())
}

fn display_value(value: &Value) -> anyhow::Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => anyhow::bail!("cannot interpolate non-scalar value {other}"),
    }
}

fn eval_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> anyhow::Result<Value> {
    use BinaryOp::{Add, And, Eq, Gt, GtEq, Lt, LtEq, NotEq, Or, Sub};
    match op {
        Eq => Ok(Value::Bool(lhs == rhs)),
        NotEq => Ok(Value::Bool(lhs != rhs)),
        And | Or => {
            let (Value::Bool(l), Value::Bool(r)) = (lhs, rhs) else {
                anyhow::bail!("logical operator expects bools, got {lhs} and {rhs}");
            };
            Ok(Value::Bool(if op == And { *l && *r } else { *l || *r }))
        }
        Lt | LtEq | Gt | GtEq => {
            let (l, r) = numeric_pair(lhs, rhs)?;
            Ok(Value::Bool(match op {
                Lt => l < r,
                LtEq => l <= r,
                Gt => l > r,
                _ => l >= r,
            }))
        }
        Add | Sub => {
            let (l, r) = numeric_pair(lhs, rhs)?;
            let result = if op == Add { l + r } else { l - r };
            Ok(serde_json::Number::from_f64(result).map_or(Value::Null, Value::Number))
        }
    }
}

fn numeric_pair(lhs: &Value, rhs: &Value) -> anyhow::Result<(f64, f64)> {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(l), Some(r)) => Ok((l, r)),
        _ => anyhow::bail!("operator expects numbers, got {lhs} and {rhs}"),
    }
}
