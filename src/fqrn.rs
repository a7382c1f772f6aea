//! Fully qualified resource names
//!
//! An FQRN is the canonical address of a resource, output, local,
//! variable, provider, or module:
//!
//! ```text
//! module.<m1>.<m2>.resource.<type>.<name>.<attr>...
//! module.<m1>.<m2>
//! output.<name>[3]
//! local.<name>
//! variable.<name>
//! provider.<name>
//! ```
//!
//! The grammar is externally visible: user-authored `depends_on`
//! declarations use it directly, so it must remain stable.

use crate::errors::{Error, Result};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static INDEX_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<name>.+)\[(?P<index>\d+)\]$").unwrap());

/// The kind of entity an FQRN addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// An ordinary resource with its user-declared type
    Resource(String),
    Output,
    Local,
    Variable,
    Provider,
    /// A bare module address
    Module,
}

impl Kind {
    /// The type label used for provider lookup and events
    pub fn type_label(&self) -> &str {
        match self {
            Self::Resource(t) => t,
            Self::Output => "output",
            Self::Local => "local",
            Self::Variable => "variable",
            Self::Provider => "provider",
            Self::Module => "module",
        }
    }
}

/// A parsed fully qualified resource name
///
/// Immutable value type: it names a resource, it never owns one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fqrn {
    /// Module path, outermost first; empty for root-level entities
    pub module: Vec<String>,
    pub kind: Kind,
    pub name: String,
    /// Trailing attribute path, e.g. `["ip_address", "0"]`
    pub attribute: Vec<String>,
}

impl Fqrn {
    /// Construct an FQRN for a root-level resource of the given type
    pub fn resource(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: Vec::new(),
            kind: Kind::Resource(type_name.into()),
            name: name.into(),
            attribute: Vec::new(),
        }
    }

    /// Parse a string into an FQRN
    ///
    /// Fails with [`Error::InvalidFqrn`] on malformed input; a partially
    /// populated FQRN is never returned.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidFqrn {
            fqrn: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.split('.').filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            return Err(invalid("empty address"));
        }

        let mut module = Vec::new();
        let mut rest = parts.as_slice();

        if rest[0] == "module" {
            rest = &rest[1..];
            // Consume module names until a kind keyword appears.
            while let Some(part) = rest.first() {
                if is_kind_keyword(part) {
                    break;
                }
                module.push((*part).to_string());
                rest = &rest[1..];
            }
            if module.is_empty() {
                return Err(invalid("module address has no module name"));
            }
            if rest.is_empty() {
                // Bare module reference: the final component is the name.
                let name = module.pop().unwrap_or_default();
                return Ok(Self {
                    module,
                    kind: Kind::Module,
                    name,
                    attribute: Vec::new(),
                });
            }
        }

        let Some((keyword, rest)) = rest.split_first() else {
            return Err(invalid("missing kind segment"));
        };

        match *keyword {
            "resource" => {
                let [type_name, name, attrs @ ..] = rest else {
                    return Err(invalid("resource address needs a type and a name"));
                };
                Ok(Self {
                    module,
                    kind: Kind::Resource((*type_name).to_string()),
                    name: (*name).to_string(),
                    attribute: attrs.iter().map(|a| (*a).to_string()).collect(),
                })
            }
            "output" | "local" | "variable" | "provider" => {
                let [name, attrs @ ..] = rest else {
                    return Err(invalid("address needs a name"));
                };
                let kind = match *keyword {
                    "output" => Kind::Output,
                    "local" => Kind::Local,
                    "variable" => Kind::Variable,
                    _ => Kind::Provider,
                };
                let mut attribute = Vec::new();
                let mut name = (*name).to_string();
                // An index suffix on output/local names becomes a leading
                // numeric attribute segment: `output.ips[3]` -> attr ["3"].
                if matches!(kind, Kind::Output | Kind::Local)
                    && let Some(caps) = INDEX_SUFFIX.captures(&name)
                {
                    attribute.push(caps["index"].to_string());
                    name = caps["name"].to_string();
                }
                attribute.extend(attrs.iter().map(|a| (*a).to_string()));
                Ok(Self {
                    module,
                    kind,
                    name,
                    attribute,
                })
            }
            _ => Err(invalid("missing kind segment")),
        }
    }

    /// Prefix the module path with `parent`
    ///
    /// Used to make author-written references absolute: a reference
    /// declared inside a module does not know its own nesting.
    pub fn append_parent_module(&mut self, parent: &str) {
        let mut prefixed: Vec<String> = parent
            .split('.')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        prefixed.append(&mut self.module);
        self.module = prefixed;
    }

    /// Dotted module path this FQRN lives in; empty string at root
    pub fn module_path(&self) -> String {
        self.module.join(".")
    }

    /// For a `Kind::Module` FQRN, the full dotted path of the module it
    /// addresses (module path plus the module's own name)
    pub fn addressed_module(&self) -> String {
        let mut path = self.module.clone();
        path.push(self.name.clone());
        path.join(".")
    }

    /// Canonical reconstruction without the trailing attribute path
    ///
    /// Two references to the same entity compare equal through this
    /// form regardless of which attribute they read.
    pub fn to_string_without_attribute(&self) -> String {
        let mut out = String::new();
        if !self.module.is_empty() || self.kind == Kind::Module {
            out.push_str("module.");
            for part in &self.module {
                out.push_str(part);
                out.push('.');
            }
        }
        match &self.kind {
            Kind::Resource(type_name) => {
                out.push_str("resource.");
                out.push_str(type_name);
                out.push('.');
                out.push_str(&self.name);
            }
            Kind::Module => out.push_str(&self.name),
            kind => {
                out.push_str(kind.type_label());
                out.push('.');
                out.push_str(&self.name);
            }
        }
        out
    }
}

impl fmt::Display for Fqrn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_without_attribute())?;
        for attr in &self.attribute {
            write!(f, ".{attr}")?;
        }
        Ok(())
    }
}

fn is_kind_keyword(s: &str) -> bool {
    matches!(s, "resource" | "output" | "local" | "variable" | "provider")
}
