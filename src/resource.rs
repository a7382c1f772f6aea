//! Resource model
//!
//! A resource is identified by (module path, kind, name); the canonical
//! ID is its FQRN string. Shared metadata is held by composition and
//! reached through `meta()`/`meta_mut()` accessors.

use crate::expr::Body;
use crate::fqrn::{Fqrn, Kind};
use crate::types::Status;
use serde_json::{Map, Value};
use std::sync::{Arc, RwLock};

/// Metadata common to every resource variant
#[derive(Debug, Clone)]
pub struct Metadata {
    /// Dotted module path; empty string for root-level resources
    pub module: String,
    pub kind: Kind,
    pub name: String,
    /// Source position of the declaring block
    pub file: String,
    pub line: usize,
    pub column: usize,
    /// Disabled resources are connected only to the graph root and
    /// never dispatched to a provider
    pub disabled: bool,
    pub status: Status,
    /// User-declared dependencies, FQRN strings
    pub depends_on: Vec<String>,
    /// References discovered by scanning the raw body
    pub links: Vec<String>,
}

/// A declared resource: metadata, raw body, and decoded fields
#[derive(Debug, Clone)]
pub struct Resource {
    metadata: Metadata,
    /// Raw attribute expressions, decoded during the graph walk
    pub body: Body,
    /// Typed fields populated by decoding the body
    pub fields: Map<String, Value>,
}

impl Resource {
    /// Create a resource of the given kind at the root module
    pub fn new(kind: Kind, name: impl Into<String>) -> Self {
        Self {
            metadata: Metadata {
                module: String::new(),
                kind,
                name: name.into(),
                file: String::new(),
                line: 0,
                column: 0,
                disabled: false,
                status: Status::Pending,
                depends_on: Vec::new(),
                links: Vec::new(),
            },
            body: Body::new(),
            fields: Map::new(),
        }
    }

    /// Create an ordinary resource of a user-declared type
    pub fn resource(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(Kind::Resource(type_name.into()), name)
    }

    /// Place the resource inside a module, builder style
    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.metadata.module = module.into();
        self
    }

    /// Attach the raw body, builder style
    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Declare explicit dependencies, builder style
    pub fn with_depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Record the source position, builder style
    pub fn at(mut self, file: impl Into<String>, line: usize, column: usize) -> Self {
        self.metadata.file = file.into();
        self.metadata.line = line;
        self.metadata.column = column;
        self
    }

    /// Mark the resource disabled, builder style
    pub fn disabled(mut self) -> Self {
        self.metadata.disabled = true;
        self
    }

    pub fn meta(&self) -> &Metadata {
        &self.metadata
    }

    pub fn meta_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// The FQRN naming this resource
    pub fn fqrn(&self) -> Fqrn {
        Fqrn {
            module: self
                .metadata
                .module
                .split('.')
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            kind: self.metadata.kind.clone(),
            name: self.metadata.name.clone(),
            attribute: Vec::new(),
        }
    }

    /// Canonical ID, the FQRN string
    pub fn id(&self) -> String {
        self.fqrn().to_string()
    }

    /// For module resources, the full dotted path of the module they
    /// declare (parent path plus own name)
    pub fn declared_module_path(&self) -> String {
        if self.metadata.module.is_empty() {
            self.metadata.name.clone()
        } else {
            format!("{}.{}", self.metadata.module, self.metadata.name)
        }
    }

    /// The value other resources see when they link to this one
    ///
    /// Outputs and locals expose their computed `value` directly;
    /// everything else exposes its full serialized form.
    pub fn exposed_value(&self) -> Value {
        match self.metadata.kind {
            Kind::Output | Kind::Local | Kind::Variable => {
                self.fields.get("value").cloned().unwrap_or(Value::Null)
            }
            _ => self.to_value(),
        }
    }

    /// Full serialized form: identity scalars plus decoded fields
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert("id".into(), Value::String(self.id()));
        map.insert(
            "type".into(),
            Value::String(self.metadata.kind.type_label().to_string()),
        );
        map.insert("name".into(), Value::String(self.metadata.name.clone()));
        map.insert("module".into(), Value::String(self.metadata.module.clone()));
        map.insert("disabled".into(), Value::Bool(self.metadata.disabled));
        Value::Object(map)
    }
}

/// Shared handle used during the concurrent walk phase
///
/// Each node mutates only its own resource; the store's backing
/// sequence is never touched while the walk runs.
pub type SharedResource = Arc<RwLock<Resource>>;

/// Wrap a resource for shared use
pub fn shared(resource: Resource) -> SharedResource {
    Arc::new(RwLock::new(resource))
}

/// Read-lock a shared resource, recovering from a poisoned lock
///
/// A walk task that panicked has already surfaced its own failure; the
/// data behind the lock is the last consistent write.
pub fn read(resource: &SharedResource) -> std::sync::RwLockReadGuard<'_, Resource> {
    resource
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Write-lock a shared resource, recovering from a poisoned lock
pub fn write(resource: &SharedResource) -> std::sync::RwLockWriteGuard<'_, Resource> {
    resource
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_is_canonical_fqrn() {
        let r = Resource::resource("container", "app").in_module("a.b");
        assert_eq!(r.id(), "module.a.b.resource.container.app");

        let r = Resource::new(Kind::Output, "ip");
        assert_eq!(r.id(), "output.ip");

        let r = Resource::new(Kind::Module, "b").in_module("a");
        assert_eq!(r.id(), "module.a.b");
        assert_eq!(r.declared_module_path(), "a.b");
    }

    #[test]
    fn test_exposed_value_output_vs_resource() {
        let mut output = Resource::new(Kind::Output, "ip");
        output.fields.insert("value".into(), json!("10.0.0.1"));
        assert_eq!(output.exposed_value(), json!("10.0.0.1"));

        let mut container = Resource::resource("container", "app");
        container.fields.insert("image".into(), json!("nginx"));
        let value = container.exposed_value();
        assert_eq!(value["id"], json!("resource.container.app"));
        assert_eq!(value["image"], json!("nginx"));
    }
}
