//! Topological graph walker
//!
//! Scheduling is an explicit in-degree countdown: a node becomes
//! eligible only when every inbound edge's source has reached a
//! terminal state, and eligible siblings run concurrently on a bounded
//! rayon pool. A node's visit blocks only while holding its module's
//! context lock; waiting for dependencies is a scheduling condition,
//! not a blocking call. On failure the node's transitive dependents are
//! marked failed-by-prerequisite and never scheduled; diagnostics from
//! every node are aggregated and returned once the walk drains.

use crate::context::{EvalContext, set_path};
use crate::engine::builder::{Graph, ROOT};
use crate::errors::{Diagnostic, Diagnostics, Error, Result};
use crate::expr::FuncDispatch;
use crate::fqrn::{Fqrn, Kind};
use crate::resource::{SharedResource, read, write};
use crate::store::Config;
use crate::types::WalkOptions;
use serde_json::Value;
use std::sync::{Mutex, PoisonError};

/// Per-node callback invoked for ordinary, enabled resources
///
/// Carries a lifetime so callers can pass closures borrowing run-local
/// state (summaries, journals) rather than `'static` ones.
pub type NodeCallback<'a> = dyn Fn(&SharedResource) -> Result<()> + Send + Sync + 'a;

/// Walks a dependency graph, resolving references and decoding bodies
pub struct Walker<'a> {
    config: &'a Config,
    ctx: &'a std::sync::Arc<EvalContext>,
    options: WalkOptions,
    funcs: Option<&'a FuncDispatch>,
}

impl<'a> Walker<'a> {
    pub fn new(config: &'a Config, ctx: &'a std::sync::Arc<EvalContext>) -> Self {
        Self {
            config,
            ctx,
            options: WalkOptions::default(),
            funcs: None,
        }
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    /// Supply a dispatcher for function-call expressions
    pub fn with_functions(mut self, funcs: &'a FuncDispatch) -> Self {
        self.funcs = Some(funcs);
        self
    }

    /// Walk the graph, invoking `callback` for each ordinary enabled
    /// resource once its dependencies have completed
    pub fn walk(
        &self,
        graph: &Graph,
        callback: &NodeCallback<'_>,
    ) -> std::result::Result<(), Diagnostics> {
        let mut diags = Diagnostics::new();
        self.seed_variables(&mut diags);

        let run = WalkRun {
            walker: self,
            graph,
            callback,
            state: Mutex::new(WalkState {
                in_degree: graph.in_degrees(),
                poisoned: vec![false; graph.node_count()],
            }),
            diags: Mutex::new(diags),
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs.max(1))
            .build()
            .map_err(|e| {
                Diagnostics::from(Diagnostic::error(
                    "walker",
                    format!("failed to create thread pool: {e}"),
                ))
            })?;

        pool.scope(|scope| {
            // The synthetic root has nothing to visit; completing it
            // releases every zero-dependency node.
            run.complete(ROOT, true, scope);
        });

        run.diags
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_result()
    }

    /// Resolve variable values into their module contexts before the
    /// concurrent phase starts
    fn seed_variables(&self, diags: &mut Diagnostics) {
        for resource in self.config.iter() {
            let (is_variable, module, name, body, id) = {
                let r = read(resource);
                (
                    r.meta().kind == Kind::Variable,
                    r.meta().module.clone(),
                    r.meta().name.clone(),
                    r.body.clone(),
                    r.id(),
                )
            };
            if !is_variable {
                continue;
            }
            let ctx = self.ctx.descend(&module);
            let decoded = {
                let vars = ctx.lock();
                body.decode(&vars, self.funcs)
            };
            match decoded {
                Ok(fields) => {
                    let value = fields
                        .get("value")
                        .or_else(|| fields.get("default"))
                        .cloned()
                        .unwrap_or(Value::Null);
                    ctx.set_var(&format!("variable.{name}"), value);
                    write(resource).fields = fields;
                }
                Err(e) => diags.push(Diagnostic::error(id, format!("invalid variable: {e}"))),
            }
        }
    }

    /// Visit one node: resolve links, decode, then act on the kind
    fn visit(&self, resource: &SharedResource, callback: &NodeCallback<'_>) -> Result<()> {
        let (module, links, body, id, already_disabled) = {
            let r = read(resource);
            (
                r.meta().module.clone(),
                r.meta().links.clone(),
                r.body.clone(),
                r.id(),
                r.meta().disabled,
            )
        };

        // A resource disabled before its visit bypasses its
        // dependencies entirely: its references are not required to
        // resolve and its body is never decoded.
        if already_disabled {
            return Ok(());
        }

        let ctx = self.ctx.descend(&module);

        // Write resolved link values and decode the body under one
        // critical section, so a sibling writing into the same module
        // scope can never interleave with this decode.
        let fields = {
            let mut vars = ctx.lock();
            for link in &links {
                let target = self.config.find_relative(link, &module)?;
                let value = read(&target).exposed_value();
                let path = Fqrn::parse(link)?.to_string_without_attribute();
                set_path(&mut vars, &path, value);
            }
            body.decode(&vars, self.funcs)
                .map_err(|e| Error::Decode {
                    resource: id,
                    reason: e.to_string(),
                })?
        };

        let (kind, disabled, declared) = {
            let mut r = write(resource);
            if fields.get("disabled").and_then(Value::as_bool) == Some(true) {
                r.meta_mut().disabled = true;
            }
            r.fields = fields;
            (
                r.meta().kind.clone(),
                r.meta().disabled,
                r.declared_module_path(),
            )
        };

        match kind {
            Kind::Module => {
                // Module nodes are structural: no external callback.
                if disabled {
                    for contained in self.config.find_contained(&declared, true) {
                        write(&contained).meta_mut().disabled = true;
                    }
                }
                let child = self.ctx.descend(&declared);
                let inputs = read(resource).fields.clone();
                for (name, value) in inputs {
                    if name != "disabled" {
                        child.set_var(&format!("variable.{name}"), value);
                    }
                }
            }
            Kind::Resource(_) if !disabled => callback(resource)?,
            // Outputs and locals surfaced their value during decode;
            // disabled resources are skipped.
            _ => {}
        }
        Ok(())
    }
}

struct WalkState {
    in_degree: Vec<usize>,
    poisoned: Vec<bool>,
}

struct WalkRun<'a> {
    walker: &'a Walker<'a>,
    graph: &'a Graph,
    callback: &'a NodeCallback<'a>,
    state: Mutex<WalkState>,
    diags: Mutex<Diagnostics>,
}

impl WalkRun<'_> {
    /// Record a node reaching a terminal state and release or poison
    /// its dependents
    fn complete<'scope>(&'scope self, node: usize, ok: bool, scope: &rayon::Scope<'scope>) {
        let ready: Vec<(usize, bool)> = {
            let mut state = self
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let mut ready = Vec::new();
            for &dependent in self.graph.dependents_of(node) {
                if !ok {
                    state.poisoned[dependent] = true;
                }
                state.in_degree[dependent] -= 1;
                if state.in_degree[dependent] == 0 {
                    ready.push((dependent, state.poisoned[dependent]));
                }
            }
            ready
        };

        for (dependent, poisoned) in ready {
            if poisoned {
                if let Some(resource) = self.graph.resource(dependent) {
                    self.push_diag(Diagnostic::error(
                        read(resource).id(),
                        "not processed: a dependency failed",
                    ));
                }
                // Cascade without scheduling: failed-by-prerequisite
                // nodes are terminal, not skipped.
                self.complete(dependent, false, scope);
            } else {
                scope.spawn(move |scope| self.run_node(dependent, scope));
            }
        }
    }

    fn run_node<'scope>(&'scope self, node: usize, scope: &rayon::Scope<'scope>) {
        let Some(resource) = self.graph.resource(node) else {
            self.complete(node, true, scope);
            return;
        };
        match self.walker.visit(resource, self.callback) {
            Ok(()) => self.complete(node, true, scope),
            Err(e) => {
                let (id, file, line, column) = {
                    let r = read(resource);
                    let m = r.meta();
                    (r.id(), m.file.clone(), m.line, m.column)
                };
                let mut diag = Diagnostic::error(id, e);
                if !file.is_empty() {
                    diag = diag.at(file, line, column);
                }
                self.push_diag(diag);
                self.complete(node, false, scope);
            }
        }
    }

    fn push_diag(&self, diag: Diagnostic) {
        self.diags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diag);
    }
}
