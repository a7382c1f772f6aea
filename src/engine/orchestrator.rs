//! Lifecycle orchestrator
//!
//! Diffs the freshly parsed resource set against the previously
//! persisted set and drives create/refresh/update/destroy through the
//! provider resolved for each resource type. Classification per ID:
//! new-only resources are created, resources present in both sets are
//! refreshed then updated when changed, previous-only resources become
//! destroy candidates. A destroy candidate still referenced by a
//! surviving resource is rejected before any provider call.
//!
//! Status discipline: every resource's status is persisted after every
//! run regardless of outcome, so a failed create is retried next run
//! and a resource that left the configuration while `created` stays
//! eligible for destroy.

use crate::context::EvalContext;
use crate::engine::builder;
use crate::engine::walker::Walker;
use crate::errors::{Diagnostic, Diagnostics, Error, Result};
use crate::events::{EventSink, NoopSink, Operation, ParserEvent, Phase};
use crate::expr::FuncDispatch;
use crate::fqrn::{Fqrn, Kind};
use crate::provider::ProviderRegistry;
use crate::resource::{SharedResource, read, write};
use crate::state::{PersistedResource, State};
use crate::store::Config;
use crate::types::{ApplySummary, OpContext, Status, WalkOptions};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Drives a resource set through its lifecycle against providers
pub struct Orchestrator {
    providers: ProviderRegistry,
    state: Box<dyn State>,
    events: Arc<dyn EventSink>,
    options: WalkOptions,
    force_destroy: bool,
}

impl Orchestrator {
    pub fn new(providers: ProviderRegistry, state: Box<dyn State>) -> Self {
        Self {
            providers,
            state,
            events: Arc::new(NoopSink),
            options: WalkOptions::default(),
            force_destroy: false,
        }
    }

    /// Attach an observability sink, builder style
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    /// Skip graceful teardown on destroy
    pub fn with_force_destroy(mut self, force: bool) -> Self {
        self.force_destroy = force;
        self
    }

    /// Reconcile the resource set: destroy what left the configuration,
    /// then walk the graph creating and updating what remains
    pub fn apply(&self, config: &Config) -> std::result::Result<ApplySummary, Diagnostics> {
        self.apply_with_functions(config, None)
    }

    /// Like [`apply`](Self::apply), with a dispatcher for function-call
    /// expressions in resource bodies
    pub fn apply_with_functions(
        &self,
        config: &Config,
        funcs: Option<&FuncDispatch>,
    ) -> std::result::Result<ApplySummary, Diagnostics> {
        let mut diags = Diagnostics::new();
        let mut summary = ApplySummary::default();

        // Load failure is infrastructure, not structural: fall back to
        // an empty previous state and keep going.
        let previous: Vec<PersistedResource> = match self.state.load() {
            Ok(Some(resources)) => resources,
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("failed to load previous state, assuming empty: {e}");
                diags.push(Diagnostic::warning(
                    "state",
                    format!("previous state unreadable, assuming empty: {e}"),
                ));
                Vec::new()
            }
        };
        let mut stored: HashMap<String, PersistedResource> =
            previous.into_iter().map(|p| (p.id.clone(), p)).collect();

        let new_ids: Vec<String> = config
            .iter()
            .filter(|r| matches!(read(r).meta().kind, Kind::Resource(_)))
            .map(|r| read(r).id())
            .collect();

        // Destroy before the walk so a recreated name never collides
        // with a stale remote object.
        let candidates: Vec<String> = stored
            .keys()
            .filter(|id| !new_ids.iter().any(|n| n == *id))
            .cloned()
            .collect();
        for id in candidates {
            match self.destroy_candidate(config, &stored[&id]) {
                Ok(()) => {
                    stored.remove(&id);
                    summary.destroyed += 1;
                }
                Err(e) => {
                    summary.failed += 1;
                    diags.push(Diagnostic::error(id, e));
                }
            }
        }

        // Structural failures surface before any create or update.
        let graph = match builder::build(config) {
            Ok(graph) => graph,
            Err(e) => {
                diags.push(Diagnostic::error("configuration", e));
                self.persist(config, &stored, &mut diags);
                return Err(diags);
            }
        };

        let ctx = EvalContext::root();
        let shared_summary = Mutex::new(ApplySummary::default());
        let stored_view = &stored;
        let walker = Walker::new(config, &ctx).with_options(self.options.clone());
        let walker = match funcs {
            Some(f) => walker.with_functions(f),
            None => walker,
        };
        let walk_result = walker.walk(&graph, &|resource| {
            let outcome = self.converge(resource, stored_view);
            let mut summary = shared_summary
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match outcome {
                Ok(changed) => {
                    match changed {
                        Converged::Created => summary.created += 1,
                        Converged::Updated => summary.updated += 1,
                        Converged::Unchanged => summary.unchanged += 1,
                    }
                    Ok(())
                }
                Err(e) => {
                    summary.failed += 1;
                    Err(e)
                }
            }
        });

        summary.merge(
            &shared_summary
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
        );
        if let Err(walk_diags) = walk_result {
            diags.extend(walk_diags);
        }

        self.persist(config, &stored, &mut diags);

        if diags.has_errors() {
            Err(diags)
        } else {
            Ok(summary)
        }
    }

    /// Validate and destroy one candidate that left the configuration
    fn destroy_candidate(&self, config: &Config, candidate: &PersistedResource) -> Result<()> {
        // Reject while any surviving resource still references the
        // candidate, before any provider call.
        for survivor in config.iter() {
            let (id, module, mut refs) = {
                let r = read(survivor);
                let m = r.meta();
                let mut refs = m.depends_on.clone();
                refs.extend(m.links.clone());
                (r.id(), m.module.clone(), refs)
            };
            refs.retain(|reference| references_id(reference, &module, &candidate.id));
            if !refs.is_empty() {
                return Err(Error::DependencyViolation {
                    resource: candidate.id.clone(),
                    referrer: id,
                });
            }
        }

        let provider = self.providers.resolve_named(
            candidate.fields.get("provider").and_then(Value::as_str),
            &candidate.type_name,
        )?;
        let data = candidate.to_bytes()?;
        self.dispatch(Operation::Destroy, candidate, |op_ctx| {
            provider.destroy(&data, self.force_destroy, op_ctx)
        })
        .map_err(|source| Error::Lifecycle {
            operation: "destroy".into(),
            resource: candidate.id.clone(),
            source,
        })
    }

    /// Create, or refresh-then-update, one decoded resource
    fn converge(
        &self,
        resource: &SharedResource,
        stored: &HashMap<String, PersistedResource>,
    ) -> Result<Converged> {
        let snapshot = PersistedResource::from_resource(&read(resource));
        let provider = self.providers.resolve(&read(resource))?;
        let new_data = snapshot.to_bytes()?;

        // Only a previously successful create takes the refresh path;
        // anything else is retried as a create.
        let prior = stored
            .get(&snapshot.id)
            .filter(|p| p.status == Status::Created);

        let lifecycle = |operation: &str, source: anyhow::Error| Error::Lifecycle {
            operation: operation.into(),
            resource: snapshot.id.clone(),
            source,
        };

        let outcome = if let Some(prior) = prior {
            let prior_data = prior.to_bytes()?;
            let refreshed = self
                .dispatch(Operation::Refresh, &snapshot, |op_ctx| {
                    provider.refresh(&prior_data, op_ctx)
                })
                .map_err(|e| self.fail(resource, lifecycle("refresh", e)))?;
            let changed = self
                .dispatch(Operation::Changed, &snapshot, |_| {
                    provider.changed(&refreshed, &new_data)
                })
                .map_err(|e| self.fail(resource, lifecycle("changed", e)))?;
            if changed {
                let updated = self
                    .dispatch(Operation::Update, &snapshot, |op_ctx| {
                        provider.update(&new_data, op_ctx)
                    })
                    .map_err(|e| self.fail(resource, lifecycle("update", e)))?;
                absorb(resource, &updated);
                Converged::Updated
            } else {
                Converged::Unchanged
            }
        } else {
            let created = self
                .dispatch(Operation::Create, &snapshot, |op_ctx| {
                    provider.validate(&new_data, op_ctx)?;
                    provider.create(&new_data, op_ctx)
                })
                .map_err(|e| self.fail(resource, lifecycle("create", e)))?;
            absorb(resource, &created);
            Converged::Created
        };

        write(resource).meta_mut().status = Status::Created;
        Ok(outcome)
    }

    /// Mark a resource failed and pass the error through
    fn fail(&self, resource: &SharedResource, error: Error) -> Error {
        write(resource).meta_mut().status = Status::Failed;
        error
    }

    /// Run one provider operation bracketed by start/success/error
    /// events carrying the elapsed time
    fn dispatch<T>(
        &self,
        operation: Operation,
        snapshot: &PersistedResource,
        op: impl FnOnce(&OpContext) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        self.events.emit(ParserEvent {
            operation,
            resource_type: snapshot.type_name.clone(),
            resource_id: snapshot.id.clone(),
            phase: Phase::Start,
            duration: Duration::ZERO,
            error: None,
            data: Some(Value::Object(snapshot.fields.clone())),
        });
        let started = Instant::now();
        let result = op(&OpContext::new());
        let duration = started.elapsed();
        self.events.emit(ParserEvent {
            operation,
            resource_type: snapshot.type_name.clone(),
            resource_id: snapshot.id.clone(),
            phase: if result.is_ok() {
                Phase::Success
            } else {
                Phase::Error
            },
            duration,
            error: result.as_ref().err().map(ToString::to_string),
            data: None,
        });
        result
    }

    /// Persist the final resource set, regardless of run outcome
    ///
    /// Resources never reached this run keep their prior stored entry;
    /// everything processed is stored with its freshly parsed
    /// definition and final status.
    fn persist(
        &self,
        config: &Config,
        retained: &HashMap<String, PersistedResource>,
        diags: &mut Diagnostics,
    ) {
        let mut out: Vec<PersistedResource> = Vec::new();
        for resource in config.iter() {
            let r = read(resource);
            if !matches!(r.meta().kind, Kind::Resource(_)) {
                continue;
            }
            let snapshot = PersistedResource::from_resource(&r);
            if snapshot.status == Status::Pending
                && let Some(prior) = retained.get(&snapshot.id)
            {
                // Unresolved this run: keep the prior definition and
                // status rather than regressing it to pending.
                out.push(prior.clone());
            } else {
                out.push(snapshot);
            }
        }
        // Entries that failed or were vetoed out of destroy stay put
        // for the next run.
        let kept_ids: Vec<String> = out.iter().map(|p| p.id.clone()).collect();
        for (id, prior) in retained {
            if !kept_ids.contains(id) {
                out.push(prior.clone());
            }
        }

        if let Err(e) = self.state.save(&out) {
            log::warn!("failed to persist state: {e}");
            diags.push(Diagnostic::warning(
                "state",
                format!("failed to persist state: {e}"),
            ));
        }
    }
}

enum Converged {
    Created,
    Updated,
    Unchanged,
}

/// Fold provider-returned serialized data back into the live resource
fn absorb(resource: &SharedResource, data: &[u8]) {
    // Providers may return anything; only a well-formed persisted
    // document updates the fields.
    if let Ok(returned) = serde_json::from_slice::<PersistedResource>(data) {
        write(resource).fields = returned.fields;
    }
}

/// Whether `reference`, authored inside `from_module`, can address
/// `candidate_id` under relative resolution
fn references_id(reference: &str, from_module: &str, candidate_id: &str) -> bool {
    let Ok(parsed) = Fqrn::parse(reference) else {
        return false;
    };
    let mut prefixes: Vec<String> = Vec::new();
    let parts: Vec<&str> = from_module.split('.').filter(|p| !p.is_empty()).collect();
    for len in (1..=parts.len()).rev() {
        prefixes.push(parts[..len].join("."));
    }
    prefixes.push(String::new());

    prefixes.iter().any(|prefix| {
        let mut candidate = parsed.clone();
        if !prefix.is_empty() {
            candidate.append_parent_module(prefix);
        }
        candidate.to_string_without_attribute() == candidate_id
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::test_support::RecordingSink;
    use crate::expr::{Body, Expr};
    use crate::provider::Provider;
    use crate::resource::Resource;
    use crate::state::MemoryState;
    use serde_json::{Map, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that records operation counts and can fail on demand
    #[derive(Default)]
    struct TestProvider {
        creates: AtomicUsize,
        destroys: AtomicUsize,
        refreshes: AtomicUsize,
        updates: AtomicUsize,
        fail_create: bool,
        fail_destroy: bool,
        report_changed: bool,
    }

    impl Provider for TestProvider {
        fn validate(&self, _data: &[u8], _ctx: &OpContext) -> anyhow::Result<()> {
            Ok(())
        }
        fn create(&self, data: &[u8], _ctx: &OpContext) -> anyhow::Result<Vec<u8>> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            if self.fail_create {
                anyhow::bail!("create refused");
            }
            Ok(data.to_vec())
        }
        fn destroy(&self, _data: &[u8], _force: bool, _ctx: &OpContext) -> anyhow::Result<()> {
            self.destroys.fetch_add(1, Ordering::SeqCst);
            if self.fail_destroy {
                anyhow::bail!("destroy refused");
            }
            Ok(())
        }
        fn refresh(&self, data: &[u8], _ctx: &OpContext) -> anyhow::Result<Vec<u8>> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(data.to_vec())
        }
        fn update(&self, data: &[u8], _ctx: &OpContext) -> anyhow::Result<Vec<u8>> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            Ok(data.to_vec())
        }
        fn changed(&self, _old: &[u8], _new: &[u8]) -> anyhow::Result<bool> {
            Ok(self.report_changed)
        }
    }

    fn persisted(id: &str, type_name: &str, name: &str) -> PersistedResource {
        PersistedResource {
            id: id.to_string(),
            type_name: type_name.to_string(),
            name: name.to_string(),
            module: String::new(),
            status: Status::Created,
            depends_on: Vec::new(),
            links: Vec::new(),
            fields: Map::new(),
        }
    }

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn registry(provider: &Arc<TestProvider>) -> ProviderRegistry {
        ProviderRegistry::new()
            .with("container", provider.clone() as Arc<dyn Provider>)
            .with("network", provider.clone() as Arc<dyn Provider>)
    }

    #[test]
    fn test_fresh_config_creates_everything() {
        init_logs();
        let mut config = Config::new();
        config.append(Resource::resource("network", "cloud")).unwrap();
        config
            .append(
                Resource::resource("container", "app")
                    .with_depends_on(["resource.network.cloud"]),
            )
            .unwrap();

        let provider = Arc::new(TestProvider::default());
        let state = Box::new(MemoryState::new());
        let orchestrator = Orchestrator::new(registry(&provider), state);

        let summary = orchestrator.apply(&config).unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(provider.creates.load(Ordering::SeqCst), 2);

        for resource in config.iter() {
            assert_eq!(read(resource).meta().status, Status::Created);
        }
    }

    #[test]
    fn test_removed_resource_is_destroyed_exactly_once() {
        // Previous state {A, B}, new config {A}: one destroy for B.
        let mut config = Config::new();
        config.append(Resource::resource("network", "a")).unwrap();

        let provider = Arc::new(TestProvider::default());
        let state = MemoryState::with_resources(vec![
            persisted("resource.network.a", "network", "a"),
            persisted("resource.network.b", "network", "b"),
        ]);
        let orchestrator = Orchestrator::new(registry(&provider), Box::new(state));

        let summary = orchestrator.apply(&config).unwrap();
        assert_eq!(summary.destroyed, 1);
        assert_eq!(provider.destroys.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_destroy_vetoed_while_still_referenced() {
        let mut config = Config::new();
        config
            .append(
                Resource::resource("container", "app")
                    .with_depends_on(["resource.network.b"]),
            )
            .unwrap();

        let provider = Arc::new(TestProvider::default());
        let state = MemoryState::with_resources(vec![persisted(
            "resource.network.b",
            "network",
            "b",
        )]);
        let orchestrator = Orchestrator::new(registry(&provider), Box::new(state));

        let err = orchestrator.apply(&config).unwrap_err();
        // Rejected before any provider call.
        assert_eq!(provider.destroys.load(Ordering::SeqCst), 0);
        assert!(err.iter().any(|d| d.message.contains("cannot be destroyed")));
    }

    #[test]
    fn test_failed_destroy_keeps_entry_for_retry() {
        let config = Config::new();
        let provider = Arc::new(TestProvider {
            fail_destroy: true,
            ..Default::default()
        });
        let state = Arc::new(MemoryState::with_resources(vec![persisted(
            "resource.network.b",
            "network",
            "b",
        )]));
        let orchestrator = Orchestrator::new(
            registry(&provider),
            Box::new(SharedState(state.clone())),
        );

        let err = orchestrator.apply(&config).unwrap_err();
        assert!(err.has_errors());
        let kept = state.snapshot().unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "resource.network.b");
        assert_eq!(kept[0].status, Status::Created);
    }

    #[test]
    fn test_unchanged_resource_is_refreshed_not_updated() {
        let mut config = Config::new();
        config.append(Resource::resource("network", "a")).unwrap();

        let provider = Arc::new(TestProvider::default());
        let state = MemoryState::with_resources(vec![persisted(
            "resource.network.a",
            "network",
            "a",
        )]);
        let orchestrator = Orchestrator::new(registry(&provider), Box::new(state));

        let summary = orchestrator.apply(&config).unwrap();
        assert_eq!(summary.unchanged, 1);
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(provider.updates.load(Ordering::SeqCst), 0);
        assert_eq!(provider.creates.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_changed_resource_is_updated() {
        let mut config = Config::new();
        config.append(Resource::resource("network", "a")).unwrap();

        let provider = Arc::new(TestProvider {
            report_changed: true,
            ..Default::default()
        });
        let state = MemoryState::with_resources(vec![persisted(
            "resource.network.a",
            "network",
            "a",
        )]);
        let orchestrator = Orchestrator::new(registry(&provider), Box::new(state));

        let summary = orchestrator.apply(&config).unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(provider.updates.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_create_is_retried_next_run() {
        let mut config = Config::new();
        config.append(Resource::resource("network", "a")).unwrap();

        let failing = Arc::new(TestProvider {
            fail_create: true,
            ..Default::default()
        });
        let state = Arc::new(MemoryState::new());
        let orchestrator = Orchestrator::new(
            registry(&failing),
            Box::new(SharedState(state.clone())),
        );
        assert!(orchestrator.apply(&config).is_err());
        assert_eq!(state.snapshot().unwrap()[0].status, Status::Failed);

        // Next run takes the create path again, not refresh.
        let mut config = Config::new();
        config.append(Resource::resource("network", "a")).unwrap();
        let provider = Arc::new(TestProvider::default());
        let orchestrator = Orchestrator::new(
            registry(&provider),
            Box::new(SharedState(state.clone())),
        );
        let summary = orchestrator.apply(&config).unwrap();
        assert_eq!(summary.created, 1);
        assert_eq!(provider.refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(state.snapshot().unwrap()[0].status, Status::Created);
    }

    #[test]
    fn test_lifecycle_failure_partitions_the_graph() {
        // bad fails; its dependent is never dispatched; the sibling
        // branch still converges and state reflects what succeeded.
        let mut config = Config::new();
        config.append(Resource::resource("container", "bad")).unwrap();
        config
            .append(
                Resource::resource("container", "child")
                    .with_depends_on(["resource.container.bad"]),
            )
            .unwrap();
        config.append(Resource::resource("network", "ok")).unwrap();

        let container = Arc::new(TestProvider {
            fail_create: true,
            ..Default::default()
        });
        let network = Arc::new(TestProvider::default());
        let providers = ProviderRegistry::new()
            .with("container", container.clone() as Arc<dyn Provider>)
            .with("network", network.clone() as Arc<dyn Provider>);
        let state = Arc::new(MemoryState::new());
        let orchestrator =
            Orchestrator::new(providers, Box::new(SharedState(state.clone())));

        let err = orchestrator.apply(&config).unwrap_err();
        assert!(err.has_errors());
        assert_eq!(network.creates.load(Ordering::SeqCst), 1);
        // The dependent was poisoned, not dispatched.
        assert_eq!(container.creates.load(Ordering::SeqCst), 1);

        let by_id: HashMap<String, Status> = state
            .snapshot()
            .unwrap()
            .into_iter()
            .map(|p| (p.id, p.status))
            .collect();
        assert_eq!(by_id["resource.container.bad"], Status::Failed);
        assert_eq!(by_id["resource.network.ok"], Status::Created);
        assert_eq!(by_id["resource.container.child"], Status::Pending);
    }

    #[test]
    fn test_events_bracket_every_dispatch() {
        let mut config = Config::new();
        config.append(Resource::resource("network", "a")).unwrap();

        let provider = Arc::new(TestProvider::default());
        let sink = Arc::new(RecordingSink::default());
        let orchestrator = Orchestrator::new(registry(&provider), Box::new(MemoryState::new()))
            .with_events(sink.clone());
        orchestrator.apply(&config).unwrap();

        let events = sink.events.lock().unwrap();
        let phases: Vec<(Operation, Phase)> =
            events.iter().map(|e| (e.operation, e.phase)).collect();
        assert_eq!(
            phases,
            vec![
                (Operation::Create, Phase::Start),
                (Operation::Create, Phase::Success),
            ]
        );
        assert_eq!(events[0].resource_id, "resource.network.a");
        assert!(events[1].error.is_none());
    }

    #[test]
    fn test_state_load_failure_is_a_warning_not_fatal() {
        init_logs();
        struct BrokenLoad;
        impl State for BrokenLoad {
            fn load(&self) -> anyhow::Result<Option<Vec<PersistedResource>>> {
                anyhow::bail!("disk on fire")
            }
            fn save(&self, _resources: &[PersistedResource]) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let mut config = Config::new();
        config.append(Resource::resource("network", "a")).unwrap();
        let provider = Arc::new(TestProvider::default());
        let orchestrator = Orchestrator::new(registry(&provider), Box::new(BrokenLoad));

        // Warning severity only: the run still succeeds.
        let summary = orchestrator.apply(&config).unwrap();
        assert_eq!(summary.created, 1);
    }

    #[test]
    fn test_decoded_reference_reaches_provider() {
        let mut config = Config::new();
        config.append(Resource::resource("network", "cloud")).unwrap();
        config
            .append(
                Resource::resource("container", "app").with_body(
                    Body::new().attr("network", Expr::reference("resource.network.cloud.id")),
                ),
            )
            .unwrap();
        crate::scanner::scan_all(&config).unwrap();

        let provider = Arc::new(TestProvider::default());
        let state = Arc::new(MemoryState::new());
        let orchestrator = Orchestrator::new(
            registry(&provider),
            Box::new(SharedState(state.clone())),
        );
        orchestrator.apply(&config).unwrap();

        let saved = state.snapshot().unwrap();
        let app = saved
            .iter()
            .find(|p| p.id == "resource.container.app")
            .unwrap();
        assert_eq!(app.fields["network"], json!("resource.network.cloud"));
    }

    /// State wrapper sharing a MemoryState across orchestrators
    struct SharedState(Arc<MemoryState>);

    impl State for SharedState {
        fn load(&self) -> anyhow::Result<Option<Vec<PersistedResource>>> {
            self.0.load()
        }
        fn save(&self, resources: &[PersistedResource]) -> anyhow::Result<()> {
            self.0.save(resources)
        }
    }
}
