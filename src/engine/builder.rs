//! Dependency graph builder
//!
//! Turns discovered links, explicit `depends_on` declarations, and
//! module containment into a DAG: one node per non-variable resource
//! plus a synthetic root, edges pointing from dependency to dependent.
//! The graph is an explicit adjacency list with in-degree counts; the
//! walker consumes it as a countdown schedule.

use crate::errors::{Error, Result};
use crate::fqrn::Kind;
use crate::resource::{SharedResource, read, write};
use crate::store::Config;
use std::collections::{HashMap, HashSet};

/// Index of the synthetic root node
pub const ROOT: usize = 0;

/// An acyclic dependency graph over a resource set
#[derive(Debug)]
pub struct Graph {
    /// Node 0 is the synthetic root and carries no resource
    nodes: Vec<Option<SharedResource>>,
    /// Edges dependency -> dependent
    dependents: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl Graph {
    /// Number of nodes including the root
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn resource(&self, index: usize) -> Option<&SharedResource> {
        self.nodes.get(index).and_then(Option::as_ref)
    }

    pub(crate) fn dependents_of(&self, index: usize) -> &[usize] {
        &self.dependents[index]
    }

    pub(crate) fn in_degrees(&self) -> Vec<usize> {
        self.in_degree.clone()
    }
}

/// Build the dependency graph for a scanned resource set
///
/// Fails with a structural error before any lifecycle operation can
/// run: unresolved references carry the declaring resource's source
/// position, cycles name every resource still on the cycle.
pub fn build(config: &Config) -> Result<Graph> {
    propagate_disabled(config);

    // Variables are resolved into the evaluation context before the
    // walk; they are not graph nodes.
    let mut nodes: Vec<Option<SharedResource>> = vec![None];
    let mut index: HashMap<String, usize> = HashMap::new();
    for resource in config.iter() {
        let r = read(resource);
        if r.meta().kind == Kind::Variable {
            continue;
        }
        index.insert(r.id(), nodes.len());
        drop(r);
        nodes.push(Some(resource.clone()));
    }

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut in_degree = vec![0usize; nodes.len()];
    let mut edges: HashSet<(usize, usize)> = HashSet::new();
    let mut add_edge = |from: usize,
                        to: usize,
                        dependents: &mut Vec<Vec<usize>>,
                        in_degree: &mut Vec<usize>| {
        if edges.insert((from, to)) {
            dependents[from].push(to);
            in_degree[to] += 1;
        }
    };

    for (node, resource) in nodes.iter().enumerate().skip(1) {
        let Some(resource) = resource else { continue };
        let (module, disabled, depends_on, links, position) = {
            let r = read(resource);
            let m = r.meta();
            (
                m.module.clone(),
                m.disabled,
                m.depends_on.clone(),
                m.links.clone(),
                (m.file.clone(), m.line, m.column),
            )
        };

        // Disabled resources bypass their natural dependencies: nothing
        // they depend on needs to exist for them to be skipped.
        if disabled {
            add_edge(ROOT, node, &mut dependents, &mut in_degree);
            continue;
        }

        let mut candidates = depends_on;
        for link in links {
            if !candidates.contains(&link) {
                candidates.push(link);
            }
        }

        for candidate in &candidates {
            let target = config.find_relative(candidate, &module).map_err(|_| {
                Error::UnresolvedReference {
                    reference: candidate.clone(),
                    file: position.0.clone(),
                    line: position.1,
                    column: position.2,
                }
            })?;
            let (target_id, target_kind, target_path) = {
                let t = read(&target);
                (t.id(), t.meta().kind.clone(), t.declared_module_path())
            };
            match target_kind {
                Kind::Variable => {}
                Kind::Module => {
                    // Depending on a module means depending on every
                    // resource transitively contained in it.
                    if let Some(&from) = index.get(&target_id) {
                        add_edge(from, node, &mut dependents, &mut in_degree);
                    }
                    for contained in config.find_contained(&target_path, true) {
                        if let Some(&from) = index.get(&read(&contained).id()) {
                            add_edge(from, node, &mut dependents, &mut in_degree);
                        }
                    }
                }
                _ => {
                    if let Some(&from) = index.get(&target_id) {
                        add_edge(from, node, &mut dependents, &mut in_degree);
                    }
                }
            }
        }

        // A resource nested in a module waits for the nearest declared
        // module node, so module-level inputs are in scope before it
        // decodes.
        if !module.is_empty()
            && let Some(module_node) = find_enclosing_module(config, &module)
            && let Some(&from) = index.get(&read(&module_node).id())
        {
            add_edge(from, node, &mut dependents, &mut in_degree);
        }

        if in_degree[node] == 0 {
            add_edge(ROOT, node, &mut dependents, &mut in_degree);
        }
    }

    let graph = Graph {
        nodes,
        dependents,
        in_degree,
    };
    detect_cycle(&graph)?;
    Ok(graph)
}

/// Set `disabled` on every resource transitively contained in a
/// disabled module
fn propagate_disabled(config: &Config) {
    let disabled_modules: Vec<String> = config
        .iter()
        .filter(|r| {
            let r = read(r);
            r.meta().kind == Kind::Module && r.meta().disabled
        })
        .map(|r| read(r).declared_module_path())
        .collect();

    for path in disabled_modules {
        for contained in config.find_contained(&path, true) {
            write(&contained).meta_mut().disabled = true;
        }
    }
}

/// The module resource declaring `path`, or the nearest ancestor
/// module resource when `path` itself has no declaring node
fn find_enclosing_module(config: &Config, path: &str) -> Option<SharedResource> {
    let parts: Vec<&str> = path.split('.').filter(|p| !p.is_empty()).collect();
    for len in (1..=parts.len()).rev() {
        let candidate = parts[..len].join(".");
        let found = config
            .iter()
            .find(|r| {
                let r = read(r);
                r.meta().kind == Kind::Module && r.declared_module_path() == candidate
            })
            .cloned();
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Kahn's algorithm: if the countdown cannot drain every node, the
/// remainder sits on at least one cycle
fn detect_cycle(graph: &Graph) -> Result<()> {
    let mut in_degree = graph.in_degrees();
    let mut queue: Vec<usize> = (0..graph.node_count())
        .filter(|&n| in_degree[n] == 0)
        .collect();
    let mut drained = 0;

    while let Some(node) = queue.pop() {
        drained += 1;
        for &dependent in graph.dependents_of(node) {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push(dependent);
            }
        }
    }

    if drained == graph.node_count() {
        return Ok(());
    }

    let mut stuck: Vec<String> = (0..graph.node_count())
        .filter(|&n| in_degree[n] > 0)
        .filter_map(|n| graph.resource(n).map(|r| read(r).id()))
        .collect();
    stuck.sort();
    Err(Error::CircularReference(stuck.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Body, Expr};
    use crate::resource::Resource;
    use crate::scanner::scan_all;

    fn node_for(graph: &Graph, id: &str) -> usize {
        (1..graph.node_count())
            .find(|&n| graph.resource(n).is_some_and(|r| read(r).id() == id))
            .unwrap()
    }

    fn has_edge(graph: &Graph, from: usize, to: usize) -> bool {
        graph.dependents_of(from).contains(&to)
    }

    #[test]
    fn test_orphans_connect_to_root() {
        let mut config = Config::new();
        config.append(Resource::resource("network", "cloud")).unwrap();
        let graph = build(&config).unwrap();
        let n = node_for(&graph, "resource.network.cloud");
        assert!(has_edge(&graph, ROOT, n));
    }

    #[test]
    fn test_depends_on_and_links_union() {
        let mut config = Config::new();
        config.append(Resource::resource("network", "cloud")).unwrap();
        config.append(Resource::resource("volume", "data")).unwrap();
        config
            .append(
                Resource::resource("container", "app")
                    .with_depends_on(["resource.network.cloud"])
                    .with_body(
                        Body::new().attr("mount", Expr::reference("resource.volume.data.id")),
                    ),
            )
            .unwrap();
        scan_all(&config).unwrap();

        let graph = build(&config).unwrap();
        let app = node_for(&graph, "resource.container.app");
        assert!(has_edge(&graph, node_for(&graph, "resource.network.cloud"), app));
        assert!(has_edge(&graph, node_for(&graph, "resource.volume.data"), app));
        assert!(!has_edge(&graph, ROOT, app));
    }

    #[test]
    fn test_module_dependency_expands_to_contained_resources() {
        let mut config = Config::new();
        config
            .append(Resource::new(Kind::Module, "infra"))
            .unwrap();
        config
            .append(Resource::resource("network", "cloud").in_module("infra"))
            .unwrap();
        config
            .append(Resource::resource("network", "inner").in_module("infra.sub"))
            .unwrap();
        config
            .append(Resource::resource("container", "app").with_depends_on(["module.infra"]))
            .unwrap();

        let graph = build(&config).unwrap();
        let app = node_for(&graph, "resource.container.app");
        assert!(has_edge(&graph, node_for(&graph, "module.infra"), app));
        assert!(has_edge(&graph, node_for(&graph, "module.infra.resource.network.cloud"), app));
        assert!(has_edge(&graph, node_for(&graph, "module.infra.sub.resource.network.inner"), app));
    }

    #[test]
    fn test_module_containment_edge() {
        let mut config = Config::new();
        config.append(Resource::new(Kind::Module, "infra")).unwrap();
        config
            .append(Resource::resource("network", "cloud").in_module("infra"))
            .unwrap();

        let graph = build(&config).unwrap();
        assert!(has_edge(
            &graph,
            node_for(&graph, "module.infra"),
            node_for(&graph, "module.infra.resource.network.cloud")
        ));
    }

    #[test]
    fn test_disabled_module_cascades_and_bypasses_dependencies() {
        let mut config = Config::new();
        config.append(Resource::resource("network", "cloud")).unwrap();
        config
            .append(Resource::new(Kind::Module, "infra").disabled())
            .unwrap();
        config
            .append(
                Resource::resource("container", "app")
                    .in_module("infra")
                    .with_depends_on(["resource.network.cloud"]),
            )
            .unwrap();
        config
            .append(Resource::resource("container", "deep").in_module("infra.sub"))
            .unwrap();

        let graph = build(&config).unwrap();
        let app = node_for(&graph, "module.infra.resource.container.app");
        let deep = node_for(&graph, "module.infra.sub.resource.container.deep");

        for resource in config.find_contained("infra", true) {
            assert!(read(&resource).meta().disabled);
        }
        // Disabled resources connect only to root.
        assert!(has_edge(&graph, ROOT, app));
        assert!(!has_edge(&graph, node_for(&graph, "resource.network.cloud"), app));
        assert!(has_edge(&graph, ROOT, deep));
    }

    #[test]
    fn test_unresolved_reference_carries_position() {
        let mut config = Config::new();
        config
            .append(
                Resource::resource("container", "app")
                    .with_depends_on(["resource.network.missing"])
                    .at("main.hcl", 12, 3),
            )
            .unwrap();

        let err = build(&config).unwrap_err();
        match err {
            Error::UnresolvedReference { file, line, column, .. } => {
                assert_eq!(file, "main.hcl");
                assert_eq!((line, column), (12, 3));
            }
            other => panic!("expected UnresolvedReference, got {other}"),
        }
    }

    #[test]
    fn test_cycle_detected() {
        let mut config = Config::new();
        config
            .append(
                Resource::resource("container", "a").with_depends_on(["resource.container.b"]),
            )
            .unwrap();
        config
            .append(
                Resource::resource("container", "b").with_depends_on(["resource.container.c"]),
            )
            .unwrap();
        config
            .append(
                Resource::resource("container", "c").with_depends_on(["resource.container.a"]),
            )
            .unwrap();

        let err = build(&config).unwrap_err();
        assert!(matches!(err, Error::CircularReference(_)));
        assert!(err.to_string().contains("resource.container.a"));
    }

    #[test]
    fn test_variables_are_not_nodes() {
        let mut config = Config::new();
        config.append(Resource::new(Kind::Variable, "region")).unwrap();
        config.append(Resource::resource("network", "cloud")).unwrap();
        let graph = build(&config).unwrap();
        // Root plus the network only.
        assert_eq!(graph.node_count(), 2);
    }
}
