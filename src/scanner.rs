//! Reference scanner
//!
//! Walks a resource's raw body and collects every expression rooted at
//! `resource`, `module`, `local`, or `output` into a candidate
//! reference string, index suffixes included. The de-duplicated set is
//! stored on the resource as its links, feeding the dependency graph
//! builder alongside explicit `depends_on` declarations.

use crate::errors::{Error, Result};
use crate::expr::{Body, Expr, TemplatePart};
use crate::resource::{SharedResource, read, write};
use crate::store::Config;

const REFERENCE_ROOTS: [&str; 4] = ["resource.", "module.", "local.", "output."];

/// Scan every resource in the store, in append order
///
/// Order matters: the self-cycle guard inspects links recorded on
/// earlier resources.
pub fn scan_all(config: &Config) -> Result<()> {
    for resource in config.iter() {
        scan(config, resource)?;
    }
    Ok(())
}

/// Discover and record the links of a single resource
///
/// Fails fast with [`Error::CircularReference`] if a just-discovered
/// dependency's own links already point straight back at this
/// resource. Longer cycles surface from the graph builder.
pub fn scan(config: &Config, resource: &SharedResource) -> Result<()> {
    let (body, module, id) = {
        let r = read(resource);
        (r.body.clone(), r.meta().module.clone(), r.id())
    };

    let mut found = Vec::new();
    collect_body(&body, "", &mut found);

    let mut links = Vec::new();
    for reference in found {
        if !links.contains(&reference) {
            links.push(reference);
        }
    }

    for link in &links {
        let Ok(target) = config.find_relative(link, &module) else {
            // Unresolved references are reported by the graph builder
            // with full source position.
            continue;
        };
        let (target_links, target_module, target_id) = {
            let t = read(&target);
            (t.meta().links.clone(), t.meta().module.clone(), t.id())
        };
        for back in &target_links {
            let points_back = config
                .find_relative(back, &target_module)
                .is_ok_and(|r| read(&r).id() == id);
            if points_back {
                return Err(Error::CircularReference(format!(
                    "'{id}' and '{target_id}' depend on each other"
                )));
            }
        }
    }

    write(resource).meta_mut().links = links;
    Ok(())
}

fn collect_body(body: &Body, path: &str, found: &mut Vec<String>) {
    for (name, expr) in &body.attributes {
        log::trace!("scanning attribute {path}{name}");
        collect_expr(expr, found);
    }
    // Nested blocks carry a synthetic positional path so references to
    // index-qualified sub-blocks stay distinguishable.
    for (index, block) in body.blocks.iter().enumerate() {
        let block_path = format!("{path}{}[{index}].", block.kind);
        collect_body(&block.body, &block_path, found);
    }
}

fn collect_expr(expr: &Expr, found: &mut Vec<String>) {
    match expr {
        Expr::Literal(_) => {}
        Expr::Reference(path) => push_reference(path, found),
        Expr::Template(parts) => {
            for part in parts {
                if let TemplatePart::Interp(path) = part {
                    push_reference(path, found);
                }
            }
        }
        Expr::FuncCall { args, .. } => {
            for arg in args {
                collect_expr(arg, found);
            }
        }
        Expr::Conditional {
            cond,
            then,
            otherwise,
        } => {
            collect_expr(cond, found);
            collect_expr(then, found);
            collect_expr(otherwise, found);
        }
        Expr::Binary { lhs, rhs, .. } => {
            collect_expr(lhs, found);
            collect_expr(rhs, found);
        }
        Expr::Object(entries) => {
            for (_, value) in entries {
                collect_expr(value, found);
            }
        }
        Expr::Tuple(items) => {
            for item in items {
                collect_expr(item, found);
            }
        }
        Expr::Splat { source, .. } => collect_expr(source, found),
    }
}

fn push_reference(path: &str, found: &mut Vec<String>) {
    if REFERENCE_ROOTS.iter().any(|root| path.starts_with(root)) {
        found.push(path.to_string());
    }
}
