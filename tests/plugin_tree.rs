//! End-to-end replay of a branching plugin tree.
//!
//! ```text
//!   R o o t       OtherRoot
//!     /|\             |
//!    / | \            |
//!   A  B  C       OtherSub
//!   | /|
//!   |/ |
//!   D  E
//!   |
//!   F
//! ```

use serde_json::{json, Value};
use std::sync::Arc;
use strata::plugin::{Call, Registry, TypeHandle, TypeSpec};

struct Tree {
    root: TypeHandle,
    other_root: TypeHandle,
    other_sub: TypeHandle,
    c: TypeHandle,
    e: TypeHandle,
    f: TypeHandle,
}

fn build(registry: &Registry) -> Tree {
    let root = registry
        .declare(TypeSpec::root("Root").with_method("describe", |_, _| Ok(json!(["Root"]))))
        .unwrap();
    assert_eq!(registry.frontier_names(&root).unwrap(), vec!["Root"]);

    let other_root = registry.declare(TypeSpec::root("OtherRoot")).unwrap();
    assert_eq!(registry.frontier_names(&root).unwrap(), vec!["Root"]);
    assert_eq!(registry.frontier_names(&other_root).unwrap(), vec!["OtherRoot"]);

    let other_sub = registry
        .declare(TypeSpec::new("OtherSub").with_base(&other_root))
        .unwrap();
    assert_eq!(registry.frontier_names(&other_sub).unwrap(), vec!["OtherSub"]);

    // Each plugin prepends its own name and defers to the rest of the chain.
    let describe = |call: &Call, args: Value| -> strata::Result<Value> {
        let mut rest = call.next(args)?;
        if let Some(list) = rest.as_array_mut() {
            list.insert(0, json!(call.owner().name()));
        }
        Ok(rest)
    };

    let a = registry
        .declare(TypeSpec::new("A").with_base(&root).with_method("describe", describe))
        .unwrap();
    let b = registry
        .declare(TypeSpec::new("B").with_base(&root).with_method("describe", describe))
        .unwrap();
    let c = registry
        .declare(TypeSpec::new("C").with_base(&root).with_method("describe", describe))
        .unwrap();
    assert_eq!(registry.frontier_names(&c).unwrap(), vec!["A", "B", "C"]);

    let d = registry.declare(TypeSpec::new("D").with_bases([&a, &b])).unwrap();
    assert_eq!(registry.frontier_names(&d).unwrap(), vec!["C", "D"]);

    let e = registry
        .declare(TypeSpec::new("E").with_base(&b).with_method("describe", describe))
        .unwrap();
    assert_eq!(registry.frontier_names(&e).unwrap(), vec!["C", "D", "E"]);

    let f = registry.declare(TypeSpec::new("F").with_base(&d)).unwrap();
    assert_eq!(registry.frontier_names(&f).unwrap(), vec!["C", "E", "F"]);

    Tree {
        root,
        other_root,
        other_sub,
        c,
        e,
        f,
    }
}

#[test]
fn composite_covers_frontier_and_is_cached() {
    let registry = Registry::new();
    let tree = build(&registry);

    let xt = registry.get_extended(&tree.root).unwrap();
    assert_eq!(xt.name(), "RootPluginExtended");
    let mut bases: Vec<&str> = xt.bases().iter().map(TypeHandle::name).collect();
    bases.sort();
    assert_eq!(bases, vec!["C", "E", "F"]);

    let again = registry.get_extended(&tree.root).unwrap();
    assert!(Arc::ptr_eq(&xt, &again));
}

#[test]
fn entry_points_share_cache_until_next_declaration() {
    let registry = Registry::new();
    let tree = build(&registry);

    let xt = tree.f.plugin_extended().unwrap();
    let xt2 = tree.e.plugin_extended().unwrap();
    assert!(Arc::ptr_eq(&xt, &xt2));

    registry.declare(TypeSpec::new("ETC").with_base(&tree.f)).unwrap();
    let xt3 = tree.e.plugin_extended().unwrap();
    assert!(!Arc::ptr_eq(&xt3, &xt2));
    assert_eq!(registry.frontier_names(&tree.c).unwrap(), vec!["C", "E", "ETC"]);
}

#[test]
fn other_root_is_untouched() {
    let registry = Registry::new();
    let tree = build(&registry);

    let other = registry.get_extended(&tree.other_root).unwrap();
    registry.get_extended(&tree.root).unwrap();
    registry.declare(TypeSpec::new("G").with_base(&tree.c)).unwrap();

    assert!(registry.is_cache_valid(&tree.other_sub).unwrap());
    assert_eq!(registry.frontier_names(&tree.other_root).unwrap(), vec!["OtherSub"]);
    assert!(Arc::ptr_eq(&other, &registry.get_extended(&tree.other_sub).unwrap()));
}

#[test]
fn composite_runs_every_branch() {
    let registry = Registry::new();
    let tree = build(&registry);

    let xt = registry.get_extended(&tree.root).unwrap();
    let described = xt.invoke("describe", Value::Null).unwrap();
    let names: Vec<&str> = described
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();

    // Every branch contributes once and the root answers last.
    let mut plugins = names[..names.len() - 1].to_vec();
    plugins.sort();
    assert_eq!(plugins, vec!["A", "B", "C", "E"]);
    assert_eq!(names.last(), Some(&"Root"));

    // A linearization keeps each type ahead of its ancestors.
    let pos = |n: &str| names.iter().position(|x| *x == n).unwrap();
    assert!(pos("E") < pos("B"));
    assert!(pos("A") < pos("B"));
}

#[test]
fn snapshot_reports_tree() {
    let registry = Registry::new();
    let tree = build(&registry);
    registry.get_extended(&tree.root).unwrap();

    let snapshot = registry.snapshot().unwrap();
    let root = snapshot.root("Root").unwrap();
    assert_eq!(root.frontier, vec!["C", "E", "F"]);
    assert!(root.cache_valid);
    assert!(!snapshot.root("OtherRoot").unwrap().cache_valid);
}
