mod common;

use common::Fixture;
use emsdk_core::env::{EnvSnapshot, adjusted_path, compute_environment, required_path};

#[test]
fn path_reconciliation_is_deterministic() {
    let fx = Fixture::new();
    let registry = fx.registry(None);
    let node = registry.find("node-16.20.0-64bit").unwrap();
    let root = fx.ctx.layout.root_str();
    let stale = format!("{root}/node/14.0.0_64bit/bin");
    let env = EnvSnapshot::from_pairs([("PATH", format!("/usr/bin:{stale}:/bin:/usr/bin"))]);

    let required = required_path(&fx.ctx, &[node], &env);
    let first = adjusted_path(&fx.ctx, &required, &env);
    let second = adjusted_path(&fx.ctx, &required, &env);
    assert_eq!(first, second);

    let (path, added) = first;
    let node_bin = format!("{root}/node/16.20.0_64bit/bin");
    assert_eq!(added, vec![root.clone(), node_bin.clone()]);
    assert_eq!(path, format!("{root}:{node_bin}:/usr/bin:/bin"));
}

#[test]
fn leftover_variables_are_unset() {
    let fx = Fixture::new();
    let registry = fx.registry(None);
    let node = registry.find("node-16.20.0-64bit").unwrap();
    let env = EnvSnapshot::from_pairs([
        ("PATH", "/bin"),
        ("EMSDK_PYTHON", "/old/python"),
        ("EM_CACHE", "/old/cache"),
        ("EMSDK_NUM_CORES", "4"),
    ]);

    let plan = compute_environment(&fx.ctx, &[node], &env);
    let keys: Vec<&str> = plan.assignments.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["PATH", "EMSDK", "EMSDK_NODE"]);
    assert_eq!(plan.unset, ["EMSDK_PYTHON", "EM_CACHE"]);

    let script = plan.render_posix(&env);
    assert!(script.contains(&format!("export EMSDK=\"{}\";\n", fx.ctx.layout.root_str())));
    assert!(script.ends_with("unset EMSDK_PYTHON;\nunset EM_CACHE;\n"));
}
