use emsdk_core::Registry;
use emsdk_core::graph::{expand, remove_conflicts};
use emsdk_schema::ItemDef;
use proptest::prelude::*;
use std::collections::HashSet;

/// Tool `i` may only use tools `j < i`, so the graph is acyclic.
fn registry(edges: &[Vec<bool>]) -> Registry {
    let mut r = Registry::new();
    for (i, row) in edges.iter().enumerate() {
        let uses = (0..i)
            .filter(|&j| row.get(j).copied().unwrap_or(false))
            .map(|j| format!("t{j}"))
            .collect();
        r.add_tool(ItemDef {
            id: format!("t{i}"),
            uses,
            ..ItemDef::default()
        })
        .unwrap();
    }
    r
}

fn graph() -> impl Strategy<Value = (Vec<Vec<bool>>, Vec<usize>)> {
    (1usize..8).prop_flat_map(|n| {
        (
            prop::collection::vec(prop::collection::vec(any::<bool>(), n), n),
            prop::collection::vec(0..n, 1..5),
        )
    })
}

proptest! {
    #[test]
    fn requested_items_follow_all_their_dependencies((edges, picks) in graph()) {
        let reg = registry(&edges);
        let requested: Vec<_> = picks.iter().map(|i| &reg.tools()[*i]).collect();
        let out = expand(&reg, &requested);

        let mut pos = 0;
        for item in &requested {
            let deps = reg.recursive_dependencies(item);
            pos += deps.len();
            prop_assert_eq!(out[pos].name.as_str(), item.name.as_str());
            let before: HashSet<&str> = out[..pos].iter().map(|i| i.name.as_str()).collect();
            for dep in deps {
                prop_assert!(before.contains(dep.name.as_str()));
            }
            pos += 1;
        }
        prop_assert_eq!(pos, out.len());
    }

    #[test]
    fn reconciled_list_is_complete_and_unique((edges, picks) in graph()) {
        let reg = registry(&edges);
        let requested: Vec<_> = picks.iter().map(|i| &reg.tools()[*i]).collect();
        let out = remove_conflicts(expand(&reg, &requested));

        let names: Vec<&str> = out.iter().map(|i| i.name.as_str()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        prop_assert_eq!(unique.len(), names.len());
        for item in &requested {
            prop_assert!(unique.contains(item.name.as_str()));
            for dep in reg.recursive_dependencies(item) {
                prop_assert!(unique.contains(dep.name.as_str()));
            }
        }
        // The last requested item is never superseded.
        let last = requested.last().unwrap();
        prop_assert_eq!(*names.last().unwrap(), last.name.as_str());
    }

    #[test]
    fn reconciled_list_keeps_last_occurrences_in_order((edges, picks) in graph()) {
        let reg = registry(&edges);
        let requested: Vec<_> = picks.iter().map(|i| &reg.tools()[*i]).collect();
        let expanded = expand(&reg, &requested);
        let out = remove_conflicts(expanded.clone());

        let expected: Vec<&str> = expanded
            .iter()
            .enumerate()
            .filter(|(i, item)| expanded[i + 1..].iter().all(|later| later.id() != item.id()))
            .map(|(_, item)| item.name.as_str())
            .collect();
        let names: Vec<&str> = out.iter().map(|i| i.name.as_str()).collect();
        prop_assert_eq!(names, expected);
    }
}
