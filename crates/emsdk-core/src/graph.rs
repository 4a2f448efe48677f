//! Dependency expansion and conflict removal for activation lists.

use crate::error::{Error, Result};
use crate::item::Item;
use crate::registry::Registry;
use crate::state::State;

/// Splice each item's recursive dependencies immediately before it.
///
/// One left-to-right pass; an item shared by two requests appears twice.
/// [`remove_conflicts`] collapses the repeats.
pub fn expand<'a>(registry: &'a Registry, items: &[&'a Item]) -> Vec<&'a Item> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.extend(registry.recursive_dependencies(item));
        out.push(*item);
    }
    out
}

/// Two items can be active together unless they are of the same category.
pub fn can_simultaneously_activate(a: &Item, b: &Item) -> bool {
    a.id() != b.id()
}

/// Drop every item that a later item of the same category supersedes.
///
/// Survivors keep their relative order, so the result is the list of last
/// occurrences. A dependency shared with an earlier request therefore moves
/// behind that request: `[a, b(uses a), a, c(uses a)]` becomes `[b, a, c]`.
pub fn remove_conflicts<'a>(items: Vec<&'a Item>) -> Vec<&'a Item> {
    let mut out: Vec<&'a Item> = Vec::with_capacity(items.len());
    for item in items {
        out.retain(|earlier| can_simultaneously_activate(earlier, item));
        out.push(item);
    }
    out
}

/// Expand, require everything to be installed, and remove conflicts.
pub fn process_tool_list<'a>(state: &State<'a>, items: &[&'a Item]) -> Result<Vec<&'a Item>> {
    let expanded = expand(state.registry, items);
    if let Some(missing) = expanded.iter().find(|i| !state.is_installed(i, false)) {
        return Err(Error::NotInstalled(missing.name.to_string()));
    }
    Ok(remove_conflicts(expanded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use emsdk_schema::ItemDef;

    fn def(json: &str) -> ItemDef {
        serde_json::from_str(json).unwrap()
    }

    fn names(items: &[&Item]) -> Vec<String> {
        items.iter().map(|i| i.name.to_string()).collect()
    }

    #[test]
    fn dependency_precedes_dependent() {
        let mut r = Registry::new();
        r.add_tool(def(r#"{"id":"a","version":"1"}"#)).unwrap();
        r.add_tool(def(r#"{"id":"b","version":"1","uses":["a-1"]}"#)).unwrap();
        let b = r.find_tool("b-1").unwrap();
        assert_eq!(names(&expand(&r, &[b])), vec!["a-1", "b-1"]);
    }

    #[test]
    fn later_item_of_same_category_wins() {
        let mut r = Registry::new();
        r.add_tool(def(r#"{"id":"node","version":"16"}"#)).unwrap();
        r.add_tool(def(r#"{"id":"node","version":"18"}"#)).unwrap();
        r.add_tool(def(r#"{"id":"python","version":"3"}"#)).unwrap();
        let list = vec![
            r.find_tool("node-16").unwrap(),
            r.find_tool("python-3").unwrap(),
            r.find_tool("node-18").unwrap(),
        ];
        assert_eq!(names(&remove_conflicts(list)), vec!["python-3", "node-18"]);
    }

    #[test]
    fn shared_dependency_collapses() {
        let mut r = Registry::new();
        r.add_tool(def(r#"{"id":"a","version":"1"}"#)).unwrap();
        r.add_tool(def(r#"{"id":"b","version":"1","uses":["a-1"]}"#)).unwrap();
        r.add_tool(def(r#"{"id":"c","version":"1","uses":["a-1"]}"#)).unwrap();
        let expanded = expand(&r, &[r.find_tool("b-1").unwrap(), r.find_tool("c-1").unwrap()]);
        assert_eq!(names(&expanded), vec!["a-1", "b-1", "a-1", "c-1"]);
        assert_eq!(names(&remove_conflicts(expanded)), vec!["b-1", "a-1", "c-1"]);
    }
}
