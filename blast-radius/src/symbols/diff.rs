//! Matching two extractions of the same file by [`SymbolKey`].
//!
//! Both the breaking-change detector and the impact analyzer start from this
//! diff, so they always agree on which declarations were removed, kept or
//! added.

use super::{Symbol, SymbolKey};
use std::collections::{HashMap, HashSet};

/// Symbols indexed by key. A key defined twice keeps the last definition but
/// the position of its first appearance.
pub struct KeyedSymbols<'a> {
    order: Vec<SymbolKey>,
    by_key: HashMap<SymbolKey, &'a Symbol>,
}

impl<'a> KeyedSymbols<'a> {
    pub fn new(symbols: &'a [Symbol]) -> Self {
        let mut order = Vec::with_capacity(symbols.len());
        let mut by_key = HashMap::with_capacity(symbols.len());
        for sym in symbols {
            let key = sym.key();
            if by_key.insert(key.clone(), sym).is_none() {
                order.push(key);
            }
        }
        Self { order, by_key }
    }

    pub fn get(&self, key: &SymbolKey) -> Option<&'a Symbol> {
        self.by_key.get(key).copied()
    }

    pub fn contains(&self, key: &SymbolKey) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Surviving definitions in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&SymbolKey, &'a Symbol)> + '_ {
        self.order
            .iter()
            .filter_map(|key| self.by_key.get(key).map(|sym| (key, *sym)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolDelta<'a> {
    Removed(&'a Symbol),
    Retained { old: &'a Symbol, new: &'a Symbol },
    Added(&'a Symbol),
}

/// Pair up old and new symbols by key.
///
/// Removed and retained symbols come first in old-source order, followed by
/// additions in new-source order. An overload-keyed callable whose parameter
/// count changed is still retained when its name, kind and owner leave no
/// other candidate on either side.
pub fn diff_symbols<'a>(old: &'a [Symbol], new: &'a [Symbol]) -> Vec<SymbolDelta<'a>> {
    let old_keyed = KeyedSymbols::new(old);
    let new_keyed = KeyedSymbols::new(new);
    let arity_changes = pair_arity_changes(&old_keyed, &new_keyed);

    let mut deltas = Vec::with_capacity(old_keyed.len().max(new_keyed.len()));
    for (key, old_sym) in old_keyed.iter() {
        let counterpart = new_keyed
            .get(key)
            .or_else(|| arity_changes.get(key).and_then(|new_key| new_keyed.get(new_key)));
        match counterpart {
            Some(new_sym) => deltas.push(SymbolDelta::Retained {
                old: old_sym,
                new: new_sym,
            }),
            None => deltas.push(SymbolDelta::Removed(old_sym)),
        }
    }
    let paired: HashSet<&SymbolKey> = arity_changes.values().collect();
    for (key, new_sym) in new_keyed.iter() {
        if !old_keyed.contains(key) && !paired.contains(key) {
            deltas.push(SymbolDelta::Added(new_sym));
        }
    }
    deltas
}

/// Old key to new key for unmatched overload-keyed symbols that are the only
/// unmatched member of their overload family on both sides.
fn pair_arity_changes(old_keyed: &KeyedSymbols<'_>, new_keyed: &KeyedSymbols<'_>) -> HashMap<SymbolKey, SymbolKey> {
    let mut families: HashMap<SymbolKey, (Vec<&SymbolKey>, Vec<&SymbolKey>)> = HashMap::new();
    for (key, _) in old_keyed.iter() {
        if key.arity.is_some() && !new_keyed.contains(key) {
            families.entry(overload_family(key)).or_default().0.push(key);
        }
    }
    for (key, _) in new_keyed.iter() {
        if key.arity.is_some() && !old_keyed.contains(key) {
            families.entry(overload_family(key)).or_default().1.push(key);
        }
    }

    families
        .into_values()
        .filter_map(|(olds, news)| match (olds.as_slice(), news.as_slice()) {
            ([old_key], [new_key]) => Some((SymbolKey::clone(old_key), SymbolKey::clone(new_key))),
            _ => None,
        })
        .collect()
}

fn overload_family(key: &SymbolKey) -> SymbolKey {
    SymbolKey {
        arity: None,
        ..key.clone()
    }
}

/// Whether any API-relevant attribute differs. Line numbers are ignored, so
/// moving a declaration is not a change.
pub fn symbol_changed(old: &Symbol, new: &Symbol) -> bool {
    old.signature != new.signature
        || old.parameters != new.parameters
        || old.return_type != new.return_type
        || old.exported != new.exported
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolKind;

    fn func(name: &str, line: u32, sig: &str) -> Symbol {
        let mut sym = Symbol::new(name, SymbolKind::Function, "a.go", line);
        sym.signature = sig.to_owned();
        sym.exported = true;
        sym
    }

    #[test]
    fn test_last_definition_wins_at_first_position() {
        let symbols = vec![
            func("A", 1, "first"),
            func("B", 2, "b"),
            func("A", 3, "second"),
        ];
        let keyed = KeyedSymbols::new(&symbols);
        assert_eq!(keyed.len(), 2);
        let entries: Vec<(&str, &str)> = keyed
            .iter()
            .map(|(_, sym)| (sym.name.as_str(), sym.signature.as_str()))
            .collect();
        assert_eq!(entries, vec![("A", "second"), ("B", "b")]);
    }

    #[test]
    fn test_diff_classifies_and_orders() {
        let old = vec![func("Keep", 1, "k"), func("Gone", 2, "g")];
        let new = vec![func("Fresh", 1, "f"), func("Keep", 5, "k")];
        let deltas = diff_symbols(&old, &new);
        assert_eq!(deltas.len(), 3);
        assert!(matches!(deltas[0], SymbolDelta::Retained { old, new } if old.start_line == 1 && new.start_line == 5));
        assert!(matches!(deltas[1], SymbolDelta::Removed(sym) if sym.name == "Gone"));
        assert!(matches!(deltas[2], SymbolDelta::Added(sym) if sym.name == "Fresh"));
    }

    #[test]
    fn test_kind_and_parent_are_part_of_identity() {
        let old = vec![func("Close", 1, "")];
        let mut method = Symbol::new("Close", SymbolKind::Method, "a.go", 1);
        method.parent = "Conn".to_owned();
        let new = vec![method];
        let deltas = diff_symbols(&old, &new);
        assert!(matches!(deltas[0], SymbolDelta::Removed(_)));
        assert!(matches!(deltas[1], SymbolDelta::Added(_)));
    }

    #[test]
    fn test_symbol_changed_ignores_position() {
        let a = func("Run", 1, "func Run()");
        let mut b = func("Run", 40, "func Run()");
        b.end_line = 45;
        assert!(!symbol_changed(&a, &b));

        b.exported = false;
        assert!(symbol_changed(&a, &b));

        let mut c = a.clone();
        c.parameters.push("ctx context.Context".to_owned());
        assert!(symbol_changed(&a, &c));
    }

    fn java_method(name: &str, params: &[&str]) -> Symbol {
        let mut sym = Symbol::new(name, SymbolKind::Method, "Repo.java", 2);
        sym.parent = "Repo".to_owned();
        sym.exported = true;
        sym.parameters = params.iter().map(|p| (*p).to_owned()).collect();
        sym
    }

    #[test]
    fn test_single_overload_with_new_arity_is_retained() {
        let old = vec![java_method("find", &["int id"])];
        let new = vec![java_method("find", &["int id", "boolean deep"])];
        let deltas = diff_symbols(&old, &new);
        assert_eq!(deltas.len(), 1);
        assert!(matches!(deltas[0], SymbolDelta::Retained { old, new } if old.parameters.len() == 1 && new.parameters.len() == 2));
    }

    #[test]
    fn test_ambiguous_overload_family_stays_unpaired() {
        let old = vec![java_method("find", &["int id"]), java_method("find", &["String a", "int b", "int c"])];
        let new = vec![java_method("find", &["int id", "boolean deep"])];
        let deltas = diff_symbols(&old, &new);
        let removed = deltas.iter().filter(|d| matches!(d, SymbolDelta::Removed(_))).count();
        let added = deltas.iter().filter(|d| matches!(d, SymbolDelta::Added(_))).count();
        assert_eq!((removed, added), (2, 1));
    }

    #[test]
    fn test_new_overload_next_to_kept_one_is_added() {
        let old = vec![java_method("find", &["int id"])];
        let new = vec![java_method("find", &["int id"]), java_method("find", &["String name", "boolean deep"])];
        let deltas = diff_symbols(&old, &new);
        assert!(matches!(deltas[0], SymbolDelta::Retained { .. }));
        assert!(matches!(deltas[1], SymbolDelta::Added(sym) if sym.parameters.len() == 2));
    }
}
