//! File dependency graph over the indexed codebase.
//!
//! An edge runs from a file that declares a symbol to each other file that
//! references it. Files linked by edges are grouped into connected
//! clusters, which tells a reviewer which files move together.

use super::index::SymbolIndex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// A directed edge: `defines_file` declares symbol(s) that `references_file` uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolEdge {
    pub defines_file: String,
    pub references_file: String,
    /// Sorted symbol names creating this connection.
    pub symbols: Vec<String>,
}

/// A connected component of files linked through shared symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCluster {
    /// Sorted file paths.
    pub files: Vec<String>,
    /// Edges within this cluster.
    pub edges: Vec<SymbolEdge>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub edges: Vec<SymbolEdge>,
    pub clusters: Vec<FileCluster>,
}

/// Build the dependency graph of everything currently indexed.
///
/// 1. Maps each declared name to its defining files
/// 2. Creates an edge from every defining file to every other file holding a reference
/// 3. Groups files into connected components
pub fn build_dependency_graph(index: &SymbolIndex) -> DependencyGraph {
    let mut symbol_to_files: HashMap<&str, HashSet<&str>> = HashMap::new();
    for entry in index.entries() {
        for sym in entry.symbols() {
            symbol_to_files
                .entry(sym.name.as_str())
                .or_default()
                .insert(entry.path());
        }
    }

    // (defines_file, references_file) -> connecting names
    let mut edge_map: HashMap<(&str, String), BTreeSet<&str>> = HashMap::new();
    for (name, defining_files) in &symbol_to_files {
        for reference in index.references(name) {
            for defining_file in defining_files {
                if *defining_file == reference.file_path {
                    continue;
                }
                edge_map
                    .entry((*defining_file, reference.file_path.clone()))
                    .or_default()
                    .insert(*name);
            }
        }
    }

    let mut edges: Vec<SymbolEdge> = edge_map
        .into_iter()
        .map(|((defines_file, references_file), symbols)| SymbolEdge {
            defines_file: defines_file.to_owned(),
            references_file,
            symbols: symbols.into_iter().map(str::to_owned).collect(),
        })
        .collect();
    edges.sort_by(|a, b| (&a.defines_file, &a.references_file).cmp(&(&b.defines_file, &b.references_file)));

    let files = index.indexed_files();
    let position: HashMap<&str, usize> = files.iter().enumerate().map(|(i, f)| (f.as_str(), i)).collect();
    let mut components = Components::new(files.len());
    for edge in &edges {
        if let (Some(&a), Some(&b)) = (
            position.get(edge.defines_file.as_str()),
            position.get(edge.references_file.as_str()),
        ) {
            components.join(a, b);
        }
    }

    let mut members: HashMap<usize, Vec<String>> = HashMap::new();
    for (i, file) in files.iter().enumerate() {
        members.entry(components.root(i)).or_default().push(file.clone());
    }

    let mut clusters: Vec<FileCluster> = members
        .into_values()
        .map(|mut paths| {
            paths.sort();
            let cluster_edges = edges
                .iter()
                .filter(|e| paths.binary_search(&e.defines_file).is_ok())
                .cloned()
                .collect();
            FileCluster {
                files: paths,
                edges: cluster_edges,
            }
        })
        .collect();

    // Widest blast radius first; ties and singletons by path.
    clusters.sort_by(|a, b| b.files.len().cmp(&a.files.len()).then_with(|| a.files.cmp(&b.files)));

    DependencyGraph { edges, clusters }
}

/// Disjoint sets over indexed file positions.
struct Components {
    parent: Vec<usize>,
}

impl Components {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn root(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn join(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.root(a), self.root(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}
