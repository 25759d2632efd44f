//! Dependency graph over a task arena
//!
//! Tasks stay in the caller's slice; the graph only stores arena indices.
//! Predecessor lists declared on each task are normalised once into a single
//! edge list, which both the eligibility analyzer and the slot check consult.
//!
//! Key principle: the graph is built once per leveling run. Shifting changes
//! task dates, never links, so indices and edges stay valid for the whole run.

use std::collections::{HashMap, HashSet};
use tasklevel_core::{DependencyType, Task, TaskId};
use tracing::debug;

/// An edge in the dependency graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Predecessor arena index
    pub from: usize,
    /// Successor arena index
    pub to: usize,
    /// Dependency type
    pub dep_type: DependencyType,
    /// Lag in days (can be negative for lead time)
    pub lag_days: i64,
}

/// A link that could not be resolved against the task set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLink {
    pub task: TaskId,
    pub predecessor: TaskId,
}

/// Normalised dependency edges keyed by arena index
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Task lookup by ID (first occurrence wins)
    task_map: HashMap<TaskId, usize>,
    /// Every resolved link, in task then declaration order
    edges: Vec<DependencyEdge>,
    /// Edge indices per successor
    incoming: Vec<Vec<usize>>,
    /// Edge indices per predecessor
    outgoing: Vec<Vec<usize>>,
    /// Links to unknown tasks or to the task itself
    skipped: Vec<SkippedLink>,
    /// IDs carried by more than one task
    duplicates: HashSet<TaskId>,
}

impl DependencyGraph {
    /// Build the graph for a task slice
    pub fn build(tasks: &[Task]) -> Self {
        let mut task_map: HashMap<TaskId, usize> = HashMap::with_capacity(tasks.len());
        let mut duplicates = HashSet::new();
        for (i, task) in tasks.iter().enumerate() {
            if task_map.contains_key(&task.id) {
                duplicates.insert(task.id.clone());
            } else {
                task_map.insert(task.id.clone(), i);
            }
        }

        let mut edges = Vec::new();
        let mut incoming = vec![Vec::new(); tasks.len()];
        let mut outgoing = vec![Vec::new(); tasks.len()];
        let mut skipped = Vec::new();

        for (to, task) in tasks.iter().enumerate() {
            for dep in &task.predecessors {
                let from = match task_map.get(&dep.predecessor) {
                    Some(&from) if from != to => from,
                    _ => {
                        debug!(
                            task = %task.id,
                            predecessor = %dep.predecessor,
                            "skipping unresolved dependency"
                        );
                        skipped.push(SkippedLink {
                            task: task.id.clone(),
                            predecessor: dep.predecessor.clone(),
                        });
                        continue;
                    }
                };

                let edge_index = edges.len();
                edges.push(DependencyEdge {
                    from,
                    to,
                    dep_type: dep.dep_type,
                    lag_days: dep.lag_days,
                });
                incoming[to].push(edge_index);
                outgoing[from].push(edge_index);
            }
        }

        Self {
            task_map,
            edges,
            incoming,
            outgoing,
            skipped,
            duplicates,
        }
    }

    /// Arena index of a task ID
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.task_map.get(id).copied()
    }

    /// Whether more than one task carries `id`
    pub fn is_ambiguous(&self, id: &str) -> bool {
        self.duplicates.contains(id)
    }

    /// All resolved edges
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Links that were dropped while building
    pub fn skipped_links(&self) -> &[SkippedLink] {
        &self.skipped
    }

    /// Edges ending at `index`
    pub fn predecessors(&self, index: usize) -> impl Iterator<Item = &DependencyEdge> + '_ {
        self.incoming
            .get(index)
            .into_iter()
            .flatten()
            .map(move |&e| &self.edges[e])
    }

    /// Edges starting at `index`
    pub fn successors(&self, index: usize) -> impl Iterator<Item = &DependencyEdge> + '_ {
        self.outgoing
            .get(index)
            .into_iter()
            .flatten()
            .map(move |&e| &self.edges[e])
    }
}
