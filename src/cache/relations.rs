//! Entity Relation Graph
//!
//! Declares which groups hold data derived from another group, so that a
//! change in one can be cascaded into its dependents.

use std::collections::HashMap;

use crate::cache::CacheGroup;
use crate::error::{CacheError, Result};

// == Relation Graph ==
/// Adjacency map `group -> groups that must be invalidated when it changes`.
///
/// Cycles are allowed; cascades are bounded by depth, not by a visited set.
#[derive(Debug, Clone)]
pub struct RelationGraph {
    edges: HashMap<CacheGroup, Vec<CacheGroup>>,
}

impl RelationGraph {
    /// Creates a graph with no relations.
    pub fn new() -> Self {
        Self {
            edges: HashMap::new(),
        }
    }

    /// The relations of the nutrition data model.
    ///
    /// - meals feed plan nutrition totals
    /// - ingredients feed meals
    /// - plans feed progress tracking
    /// - users own plans, progress and generation context
    pub fn nutrition() -> Self {
        Self::new()
            .with_relation(CacheGroup::Meal, CacheGroup::Plan)
            .with_relation(CacheGroup::Ingredient, CacheGroup::Meal)
            .with_relation(CacheGroup::Plan, CacheGroup::Progress)
            .with_relation(CacheGroup::User, CacheGroup::Plan)
            .with_relation(CacheGroup::User, CacheGroup::Progress)
            .with_relation(CacheGroup::User, CacheGroup::IaContext)
    }

    /// Declares that `dependent` must be invalidated when `group` changes.
    pub fn with_relation(mut self, group: CacheGroup, dependent: CacheGroup) -> Self {
        let dependents = self.edges.entry(group).or_default();
        if !dependents.contains(&dependent) {
            dependents.push(dependent);
        }
        self
    }

    /// Groups depending on `group`, in declaration order.
    pub fn dependents(&self, group: CacheGroup) -> &[CacheGroup] {
        self.edges.get(&group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of declared relations.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    // == Acyclicity Check ==
    /// Fails with [`CacheError::CyclicRelations`] if any group can reach
    /// itself. Opt-in: the cache engine never calls this.
    pub fn ensure_acyclic(&self) -> Result<()> {
        let mut finished: Vec<CacheGroup> = Vec::new();
        for start in CacheGroup::ALL {
            let mut path = Vec::new();
            self.visit(start, &mut path, &mut finished)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        group: CacheGroup,
        path: &mut Vec<CacheGroup>,
        finished: &mut Vec<CacheGroup>,
    ) -> Result<()> {
        if finished.contains(&group) {
            return Ok(());
        }
        if let Some(pos) = path.iter().position(|g| *g == group) {
            let cycle: Vec<&str> = path[pos..]
                .iter()
                .chain(std::iter::once(&group))
                .map(|g| g.as_str())
                .collect();
            return Err(CacheError::CyclicRelations(cycle.join(" -> ")));
        }

        path.push(group);
        for dependent in self.dependents(group) {
            self.visit(*dependent, path, finished)?;
        }
        path.pop();
        finished.push(group);
        Ok(())
    }
}

impl Default for RelationGraph {
    fn default() -> Self {
        Self::nutrition()
    }
}
