use std::collections::{HashMap, HashSet, VecDeque};

use uuid::Uuid;

use super::Task;

/// Read-only adjacency derived from each task's `depends_on` list.
///
/// Edges pointing at ids that are not in the task set are ignored, so a
/// stale reference never shows up as a predecessor or successor.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Task order as given, used to keep traversals deterministic.
    order: Vec<Uuid>,
    predecessors: HashMap<Uuid, Vec<Uuid>>,
    successors: HashMap<Uuid, Vec<Uuid>>,
}

impl DependencyGraph {
    pub fn build(tasks: &[Task]) -> Self {
        let known: HashSet<Uuid> = tasks.iter().map(|t| t.id).collect();
        let mut graph = Self {
            order: tasks.iter().map(|t| t.id).collect(),
            predecessors: HashMap::with_capacity(tasks.len()),
            successors: HashMap::with_capacity(tasks.len()),
        };
        for task in tasks {
            for &pre in &task.depends_on {
                if pre == task.id || !known.contains(&pre) {
                    continue;
                }
                let preds = graph.predecessors.entry(task.id).or_default();
                if preds.contains(&pre) {
                    continue;
                }
                preds.push(pre);
                graph.successors.entry(pre).or_default().push(task.id);
            }
        }
        graph
    }

    /// Tasks that `id` depends on.
    pub fn predecessors(&self, id: Uuid) -> &[Uuid] {
        self.predecessors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tasks that depend on `id`.
    pub fn successors(&self, id: Uuid) -> &[Uuid] {
        self.successors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All `(prerequisite, dependent)` pairs, for drawing connectors.
    pub fn edges(&self) -> impl Iterator<Item = (Uuid, Uuid)> + '_ {
        self.order.iter().flat_map(move |&to| {
            self.predecessors(to).iter().map(move |&from| (from, to))
        })
    }

    /// Would making `task` depend on `prerequisite` close a cycle?
    ///
    /// True when `task` is already reachable walking backwards from
    /// `prerequisite`, or when the two are the same task.
    pub fn would_create_cycle(&self, task: Uuid, prerequisite: Uuid) -> bool {
        if task == prerequisite {
            return true;
        }
        let mut seen = HashSet::new();
        let mut stack = vec![prerequisite];
        while let Some(id) = stack.pop() {
            if id == task {
                return true;
            }
            if seen.insert(id) {
                stack.extend_from_slice(self.predecessors(id));
            }
        }
        false
    }

    /// Prerequisites-first ordering of every task, or the ids left over
    /// when the graph contains a cycle.
    pub fn topological_order(&self) -> Result<Vec<Uuid>, Vec<Uuid>> {
        let mut indegree: HashMap<Uuid, usize> = self
            .order
            .iter()
            .map(|&id| (id, self.predecessors(id).len()))
            .collect();
        let mut queue: VecDeque<Uuid> = self
            .order
            .iter()
            .copied()
            .filter(|id| indegree[id] == 0)
            .collect();
        let mut sorted = Vec::with_capacity(self.order.len());

        while let Some(id) = queue.pop_front() {
            sorted.push(id);
            for &next in self.successors(id) {
                if let Some(deg) = indegree.get_mut(&next) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }

        if sorted.len() == self.order.len() {
            Ok(sorted)
        } else {
            let placed: HashSet<Uuid> = sorted.into_iter().collect();
            Err(self
                .order
                .iter()
                .copied()
                .filter(|id| !placed.contains(id))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(name: &str) -> Task {
        let day = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        Task::new(name, day, day)
    }

    #[test]
    fn lookups_both_directions() {
        let a = task("Foundations");
        let mut b = task("Framing");
        let mut c = task("Roof");
        b.depends_on = vec![a.id];
        c.depends_on = vec![a.id, b.id];
        let graph = DependencyGraph::build(&[a.clone(), b.clone(), c.clone()]);

        assert_eq!(graph.predecessors(c.id), &[a.id, b.id]);
        assert_eq!(graph.successors(a.id), &[b.id, c.id]);
        assert!(graph.predecessors(a.id).is_empty());
        assert_eq!(graph.edges().count(), 3);
    }

    #[test]
    fn ignores_dangling_and_self_edges() {
        let mut a = task("Plumbing");
        a.depends_on = vec![a.id, Uuid::new_v4()];
        let graph = DependencyGraph::build(&[a.clone()]);
        assert!(graph.predecessors(a.id).is_empty());
        assert_eq!(graph.edges().count(), 0);
    }

    #[test]
    fn detects_would_be_cycles() {
        let a = task("A");
        let mut b = task("B");
        let mut c = task("C");
        b.depends_on = vec![a.id];
        c.depends_on = vec![b.id];
        let graph = DependencyGraph::build(&[a.clone(), b.clone(), c.clone()]);

        assert!(graph.would_create_cycle(a.id, c.id));
        assert!(graph.would_create_cycle(b.id, b.id));
        assert!(!graph.would_create_cycle(c.id, a.id));
    }

    #[test]
    fn topological_order_and_cycle_report() {
        let mut a = task("A");
        let mut b = task("B");
        let c = task("C");
        b.depends_on = vec![c.id];
        let graph = DependencyGraph::build(&[a.clone(), b.clone(), c.clone()]);
        let order = graph.topological_order().unwrap();
        let pos = |id| order.iter().position(|x| *x == id).unwrap();
        assert!(pos(c.id) < pos(b.id));

        a.depends_on = vec![b.id];
        b.depends_on = vec![a.id];
        let graph = DependencyGraph::build(&[a.clone(), b.clone(), c.clone()]);
        let stuck = graph.topological_order().unwrap_err();
        assert_eq!(stuck, vec![a.id, b.id]);
    }
}
