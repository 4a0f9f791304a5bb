use crate::{Error, Result, TaskDescriptor};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    DependsOn,
    RunsAfter,
}

/// Static table of every task known to one invocation.
///
/// Construction validates the table (unique names, no dangling references,
/// no cycles), so a registry that exists can always be planned.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: Vec<TaskDescriptor>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanStep {
    pub task: TaskDescriptor,
    /// Planned tasks with an edge (of either kind) into this one
    pub upstream: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlan {
    pub requested: Vec<String>,
    pub steps: Vec<PlanStep>,
}

impl ExecutionPlan {
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.task.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl TaskRegistry {
    pub fn new(tasks: Vec<TaskDescriptor>) -> Result<Self> {
        let mut index = HashMap::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            if index.insert(task.name.clone(), i).is_some() {
                return Err(Error::DuplicateTask(task.name.clone()));
            }
        }

        for task in &tasks {
            for dep in task.depends_on.iter().chain(task.run_after.iter()) {
                if !index.contains_key(dep) {
                    return Err(Error::UnknownDependency {
                        task: task.name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        let registry = Self { tasks, index };

        let everything: BTreeSet<usize> = (0..registry.tasks.len()).collect();
        let graph = registry.build_graph(&everything);
        registry.topological_order(&graph)?;

        tracing::debug!("Task registry validated with {} tasks", registry.tasks.len());

        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&TaskDescriptor> {
        self.index.get(name).map(|&i| &self.tasks[i])
    }

    pub fn tasks(&self) -> &[TaskDescriptor] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks keyed by group, each group in registration order
    pub fn groups(&self) -> BTreeMap<&str, Vec<&TaskDescriptor>> {
        let mut groups: BTreeMap<&str, Vec<&TaskDescriptor>> = BTreeMap::new();
        for task in &self.tasks {
            groups.entry(task.group.as_str()).or_default().push(task);
        }
        groups
    }

    /// Resolve requested task names into an ordered plan.
    ///
    /// The plan holds the requested tasks plus everything they transitively
    /// depend on. `run_after` edges only order tasks that are already in the
    /// plan. Ties are broken by registration order.
    pub fn plan<S: AsRef<str>>(&self, requested: &[S]) -> Result<ExecutionPlan> {
        let mut members = BTreeSet::new();
        let mut stack = Vec::new();

        for name in requested {
            let name = name.as_ref();
            let i = *self
                .index
                .get(name)
                .ok_or_else(|| Error::TaskNotFound(name.to_string()))?;
            stack.push(i);
        }

        while let Some(i) = stack.pop() {
            if !members.insert(i) {
                continue;
            }
            for dep in &self.tasks[i].depends_on {
                stack.push(self.index[dep]);
            }
        }

        let graph = self.build_graph(&members);
        let order = self.topological_order(&graph)?;

        let steps = order
            .into_iter()
            .map(|node| {
                let upstream = graph
                    .neighbors_directed(node, Direction::Incoming)
                    .map(|n| self.tasks[graph[n]].name.clone())
                    .collect();
                PlanStep {
                    task: self.tasks[graph[node]].clone(),
                    upstream,
                }
            })
            .collect();

        Ok(ExecutionPlan {
            requested: requested.iter().map(|s| s.as_ref().to_string()).collect(),
            steps,
        })
    }

    fn build_graph(&self, members: &BTreeSet<usize>) -> DiGraph<usize, EdgeKind> {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::with_capacity(members.len());

        for &i in members {
            nodes.insert(i, graph.add_node(i));
        }

        for &i in members {
            let task = &self.tasks[i];
            let edges = task
                .depends_on
                .iter()
                .map(|d| (d, EdgeKind::DependsOn))
                .chain(task.run_after.iter().map(|d| (d, EdgeKind::RunsAfter)));

            for (dep, kind) in edges {
                if let Some(&from) = nodes.get(&self.index[dep]) {
                    graph.add_edge(from, nodes[&i], kind);
                }
            }
        }

        graph
    }

    // Kahn's algorithm. Node indices follow registration order, so taking the
    // smallest ready index keeps the plan stable.
    fn topological_order(&self, graph: &DiGraph<usize, EdgeKind>) -> Result<Vec<NodeIndex>> {
        let mut in_degree: HashMap<NodeIndex, usize> = graph
            .node_indices()
            .map(|n| (n, graph.neighbors_directed(n, Direction::Incoming).count()))
            .collect();

        let mut ready: BTreeSet<NodeIndex> = in_degree
            .iter()
            .filter(|&(_, &d)| d == 0)
            .map(|(&n, _)| n)
            .collect();

        let mut order = Vec::with_capacity(graph.node_count());

        while let Some(node) = ready.pop_first() {
            order.push(node);
            for next in graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(d) = in_degree.get_mut(&next) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(next);
                    }
                }
            }
        }

        if order.len() < graph.node_count() {
            return Err(Error::DependencyCycle(self.cycle_member(graph)));
        }

        Ok(order)
    }

    // Nodes left over by Kahn's algorithm may only sit downstream of a cycle,
    // so name the earliest-registered task that is actually on one.
    fn cycle_member(&self, graph: &DiGraph<usize, EdgeKind>) -> String {
        tarjan_scc(graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .flatten()
            .map(|n| graph[n])
            .min()
            .map(|i| self.tasks[i].name.clone())
            .unwrap_or_default()
    }
}
