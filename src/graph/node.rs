// src/graph/node.rs

use std::fmt;

use crate::engine::TaskName;

/// A task graph: leaves name registered tasks, inner nodes order them.
///
/// - `Series`: each child starts after the previous one succeeded.
/// - `Parallel`: all children start together; the node completes once all
///   of them have finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Task(TaskName),
    Series(Vec<Node>),
    Parallel(Vec<Node>),
}

impl Node {
    pub fn task(name: impl Into<TaskName>) -> Self {
        Node::Task(name.into())
    }

    pub fn series(children: impl IntoIterator<Item = Node>) -> Self {
        Node::Series(children.into_iter().collect())
    }

    pub fn parallel(children: impl IntoIterator<Item = Node>) -> Self {
        Node::Parallel(children.into_iter().collect())
    }

    /// Leaf task names in depth-first order. A task appearing twice in the
    /// graph appears twice here.
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Node::Task(name) => out.push(name),
            Node::Series(children) | Node::Parallel(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, children) = match self {
            Node::Task(name) => return f.write_str(name),
            Node::Series(children) => ("series", children),
            Node::Parallel(children) => ("parallel", children),
        };
        write!(f, "{label}(")?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{child}")?;
        }
        f.write_str(")")
    }
}

