// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Relational operator graph
//!
//! An intermediate, un-optimized plan: a DAG of relational operators stored
//! in an arena. Nodes are addressed by [`NodeId`]; every port records the
//! opposite port it is connected to, or `None` while dangling.
//!
//! ## Frontier
//!
//! Adding an operator returns its dangling output as an [`Output`] token.
//! The token is neither `Clone` nor `Copy` and is consumed by the next
//! operator that reads from it, so an output port can be connected to at
//! most one downstream input:
//!
//! ```text
//! let scan = graph.add_source(Operator::Scan(..));      // Output
//! let filter = graph.add_unary(scan, Operator::Filter(..)); // scan consumed
//! graph.add_sink(filter, Operator::Emit(..));
//! ```

use crate::decl::SortOrder;
use crate::descriptor::{AggregateFunction, Function, Relation, Variable};
use crate::scalar::Scalar;

/// Index of a node in a [`Graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A port on a node: input or output, depending on context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub node: NodeId,
    pub index: usize,
}

/// A dangling output port, consumed when connected
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a dangling output must be connected or returned to the caller"]
pub struct Output(PortRef);

impl Output {
    pub fn port(&self) -> PortRef {
        self.0
    }

    pub fn node(&self) -> NodeId {
        self.0.node
    }
}

/// `ALL` / `DISTINCT` on set operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    All,
    Distinct,
}

/// Join kinds; right outer joins are expressed by swapping operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    Cross,
    Inner,
    LeftOuter,
    FullOuter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyKind {
    Cross,
    Outer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanColumn {
    /// Table column descriptor
    pub source: Variable,
    /// Stream variable the scan produces
    pub destination: Variable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub source: Relation,
    pub columns: Vec<ScanColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Values {
    pub columns: Vec<Variable>,
    pub rows: Vec<Vec<Scalar>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub condition: Scalar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectColumn {
    pub variable: Variable,
    pub value: Scalar,
}

/// Appends computed columns to its input
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub columns: Vec<ProjectColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub condition: Option<Scalar>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateColumn {
    pub function: AggregateFunction,
    pub arguments: Vec<Variable>,
    pub destination: Variable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub group_keys: Vec<Variable>,
    pub columns: Vec<AggregateColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionMapping {
    pub left: Option<Variable>,
    pub right: Option<Variable>,
    pub destination: Variable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    pub quantifier: Quantifier,
    pub mappings: Vec<UnionMapping>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupKeyPair {
    pub left: Variable,
    pub right: Variable,
}

/// INTERSECT / EXCEPT; outputs the left columns
#[derive(Debug, Clone, PartialEq)]
pub struct SetDifference {
    pub quantifier: Quantifier,
    pub group_key_pairs: Vec<GroupKeyPair>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Distinct {
    pub group_keys: Vec<Variable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub variable: Variable,
    pub order: SortOrder,
}

/// Sorting and row-count limiting
#[derive(Debug, Clone, PartialEq)]
pub struct Limit {
    pub count: Option<u64>,
    pub sort_keys: Vec<SortKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyColumn {
    /// Position in the function's returned row type
    pub position: usize,
    pub variable: Variable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Apply {
    pub kind: ApplyKind,
    pub function: Function,
    pub arguments: Vec<Scalar>,
    pub columns: Vec<ApplyColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteColumn {
    pub source: Variable,
    /// Table column descriptor
    pub destination: Variable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub kind: WriteKind,
    pub destination: Relation,
    pub keys: Vec<WriteColumn>,
    pub columns: Vec<WriteColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmitColumn {
    pub source: Variable,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Emit {
    pub columns: Vec<EmitColumn>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubqueryMapping {
    /// Column of the nested graph's output
    pub source: Variable,
    /// Column this node exposes
    pub destination: Variable,
}

/// A nested, privately owned subgraph exposed as a source
#[derive(Debug, Clone, PartialEq)]
pub struct Subquery {
    pub graph: Graph,
    pub output: PortRef,
    pub mappings: Vec<SubqueryMapping>,
}

/// A relational operator
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Scan(Scan),
    Values(Values),
    Filter(Filter),
    Project(Project),
    Join(Join),
    Aggregate(Aggregate),
    Union(Union),
    Intersection(SetDifference),
    Difference(SetDifference),
    Distinct(Distinct),
    Limit(Limit),
    Apply(Apply),
    Write(Write),
    Emit(Emit),
    Subquery(Subquery),
}

/// Operator tags, for inspecting graph shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Scan,
    Values,
    Filter,
    Project,
    Join,
    Aggregate,
    Union,
    Intersection,
    Difference,
    Distinct,
    Limit,
    Apply,
    Write,
    Emit,
    Subquery,
}

impl Operator {
    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::Scan(_) => OperatorKind::Scan,
            Operator::Values(_) => OperatorKind::Values,
            Operator::Filter(_) => OperatorKind::Filter,
            Operator::Project(_) => OperatorKind::Project,
            Operator::Join(_) => OperatorKind::Join,
            Operator::Aggregate(_) => OperatorKind::Aggregate,
            Operator::Union(_) => OperatorKind::Union,
            Operator::Intersection(_) => OperatorKind::Intersection,
            Operator::Difference(_) => OperatorKind::Difference,
            Operator::Distinct(_) => OperatorKind::Distinct,
            Operator::Limit(_) => OperatorKind::Limit,
            Operator::Apply(_) => OperatorKind::Apply,
            Operator::Write(_) => OperatorKind::Write,
            Operator::Emit(_) => OperatorKind::Emit,
            Operator::Subquery(_) => OperatorKind::Subquery,
        }
    }
}

/// A node: an operator and its ports
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub operator: Operator,
    /// Upstream output port feeding each input
    inputs: Vec<Option<PortRef>>,
    /// Downstream input port fed by each output
    outputs: Vec<Option<PortRef>>,
}

impl Node {
    pub fn inputs(&self) -> &[Option<PortRef>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Option<PortRef>] {
        &self.outputs
    }
}

/// An owned operator graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, operator: Operator, inputs: Vec<Output>, outputs: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut input_ports = Vec::with_capacity(inputs.len());
        for (index, Output(upstream)) in inputs.into_iter().enumerate() {
            self.nodes[upstream.node.0].outputs[upstream.index] = Some(PortRef { node: id, index });
            input_ports.push(Some(upstream));
        }
        self.nodes.push(Node {
            operator,
            inputs: input_ports,
            outputs: vec![None; outputs],
        });
        id
    }

    /// Adds an operator without inputs
    pub fn add_source(&mut self, operator: Operator) -> Output {
        let id = self.insert(operator, Vec::new(), 1);
        Output(PortRef { node: id, index: 0 })
    }

    /// Adds an operator reading from `input`
    pub fn add_unary(&mut self, input: Output, operator: Operator) -> Output {
        let id = self.insert(operator, vec![input], 1);
        Output(PortRef { node: id, index: 0 })
    }

    /// Adds an operator reading from `left` and `right`, in that port order
    pub fn add_binary(&mut self, left: Output, right: Output, operator: Operator) -> Output {
        let id = self.insert(operator, vec![left, right], 1);
        Output(PortRef { node: id, index: 0 })
    }

    /// Adds a terminal operator without outputs
    pub fn add_sink(&mut self, input: Output, operator: Operator) -> NodeId {
        self.insert(operator, vec![input], 0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn operator(&self, id: NodeId) -> &Operator {
        &self.nodes[id.0].operator
    }

    /// All nodes with their ids, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// The node feeding input `index` of `id`
    pub fn upstream(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[id.0]
            .inputs
            .get(index)
            .copied()
            .flatten()
            .map(|p| p.node)
    }

    /// The node reading the first output of `id`
    pub fn downstream(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0]
            .outputs
            .first()
            .copied()
            .flatten()
            .map(|p| p.node)
    }

    /// Every output port not yet connected
    pub fn frontier(&self) -> Vec<PortRef> {
        self.nodes()
            .flat_map(|(id, node)| {
                node.outputs
                    .iter()
                    .enumerate()
                    .filter(|(_, o)| o.is_none())
                    .map(move |(index, _)| PortRef { node: id, index })
            })
            .collect()
    }

    /// Nodes from a source to `last`, following the first input of each node
    pub fn chain_to(&self, last: NodeId) -> Vec<NodeId> {
        let mut chain = vec![last];
        let mut current = last;
        while let Some(up) = self.upstream(current, 0) {
            chain.push(up);
            current = up;
        }
        chain.reverse();
        chain
    }

    /// Operator kinds along [`Graph::chain_to`]
    pub fn kinds_to(&self, last: NodeId) -> Vec<OperatorKind> {
        self.chain_to(last)
            .into_iter()
            .map(|id| self.operator(id).kind())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> Operator {
        Operator::Values(Values {
            columns: Vec::new(),
            rows: vec![Vec::new()],
        })
    }

    #[test]
    fn test_linear_chain() {
        let mut graph = Graph::new();
        let source = graph.add_source(values());
        let distinct = graph.add_unary(
            source,
            Operator::Distinct(Distinct {
                group_keys: Vec::new(),
            }),
        );
        let distinct_id = distinct.node();
        assert_eq!(graph.frontier(), vec![distinct.port()]);

        let emit = graph.add_sink(distinct, Operator::Emit(Emit { columns: Vec::new() }));
        assert!(graph.frontier().is_empty());
        assert_eq!(graph.len(), 3);
        assert_eq!(
            graph.kinds_to(emit),
            vec![
                OperatorKind::Values,
                OperatorKind::Distinct,
                OperatorKind::Emit
            ]
        );
        assert_eq!(graph.downstream(distinct_id), Some(emit));
    }

    #[test]
    fn test_binary_ports() {
        let mut graph = Graph::new();
        let left = graph.add_source(values());
        let right = graph.add_source(values());
        let (left_id, right_id) = (left.node(), right.node());
        let join = graph.add_binary(
            left,
            right,
            Operator::Join(Join {
                kind: JoinKind::LeftOuter,
                condition: None,
            }),
        );
        assert_eq!(graph.upstream(join.node(), 0), Some(left_id));
        assert_eq!(graph.upstream(join.node(), 1), Some(right_id));
        assert_eq!(
            graph.node(right_id).outputs()[0],
            Some(PortRef {
                node: join.node(),
                index: 1
            })
        );
        assert_eq!(graph.frontier().len(), 1);
    }
}
