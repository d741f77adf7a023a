// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Graph and scalar inspection helpers and custom assertions

use relsql_ir::{Graph, NodeId, Operator, OperatorKind, Scalar};

/// Custom assertion helpers for compiled graphs
pub struct GraphAssertions;

impl GraphAssertions {
    /// Assert the operator kinds along the primary input chain ending at `last`
    pub fn assert_chain(graph: &Graph, last: NodeId, expected: &[OperatorKind]) {
        let actual = graph.kinds_to(last);
        assert_eq!(
            actual, expected,
            "operator chain mismatch, graph: {graph:#?}"
        );
    }

    /// Assert every port of every node is connected
    pub fn assert_connected(graph: &Graph) {
        for (id, node) in graph.nodes() {
            assert!(
                node.inputs().iter().all(Option::is_some),
                "node {id:?} has an unconnected input"
            );
            assert!(
                node.outputs().iter().all(Option::is_some),
                "node {id:?} has an unconnected output"
            );
        }
    }
}

/// Number of nodes of `kind` in `graph`
pub fn count_kind(graph: &Graph, kind: OperatorKind) -> usize {
    graph
        .nodes()
        .filter(|(_, node)| node.operator.kind() == kind)
        .count()
}

/// The first node of `kind` in insertion order
pub fn find_operator(graph: &Graph, kind: OperatorKind) -> Option<(NodeId, &Operator)> {
    graph
        .nodes()
        .find(|(_, node)| node.operator.kind() == kind)
        .map(|(id, node)| (id, &node.operator))
}

/// Number of `let` declarators anywhere in `expr`
pub fn count_let_declarators(expr: &Scalar) -> usize {
    let own = match expr {
        Scalar::Let { declarators, .. } => declarators.len(),
        _ => 0,
    };
    own + expr
        .children()
        .into_iter()
        .map(count_let_declarators)
        .sum::<usize>()
}

#[cfg(test)]
mod tests {
    use relsql_ir::plan::{Filter, Values};
    use relsql_ir::{Type, Value};

    use super::*;

    fn chain() -> (Graph, NodeId) {
        let mut graph = Graph::new();
        let values = graph.add_source(Operator::Values(Values {
            columns: Vec::new(),
            rows: vec![Vec::new()],
        }));
        let filter = graph.add_unary(
            values,
            Operator::Filter(Filter {
                condition: Scalar::immediate(Value::Boolean(true), Type::Boolean),
            }),
        );
        (graph, filter.node())
    }

    #[test]
    fn test_chain_and_counts() {
        let (graph, last) = chain();
        GraphAssertions::assert_chain(&graph, last, &[OperatorKind::Values, OperatorKind::Filter]);
        assert_eq!(count_kind(&graph, OperatorKind::Filter), 1);
        assert!(find_operator(&graph, OperatorKind::Scan).is_none());
    }

    #[test]
    fn test_no_lets_in_immediate() {
        let expr = Scalar::immediate(Value::Int4(1), Type::Int4);
        assert_eq!(count_let_declarators(&expr), 0);
    }
}
