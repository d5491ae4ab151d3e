//! Shared `tree-sitter` walking helper for the per-language analyzers.
//!
//! Grounded on `sibyllinesoft-valknut`'s `ComplexityCalculator`
//! (`src/core/ast_service.rs`): a recursive descent over
//! `node.children(&mut cursor)` that asks a per-language predicate
//! whether each visited node is a decision point. Unlike the teacher's
//! calculator this only accumulates a count — nesting depth and
//! cognitive complexity have no counterpart in [`FunctionComplexity`].

use tree_sitter::Node;

/// Count every node in the subtree rooted at `node` (including `node`
/// itself) for which `is_decision` returns true.
pub fn count_decision_points(node: Node, is_decision: &dyn Fn(&Node) -> bool) -> u32 {
    let mut total = u32::from(is_decision(&node));
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        total += count_decision_points(child, is_decision);
    }
    total
}
