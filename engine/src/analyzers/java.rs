//! Java analyzer — a real `tree-sitter` parse of the Java grammar
//! (spec §4.2).
//!
//! Grounded on `ruizrica-drift`'s use of `tree_sitter_java::LANGUAGE`
//! (`crates/drift-core/src/unified/ast_patterns.rs`, the only repo in
//! the pack carrying a Java grammar) for parser construction, and
//! `sibyllinesoft-valknut`'s `ComplexityCalculator::classify_node`
//! (`src/core/ast_service.rs`) for the decision-point node kinds.

use std::path::Path;

use tree_sitter::{Node, Parser};

use super::complexity::count_decision_points;
use super::Analyzer;
use crate::types::{FunctionComplexity, Language};

fn java_language() -> tree_sitter::Language {
    tree_sitter_java::LANGUAGE.into()
}

fn is_decision_point(node: &Node) -> bool {
    match node.kind() {
        "if_statement" | "catch_clause" | "for_statement" | "enhanced_for_statement" | "while_statement"
        | "do_statement" | "ternary_expression" => true,
        "binary_expression" => node
            .child_by_field_name("operator")
            .is_some_and(|op| matches!(op.kind(), "&&" | "||")),
        _ => false,
    }
}

fn collect_functions<'a>(node: Node<'a>, source: &[u8], out: &mut Vec<(String, Node<'a>)>) {
    if matches!(node.kind(), "method_declaration" | "constructor_declaration") {
        if let Some(name) = node.child_by_field_name("name").and_then(|n| n.utf8_text(source).ok()) {
            out.push((name.to_owned(), node));
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_functions(child, source, out);
    }
}

#[derive(Debug, Default)]
pub struct JavaAnalyzer;

impl Analyzer for JavaAnalyzer {
    fn language(&self) -> Language {
        Language::Java
    }

    fn supported_extensions(&self) -> &[&str] {
        &["java"]
    }

    fn supports_complexity(&self) -> bool {
        true
    }

    fn supports_imports(&self) -> bool {
        true
    }

    fn extract_functions(&self, file: &Path, contents: &str) -> Vec<FunctionComplexity> {
        let mut parser = Parser::new();
        if parser.set_language(&java_language()).is_err() {
            return Vec::new();
        }
        let Some(tree) = parser.parse(contents, None) else {
            return Vec::new();
        };

        let source = contents.as_bytes();
        let mut functions = Vec::new();
        collect_functions(tree.root_node(), source, &mut functions);

        let file_label = file.display().to_string();
        functions
            .into_iter()
            .map(|(name, node)| {
                let decisions = count_decision_points(node, &is_decision_point);
                let start_line = node.start_position().row as u32 + 1;
                let end_line = node.end_position().row as u32 + 1;
                FunctionComplexity {
                    name,
                    file: file_label.clone(),
                    line: start_line,
                    complexity: 1 + decisions,
                    length: end_line - start_line + 1,
                }
            })
            .collect()
    }
}
