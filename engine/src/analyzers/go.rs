//! Go analyzer — a real `tree-sitter` parse of the Go grammar, per spec
//! §4.2's "use the host's Go parser; walk the AST".
//!
//! Grounded on `sibyllinesoft-valknut`'s `GoAdapter`
//! (`src/lang/adapters/go.rs`) for parser construction, and its
//! `ComplexityCalculator::classify_node`
//! (`src/core/ast_service.rs`) for which node kinds count as decision
//! points.

use std::path::Path;

use tree_sitter::{Node, Parser};

use super::complexity::count_decision_points;
use super::Analyzer;
use crate::types::{FunctionComplexity, Language};

fn go_language() -> tree_sitter::Language {
    tree_sitter_go::LANGUAGE.into()
}

fn is_decision_point(node: &Node) -> bool {
    match node.kind() {
        "if_statement" | "for_statement" | "expression_case" | "type_case" | "communication_case" => true,
        "binary_expression" => node
            .child_by_field_name("operator")
            .is_some_and(|op| matches!(op.kind(), "&&" | "||")),
        _ => false,
    }
}

/// Collect every named function body: `function_declaration` and
/// `method_declaration` nodes directly, plus a `func_literal` bound to a
/// name via `:=` (Go has no local named-function syntax otherwise).
fn collect_functions<'a>(node: Node<'a>, source: &[u8], out: &mut Vec<(String, Node<'a>)>) {
    match node.kind() {
        "function_declaration" | "method_declaration" => {
            if let Some(name) = node.child_by_field_name("name").and_then(|n| n.utf8_text(source).ok()) {
                out.push((name.to_owned(), node));
            }
        }
        "short_var_declaration" => {
            if let (Some(left), Some(right)) =
                (node.child_by_field_name("left"), node.child_by_field_name("right"))
            {
                if right.kind() == "func_literal" {
                    if let Ok(name) = left.utf8_text(source) {
                        out.push((name.trim().to_owned(), right));
                    }
                }
            }
        }
        _ => {}
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_functions(child, source, out);
    }
}

#[derive(Debug, Default)]
pub struct GoAnalyzer;

impl Analyzer for GoAnalyzer {
    fn language(&self) -> Language {
        Language::Go
    }

    fn supported_extensions(&self) -> &[&str] {
        &["go"]
    }

    fn supports_complexity(&self) -> bool {
        true
    }

    fn supports_imports(&self) -> bool {
        true
    }

    fn extract_functions(&self, file: &Path, contents: &str) -> Vec<FunctionComplexity> {
        let mut parser = Parser::new();
        if parser.set_language(&go_language()).is_err() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_if_and_and_and_for_as_decision_points() {
        let src = r#"
package main

func process(items []int) int {
	total := 0
	for _, item := range items {
		if item > 0 && item < 100 {
			total += item
		}
	}
	return total
}
"#;
        let analyzer = GoAnalyzer;
        let functions = analyzer.extract_functions(Path::new("a.go"), src);
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "process");
        assert_eq!(functions[0].complexity, 1 + 1 + 1 + 1); // for, if, &&
    }

    #[test]
    fn empty_function_has_complexity_one() {
        let src = "package main\n\nfunc noop() {\n}\n";
        let analyzer = GoAnalyzer;
        let functions = analyzer.extract_functions(Path::new("b.go"), src);
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].complexity, 1);
    }

    #[test]
    fn method_with_receiver_is_detected() {
        let src = "package main\n\nfunc (s *Server) Handle() {\n\tif s.ready {\n\t}\n}\n";
        let analyzer = GoAnalyzer;
        let functions = analyzer.extract_functions(Path::new("c.go"), src);
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "Handle");
        assert_eq!(functions[0].complexity, 2);
    }

    #[test]
    fn string_containing_keyword_is_not_counted() {
        let src = "package main\n\nfunc f() {\n\ts := \"if this && that\"\n\t_ = s\n}\n";
        let analyzer = GoAnalyzer;
        let functions = analyzer.extract_functions(Path::new("d.go"), src);
        assert_eq!(functions[0].complexity, 1);
    }
}
