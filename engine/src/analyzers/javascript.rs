//! JavaScript/TypeScript analyzer — a real `tree-sitter` parse, dispatched
//! to the TypeScript grammar for `.ts`/`.tsx` and the JavaScript grammar
//! otherwise, following `sibyllinesoft-valknut`'s
//! `registry::get_tree_sitter_language` precedent of using
//! `tree_sitter_typescript::LANGUAGE_TYPESCRIPT` uniformly for the whole
//! TS family rather than a separate TSX grammar (spec §4.2).
//!
//! Decision-point node kinds grounded on the same repo's
//! `ComplexityCalculator::classify_node` (`src/core/ast_service.rs`).

use std::path::Path;

use tree_sitter::{Node, Parser};

use super::complexity::count_decision_points;
use super::Analyzer;
use crate::types::{FunctionComplexity, Language};

fn is_typescript_path(file: &Path) -> bool {
    file.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ts") || e.eq_ignore_ascii_case("tsx"))
}

fn is_decision_point(node: &Node) -> bool {
    match node.kind() {
        "if_statement" | "for_statement" | "for_in_statement" | "while_statement" | "do_statement"
        | "catch_clause" | "switch_case" | "ternary_expression" => true,
        "binary_expression" => node
            .child_by_field_name("operator")
            .is_some_and(|op| matches!(op.kind(), "&&" | "||")),
        _ => false,
    }
}

/// Collect named function declarations, class methods, and function
/// expressions/arrow functions bound to a name via `const`/`let`/`var`.
/// An unbound arrow function or function expression (e.g. an inline
/// callback) is not a separate function.
fn collect_functions<'a>(node: Node<'a>, source: &[u8], out: &mut Vec<(String, Node<'a>)>) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" | "method_definition" => {
            if let Some(name) = node.child_by_field_name("name").and_then(|n| n.utf8_text(source).ok()) {
                out.push((name.to_owned(), node));
            }
        }
        "variable_declarator" => {
            if let (Some(name_node), Some(value)) =
                (node.child_by_field_name("name"), node.child_by_field_name("value"))
            {
                if matches!(value.kind(), "function_expression" | "arrow_function" | "generator_function") {
                    if let Ok(name) = name_node.utf8_text(source) {
                        out.push((name.to_owned(), value));
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
pub struct JavaScriptAnalyzer;

impl Analyzer for JavaScriptAnalyzer {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn supported_extensions(&self) -> &[&str] {
        &["js", "jsx", "ts", "tsx", "mjs", "cjs"]
    }

    fn supports_complexity(&self) -> bool {
        true
    }

    fn supports_imports(&self) -> bool {
        true
    }

    fn extract_functions(&self, file: &Path, contents: &str) -> Vec<FunctionComplexity> {
        let grammar: tree_sitter::Language = if is_typescript_path(file) {
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
        } else {
            tree_sitter_javascript::LANGUAGE.into()
        };

        let mut parser = Parser::new();
        if parser.set_language(&grammar).is_err() {
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
    fn named_function_declaration_is_detected() {
        let src = r#"
function classify(x) {
    if (x > 0 && x < 10) {
        return "small";
    }
    return "other";
}
"#;
        let analyzer = JavaScriptAnalyzer;
        let functions = analyzer.extract_functions(Path::new("a.js"), src);
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "classify");
        assert_eq!(functions[0].complexity, 1 + 1 + 1); // if, &&
    }

    #[test]
    fn arrow_function_assigned_to_const_is_detected() {
        let src = "const add = (a, b) => {\n  return a + b;\n};\n";
        let analyzer = JavaScriptAnalyzer;
        let functions = analyzer.extract_functions(Path::new("b.ts"), src);
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "add");
        assert_eq!(functions[0].complexity, 1);
    }

    #[test]
    fn class_method_shorthand_is_detected_and_control_keywords_excluded() {
        let src = r#"
class Widget {
    render() {
        for (let i = 0; i < 3; i++) {
            if (i === 1) {
                continue;
            }
        }
    }
}
"#;
        let analyzer = JavaScriptAnalyzer;
        let functions = analyzer.extract_functions(Path::new("c.js"), src);
        let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"render"));
        assert!(!names.contains(&"if"));
        assert!(!names.contains(&"for"));
    }

    #[test]
    fn ternary_expression_counts_as_decision_point() {
        let src = "const pick = (x) => {\n  return x > 0 ? 1 : -1;\n};\n";
        let analyzer = JavaScriptAnalyzer;
        let functions = analyzer.extract_functions(Path::new("d.js"), src);
        assert_eq!(functions[0].complexity, 2);
    }
}
