//! Python analyzer — a real `tree-sitter` parse of the Python grammar
//! (spec §4.2), replacing the indentation-tracking text scan the other
//! analyzers also used to rely on.
//!
//! Grounded on `sibyllinesoft-valknut`'s `PythonAdapter`
//! (`src/lang/adapters/python.rs`) for parser construction and its
//! `ComplexityCalculator::classify_node` (`src/core/ast_service.rs`) for
//! decision-point node kinds.

use std::path::Path;

use tree_sitter::{Node, Parser};

use super::complexity::count_decision_points;
use super::Analyzer;
use crate::types::{FunctionComplexity, Language};

fn python_language() -> tree_sitter::Language {
    tree_sitter_python::LANGUAGE.into()
}

fn is_decision_point(node: &Node) -> bool {
    match node.kind() {
        "if_statement" | "elif_clause" | "for_statement" | "while_statement" | "except_clause"
        | "conditional_expression" => true,
        "boolean_operator" => node
            .child_by_field_name("operator")
            .is_some_and(|op| matches!(op.kind(), "and" | "or")),
        _ => false,
    }
}

/// Collect `def`/`async def` bodies directly, plus a `lambda` bound to a
/// name via `=` (an unassigned lambda is not a separate function).
fn collect_functions<'a>(node: Node<'a>, source: &[u8], out: &mut Vec<(String, Node<'a>)>) {
    match node.kind() {
        "function_definition" => {
            if let Some(name) = node.child_by_field_name("name").and_then(|n| n.utf8_text(source).ok()) {
                out.push((name.to_owned(), node));
            }
        }
        "assignment" => {
            if let (Some(left), Some(right)) =
                (node.child_by_field_name("left"), node.child_by_field_name("right"))
            {
                if right.kind() == "lambda" {
                    if let Ok(name) = left.utf8_text(source) {
                        out.push((name.to_owned(), right));
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
pub struct PythonAnalyzer;

impl Analyzer for PythonAnalyzer {
    fn language(&self) -> Language {
        Language::Python
    }

    fn supported_extensions(&self) -> &[&str] {
        &["py"]
    }

    fn supports_complexity(&self) -> bool {
        true
    }

    fn supports_imports(&self) -> bool {
        true
    }

    fn extract_functions(&self, file: &Path, contents: &str) -> Vec<FunctionComplexity> {
        let mut parser = Parser::new();
        if parser.set_language(&python_language()).is_err() {
            return Vec::new();
        }
        let Some(tree) = parser.parse(contents, None) else {
            return Vec::new();
        };

        let source = contents.as_bytes();
        let mut functions = Vec::new();
        collect_functions(tree.root_node(), source, &mut functions);
        functions.sort_by_key(|(_, node)| node.start_byte());

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
    fn counts_if_elif_and_boolean_operators() {
        let src = "def classify(x):\n    if x > 0 and x < 10:\n        return 'small'\n    elif x >= 10:\n        return 'big'\n    return 'other'\n";
        let analyzer = PythonAnalyzer;
        let functions = analyzer.extract_functions(Path::new("a.py"), src);
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "classify");
        assert_eq!(functions[0].complexity, 1 + 1 + 1 + 1); // if, and, elif
    }

    #[test]
    fn nested_def_is_a_separate_function() {
        let src = "def outer():\n    def inner():\n        if True:\n            pass\n    return inner\n";
        let analyzer = PythonAnalyzer;
        let functions = analyzer.extract_functions(Path::new("b.py"), src);
        let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"outer"));
        assert!(names.contains(&"inner"));
    }

    #[test]
    fn ends_at_dedent() {
        let src = "class Foo:\n    def bar(self):\n        return 1\n\n    def baz(self):\n        return 2\n";
        let analyzer = PythonAnalyzer;
        let functions = analyzer.extract_functions(Path::new("c.py"), src);
        assert_eq!(functions.len(), 2);
        assert_eq!(functions[0].name, "bar");
        assert_eq!(functions[0].length, 2);
    }

    #[test]
    fn string_containing_keyword_is_not_counted() {
        let src = "def f():\n    s = 'if this and that'\n    return s\n";
        let analyzer = PythonAnalyzer;
        let functions = analyzer.extract_functions(Path::new("d.py"), src);
        assert_eq!(functions[0].complexity, 1);
    }

    #[test]
    fn except_clauses_count_as_decisions() {
        let src = "def safe():\n    try:\n        risky()\n    except ValueError:\n        pass\n    except KeyError:\n        pass\n";
        let analyzer = PythonAnalyzer;
        let functions = analyzer.extract_functions(Path::new("e.py"), src);
        assert_eq!(functions[0].complexity, 1 + 2);
    }
}
