//! Language-aware source outlines
//!
//! An outline lists imports, functions and classes in document order. The
//! rule engine checks imports and function lengths against it; the codebase
//! index counts its items.

use std::collections::HashMap;
use std::sync::Arc;
use tree_sitter::{Node, Parser};
use tracing::debug;

/// One import occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    /// Full dotted name for `import x.y`, the module for `from x.y import z`
    pub module: String,
    /// 1-based line
    pub line: usize,
    pub from_form: bool,
}

impl ImportItem {
    /// Name matched against forbidden imports: the whole dotted name for
    /// `import`, only the top-level package for `from ... import`
    pub fn checked_name(&self) -> &str {
        if self.from_form {
            self.module.split('.').next().unwrap_or(&self.module)
        } else {
            &self.module
        }
    }
}

/// A function or class span, 1-based and inclusive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionItem {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
}

impl DefinitionItem {
    pub fn line_count(&self) -> usize {
        self.end_line + 1 - self.start_line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineItem {
    Import(ImportItem),
    Function(DefinitionItem),
    Class(DefinitionItem),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceOutline {
    pub items: Vec<OutlineItem>,
}

impl SourceOutline {
    pub fn imports(&self) -> impl Iterator<Item = &ImportItem> {
        self.items.iter().filter_map(|item| match item {
            OutlineItem::Import(import) => Some(import),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &DefinitionItem> {
        self.items.iter().filter_map(|item| match item {
            OutlineItem::Function(function) => Some(function),
            _ => None,
        })
    }

    pub fn classes(&self) -> impl Iterator<Item = &DefinitionItem> {
        self.items.iter().filter_map(|item| match item {
            OutlineItem::Class(class) => Some(class),
            _ => None,
        })
    }
}

/// Extracts an outline from source text
pub trait LanguageAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when the source does not parse
    fn outline(&self, source: &str) -> Option<SourceOutline>;
}

/// Fallback for languages without an analyzer
#[derive(Debug, Default)]
pub struct NoopAnalyzer;

impl LanguageAnalyzer for NoopAnalyzer {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn outline(&self, _source: &str) -> Option<SourceOutline> {
        Some(SourceOutline::default())
    }
}

/// Python outlines via tree-sitter
#[derive(Debug, Default)]
pub struct PythonAnalyzer;

impl PythonAnalyzer {
    fn parse(source: &str) -> Option<tree_sitter::Tree> {
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&tree_sitter_python::LANGUAGE.into()) {
            debug!("Failed to load Python grammar: {}", e);
            return None;
        }
        parser.parse(source, None)
    }

    fn collect(node: Node<'_>, source: &[u8], items: &mut Vec<OutlineItem>) {
        match node.kind() {
            "import_statement" => {
                let mut cursor = node.walk();
                for name in node.children_by_field_name("name", &mut cursor) {
                    let dotted = if name.kind() == "aliased_import" {
                        name.child_by_field_name("name")
                    } else {
                        Some(name)
                    };
                    if let Some(module) = dotted.and_then(|n| n.utf8_text(source).ok()) {
                        items.push(OutlineItem::Import(ImportItem {
                            module: module.to_string(),
                            line: node.start_position().row + 1,
                            from_form: false,
                        }));
                    }
                }
            }
            "import_from_statement" => {
                if let Some(module) = node.child_by_field_name("module_name").and_then(|n| from_module(n, source)) {
                    items.push(OutlineItem::Import(ImportItem {
                        module,
                        line: node.start_position().row + 1,
                        from_form: true,
                    }));
                }
            }
            "function_definition" => {
                if let Some(item) = definition(node, source) {
                    items.push(OutlineItem::Function(item));
                }
            }
            "class_definition" => {
                if let Some(item) = definition(node, source) {
                    items.push(OutlineItem::Class(item));
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            Self::collect(child, source, items);
        }
    }
}

/// Module of a `from` import; relative imports keep only their dotted part
fn from_module(node: Node<'_>, source: &[u8]) -> Option<String> {
    let text = node.utf8_text(source).ok()?;
    let module = text.trim_start_matches('.');
    if module.is_empty() { None } else { Some(module.to_string()) }
}

fn definition(node: Node<'_>, source: &[u8]) -> Option<DefinitionItem> {
    let name = node.child_by_field_name("name")?.utf8_text(source).ok()?;
    let start = node.start_position();
    let end = node.end_position();
    // A span ending at column 0 stops before that line
    let end_row = if end.column == 0 && end.row > start.row { end.row - 1 } else { end.row };

    Some(DefinitionItem {
        name: name.to_string(),
        start_line: start.row + 1,
        end_line: end_row + 1,
    })
}

impl LanguageAnalyzer for PythonAnalyzer {
    fn name(&self) -> &'static str {
        "python"
    }

    fn outline(&self, source: &str) -> Option<SourceOutline> {
        let tree = Self::parse(source)?;
        let root = tree.root_node();
        if root.has_error() {
            debug!("Python source has syntax errors, skipping outline");
            return None;
        }

        let mut items = Vec::new();
        Self::collect(root, source.as_bytes(), &mut items);
        Some(SourceOutline { items })
    }
}

/// Analyzers keyed by dotted extension
#[derive(Clone)]
pub struct AnalyzerRegistry {
    analyzers: HashMap<String, Arc<dyn LanguageAnalyzer>>,
    fallback: Arc<dyn LanguageAnalyzer>,
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        let mut registry = Self {
            analyzers: HashMap::new(),
            fallback: Arc::new(NoopAnalyzer),
        };
        registry.register(".py", Arc::new(PythonAnalyzer));
        registry
    }
}

impl AnalyzerRegistry {
    pub fn register(&mut self, extension: &str, analyzer: Arc<dyn LanguageAnalyzer>) {
        self.analyzers.insert(extension.to_string(), analyzer);
    }

    pub fn for_extension(&self, extension: Option<&str>) -> &dyn LanguageAnalyzer {
        extension
            .and_then(|ext| self.analyzers.get(ext))
            .unwrap_or(&self.fallback)
            .as_ref()
    }
}
