//! Java 结构提取器
//!
//! 用 tree-sitter 解析源码，收集类型声明及其直接成员。遍历是显式工作栈
//! 上的前序遍历，成员通过下标挂到输出序列中自己的直接外层类型上，
//! 深层嵌套的结构不会耗尽调用栈。

use once_cell::sync::Lazy;
use tracing::debug;
use tree_sitter::{Language, Node, Parser};

use super::types::{Declaration, DeclarationKind};

/// Java 语法
static JAVA: Lazy<Language> = Lazy::new(|| tree_sitter_java::LANGUAGE.into());

pub(crate) fn java_language() -> &'static Language {
    &JAVA
}

/// 类型声明节点
const TYPE_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
];

/// 类型体节点
const BODY_KINDS: &[&str] = &["class_body", "interface_body", "enum_body"];

/// 提取错误类型
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("初始化 Java 解析器失败: {0}")]
    Language(String),

    #[error("解析失败")]
    Parse,
}

/// Java 结构提取器
///
/// tree-sitter 的 Parser 不可跨任务共享，每个工作任务各自构造一个。
pub struct JavaExtractor {
    parser: Parser,
}

impl JavaExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        let mut parser = Parser::new();
        parser
            .set_language(java_language())
            .map_err(|e| ExtractError::Language(e.to_string()))?;
        Ok(Self { parser })
    }

    /// 提取声明序列（文档顺序）
    ///
    /// 没有类型声明的文件返回空序列，由调用方决定如何处置。
    pub fn extract(&mut self, source: &str) -> Result<Vec<Declaration>, ExtractError> {
        let tree = self.parser.parse(source, None).ok_or(ExtractError::Parse)?;
        Ok(collect_declarations(tree.root_node(), source))
    }
}

/// 遍历语法树，收集类型声明及其直接成员。
///
/// 工作栈中的每一项是 (节点, 外层类型在输出序列中的下标)。遇到类型声明时
/// 作为独立条目追加，其子树继续以新下标下探，因此嵌套类型是顶层序列中的
/// 兄弟条目，成员只挂在自己的直接外层类型上。不在任何类型体内的方法声明
/// 被丢弃。其余节点种类全部透明下探。
fn collect_declarations(root: Node, source: &str) -> Vec<Declaration> {
    let mut declarations: Vec<Declaration> = Vec::new();
    let mut stack: Vec<(Node, Option<usize>)> = vec![(root, None)];

    while let Some((node, enclosing)) = stack.pop() {
        if TYPE_KINDS.contains(&node.kind()) {
            declarations.push(Declaration {
                kind: DeclarationKind::Type,
                name: node_name(node, source),
                signature: signature_text(node, source),
                start_line: node.start_position().row,
                members: Vec::new(),
            });
            let index = declarations.len() - 1;
            push_children(&mut stack, node, Some(index));
        } else if node.kind() == "method_declaration" {
            match enclosing {
                Some(index) => declarations[index].members.push(Declaration {
                    kind: DeclarationKind::Member,
                    name: node_name(node, source),
                    signature: signature_text(node, source),
                    start_line: node.start_position().row,
                    members: Vec::new(),
                }),
                None => debug!(
                    "忽略位于类型之外的方法声明 (line {})",
                    node.start_position().row + 1
                ),
            }
        } else {
            push_children(&mut stack, node, enclosing);
        }
    }

    declarations
}

/// 子节点逆序入栈，保证出栈顺序为文档顺序
fn push_children<'a>(stack: &mut Vec<(Node<'a>, Option<usize>)>, node: Node<'a>, enclosing: Option<usize>) {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    for child in children.into_iter().rev() {
        stack.push((child, enclosing));
    }
}

/// 签名文本：节点起点到体节点起点；没有体时取完整节点
fn signature_text(node: Node, source: &str) -> String {
    let mut cursor = node.walk();
    let end = node
        .children(&mut cursor)
        .find(|child| BODY_KINDS.contains(&child.kind()) || child.kind() == "block")
        .map(|body| body.start_byte())
        .unwrap_or_else(|| node.end_byte());
    source[node.start_byte()..end].trim().to_string()
}

fn node_name(node: Node, source: &str) -> Option<String> {
    node.child_by_field_name("name")
        .and_then(|name| name.utf8_text(source.as_bytes()).ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Vec<Declaration> {
        JavaExtractor::new().unwrap().extract(source).unwrap()
    }

    #[test]
    fn test_single_line_class_with_method() {
        let declarations = extract("class Foo { void bar() {} }");

        assert_eq!(declarations.len(), 1);
        let class = &declarations[0];
        assert_eq!(class.kind, DeclarationKind::Type);
        assert_eq!(class.name.as_deref(), Some("Foo"));
        assert_eq!(class.signature, "class Foo");
        assert_eq!(class.start_line, 0);

        assert_eq!(class.members.len(), 1);
        let method = &class.members[0];
        assert_eq!(method.kind, DeclarationKind::Member);
        assert_eq!(method.name.as_deref(), Some("bar"));
        assert_eq!(method.signature, "void bar()");
        assert_eq!(method.start_line, 0);
    }

    #[test]
    fn test_start_lines_increase_in_document_order() {
        let source = "\
class Alpha {
    int first() {
        return 1;
    }

    int second() {
        return 2;
    }
}";
        let declarations = extract(source);

        assert_eq!(declarations.len(), 1);
        let class = &declarations[0];
        assert_eq!(class.start_line, 0);
        assert_eq!(class.members.len(), 2);
        assert_eq!(class.members[0].name.as_deref(), Some("first"));
        assert_eq!(class.members[0].start_line, 1);
        assert_eq!(class.members[1].name.as_deref(), Some("second"));
        assert_eq!(class.members[1].start_line, 5);
        assert!(class.members[0].start_line < class.members[1].start_line);
    }

    #[test]
    fn test_nested_class_is_independent_declaration() {
        let source = "\
class Outer {
    void outerMethod() {}

    class Inner {
        void innerMethod() {}
    }
}";
        let declarations = extract(source);

        // 嵌套类型是顶层序列中的独立条目，不是外层类型的成员
        assert_eq!(declarations.len(), 2);

        let outer = &declarations[0];
        assert_eq!(outer.name.as_deref(), Some("Outer"));
        assert_eq!(outer.members.len(), 1);
        assert_eq!(outer.members[0].name.as_deref(), Some("outerMethod"));

        let inner = &declarations[1];
        assert_eq!(inner.name.as_deref(), Some("Inner"));
        assert_eq!(inner.start_line, 3);
        // 二层嵌套的成员挂在直接外层类型上
        assert_eq!(inner.members.len(), 1);
        assert_eq!(inner.members[0].name.as_deref(), Some("innerMethod"));
    }

    #[test]
    fn test_interface_method_without_body_uses_full_span() {
        let source = "\
interface Greeter {
    String greet(String name);
}";
        let declarations = extract(source);

        assert_eq!(declarations.len(), 1);
        let interface = &declarations[0];
        assert_eq!(interface.name.as_deref(), Some("Greeter"));
        assert_eq!(interface.signature, "interface Greeter");
        assert_eq!(interface.members.len(), 1);
        // 抽象方法没有 block，签名覆盖整个节点
        assert!(interface.members[0].signature.starts_with("String greet(String name)"));
    }

    #[test]
    fn test_enum_members_attach_to_enum() {
        let source = "\
enum Color {
    RED, GREEN;

    String label() {
        return name();
    }
}";
        let declarations = extract(source);

        assert_eq!(declarations.len(), 1);
        let color = &declarations[0];
        assert_eq!(color.name.as_deref(), Some("Color"));
        assert_eq!(color.signature, "enum Color");
        assert_eq!(color.members.len(), 1);
        assert_eq!(color.members[0].name.as_deref(), Some("label"));
    }

    #[test]
    fn test_file_without_type_declarations_yields_empty() {
        assert!(extract("// just a comment\n").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn test_signature_keeps_modifiers_and_generics() {
        let source = "public abstract class Box<T> extends Base implements Holder<T> {\n}";
        let declarations = extract(source);

        assert_eq!(declarations.len(), 1);
        assert_eq!(
            declarations[0].signature,
            "public abstract class Box<T> extends Base implements Holder<T>"
        );
    }
}
