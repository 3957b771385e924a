//! 类关系辅助文件
//!
//! 预扫描仓库内全部类，记录每个类引用到的仓库内其它类名，写入
//! class_relationships.json，供 Prompt 补充相关类上下文。对提取与合并的
//! 正确性没有影响，构建失败只会让 Prompt 少一些上下文。

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tree_sitter::Parser;

use crate::error::{AppError, AppResult};
use crate::extract::java_language;

/// 类名到仓库内依赖类名的映射
#[derive(Debug, Default)]
pub struct ClassRelationships {
    relationships: BTreeMap<String, Vec<String>>,
}

impl ClassRelationships {
    /// 扫描文件集合，构建关系映射
    ///
    /// 两步：先为每个文件取出主类名和它引用到的全部类名，再把引用过滤到
    /// 仓库内已知的类。读不出或解析不出的文件跳过并记录日志。
    pub fn build(files: &[PathBuf]) -> AppResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(java_language())
            .map_err(|e| AppError::Extract(e.to_string()))?;

        let mut analyzed: Vec<(String, BTreeSet<String>)> = Vec::new();
        for path in files {
            let source = match fs::read_to_string(path) {
                Ok(source) => source,
                Err(e) => {
                    warn!("读取 {} 失败，跳过关系分析: {}", path.display(), e);
                    continue;
                }
            };
            match analyze_source(&mut parser, &source) {
                Some(entry) => analyzed.push(entry),
                None => debug!("{} 中没有可分析的类", path.display()),
            }
        }

        let known: BTreeSet<String> = analyzed.iter().map(|(name, _)| name.clone()).collect();

        let relationships = analyzed
            .into_iter()
            .map(|(name, references)| {
                let internal: Vec<String> = references
                    .into_iter()
                    .filter(|reference| known.contains(reference))
                    .collect();
                (name, internal)
            })
            .collect();

        Ok(Self { relationships })
    }

    /// 某个类的仓库内依赖；未知类返回空
    pub fn related_to(&self, class_name: &str) -> &[String] {
        self.relationships
            .get(class_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 已记录的类数量
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// 序列化并写入辅助文件
    pub fn save(&self, path: &Path) -> AppResult<()> {
        let content = serde_json::to_string_pretty(&self.relationships)
            .map_err(|e| AppError::Extract(format!("序列化类关系失败: {}", e)))?;
        fs::write(path, content)?;
        debug!("类关系已保存: {}", path.display());
        Ok(())
    }
}

/// 取出一个文件的主类名和它引用到的类名集合
fn analyze_source(parser: &mut Parser, source: &str) -> Option<(String, BTreeSet<String>)> {
    let tree = parser.parse(source, None)?;
    let mut class_name: Option<String> = None;
    let mut references: BTreeSet<String> = BTreeSet::new();

    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "class_declaration" | "interface_declaration" | "enum_declaration" => {
                if class_name.is_none() {
                    class_name = node
                        .child_by_field_name("name")
                        .and_then(|name| name.utf8_text(source.as_bytes()).ok())
                        .map(str::to_string);
                }
            }
            "import_declaration" => {
                if let Ok(text) = node.utf8_text(source.as_bytes()) {
                    if let Some(leaf) = import_leaf(text) {
                        references.insert(leaf);
                    }
                }
            }
            "type_identifier" => {
                if let Ok(text) = node.utf8_text(source.as_bytes()) {
                    references.insert(text.to_string());
                }
            }
            _ => {}
        }

        // 逆序入栈，出栈即文档顺序，保证取到的是文件中的第一个类型
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        for child in children.into_iter().rev() {
            stack.push(child);
        }
    }

    let name = class_name?;
    references.remove(&name);
    Some((name, references))
}

/// 导入语句的最后一段类名；通配符导入给不出具体类名
fn import_leaf(text: &str) -> Option<String> {
    let path = text
        .trim()
        .strip_prefix("import")?
        .trim()
        .trim_start_matches("static")
        .trim()
        .trim_end_matches(';')
        .trim();

    if path.is_empty() || path.ends_with('*') {
        return None;
    }
    path.rsplit('.').next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_source(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_build_keeps_only_repository_classes() {
        let dir = TempDir::new().unwrap();
        let a = write_source(
            &dir,
            "A.java",
            "import java.util.List;\nclass A {\n    B helper;\n    List<String> names;\n}",
        );
        let b = write_source(&dir, "B.java", "class B {}");

        let relationships = ClassRelationships::build(&[a, b]).unwrap();

        assert_eq!(relationships.len(), 2);
        // List 来自 JDK，不在仓库内，被过滤掉
        assert_eq!(relationships.related_to("A"), ["B".to_string()]);
        assert!(relationships.related_to("B").is_empty());
        assert!(relationships.related_to("Unknown").is_empty());
    }

    #[test]
    fn test_import_leaf() {
        assert_eq!(
            import_leaf("import java.util.List;"),
            Some("List".to_string())
        );
        assert_eq!(
            import_leaf("import static org.junit.Assert.assertEquals;"),
            Some("assertEquals".to_string())
        );
        assert_eq!(import_leaf("import java.util.*;"), None);
    }

    #[test]
    fn test_save_writes_side_file() {
        let dir = TempDir::new().unwrap();
        let a = write_source(&dir, "A.java", "class A { B b; }");
        let b = write_source(&dir, "B.java", "class B {}");

        let relationships = ClassRelationships::build(&[a, b]).unwrap();
        let side_file = dir.path().join("class_relationships.json");
        relationships.save(&side_file).unwrap();

        let content = fs::read_to_string(&side_file).unwrap();
        let parsed: BTreeMap<String, Vec<String>> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.get("A"), Some(&vec!["B".to_string()]));
    }
}
