//! 批处理调度器
//!
//! 把候选文件切成批次：批内用有界并发处理，批间严格串行，前一批的所有
//! 文件（无论成败）都完成后才提交下一批。单个文件内部的生成调用严格
//! 串行（类型在前，成员按提取顺序），文件之间没有顺序保证。单个文件的
//! 失败只记账，不影响同批的其他文件。

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, error, info};

use super::generator::CommentSource;
use super::merge::{self, Insertion};
use super::relationships::ClassRelationships;
use crate::config::ProcessingConfig;
use crate::extract::{Declaration, JavaExtractor};

/// 单个文件的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    /// 已写回新内容
    Written,
    /// 无需修改，文件保持原样
    Unchanged,
}

/// 单个文件的处理错误
#[derive(Debug, thiserror::Error)]
enum FileError {
    #[error("读取失败: {0}")]
    Read(#[source] std::io::Error),

    #[error("写入失败: {0}")]
    Write(#[source] std::io::Error),

    #[error(transparent)]
    Extract(#[from] crate::extract::ExtractError),

    #[error("未找到任何类型声明")]
    NoDeclarations,
}

/// 一次运行的汇总统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// 提交处理的文件总数
    pub total: usize,
    /// 写回了新内容的文件数
    pub written: usize,
    /// 无需修改的文件数
    pub unchanged: usize,
    /// 失败的文件数
    pub failed: usize,
}

/// 批处理调度器
pub struct BatchProcessor {
    comments: Arc<dyn CommentSource>,
    relationships: Arc<ClassRelationships>,
    config: ProcessingConfig,
}

impl BatchProcessor {
    pub fn new(
        comments: Arc<dyn CommentSource>,
        relationships: Arc<ClassRelationships>,
        config: ProcessingConfig,
    ) -> Self {
        Self {
            comments,
            relationships,
            config,
        }
    }

    /// 处理全部文件，返回汇总统计
    pub async fn run(&self, files: Vec<PathBuf>) -> RunStats {
        let total = files.len();
        let batch_size = self.config.batch_size.max(1);
        // 限制并行度（最小1，最大10）
        let concurrency = self.config.max_concurrent_tasks.clamp(1, 10);
        let batch_count = total.div_ceil(batch_size);

        info!(
            "Processing {} files in {} batches (batch size {}, concurrency {})",
            total, batch_count, batch_size, concurrency
        );

        let written = Arc::new(AtomicUsize::new(0));
        let unchanged = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        for (index, batch) in files.chunks(batch_size).enumerate() {
            info!(
                "Starting batch {}/{} ({} files)",
                index + 1,
                batch_count,
                batch.len()
            );

            stream::iter(batch.iter().cloned())
                .for_each_concurrent(concurrency, |path| {
                    let written = Arc::clone(&written);
                    let unchanged = Arc::clone(&unchanged);
                    let failed = Arc::clone(&failed);

                    async move {
                        match self.process_file(&path).await {
                            Ok(FileOutcome::Written) => {
                                written.fetch_add(1, Ordering::Relaxed);
                                info!("File updated: {}", path.display());
                            }
                            Ok(FileOutcome::Unchanged) => {
                                unchanged.fetch_add(1, Ordering::Relaxed);
                                info!("File already complete: {}", path.display());
                            }
                            Err(e) => {
                                failed.fetch_add(1, Ordering::Relaxed);
                                error!("Processing failed ({}): {}", path.display(), e);
                            }
                        }
                    }
                })
                .await;
        }

        RunStats {
            total,
            written: written.load(Ordering::Relaxed),
            unchanged: unchanged.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
        }
    }

    /// 单个文件：读 -> 提取 -> 生成 -> 合并 -> 写回
    ///
    /// 只有合并后的文本与原文不同才写回，否则文件保持字节不变。
    async fn process_file(&self, path: &Path) -> Result<FileOutcome, FileError> {
        let original = fs::read_to_string(path).await.map_err(FileError::Read)?;

        let mut extractor = JavaExtractor::new()?;
        let declarations = extractor.extract(&original)?;
        if declarations.is_empty() {
            return Err(FileError::NoDeclarations);
        }
        debug!(
            "{}: {} type declarations",
            path.display(),
            declarations.len()
        );

        let insertions = self.collect_insertions(&declarations).await;

        // 本文件的生成调用结束后稍作停顿，避免触发端点限流
        tokio::time::sleep(Duration::from_millis(self.config.rate_limit_pause_ms)).await;

        let merged = match merge::apply_insertions(&original, insertions) {
            Some(merged) => merged,
            None => return Ok(FileOutcome::Unchanged),
        };
        if merged == original {
            return Ok(FileOutcome::Unchanged);
        }

        fs::write(path, &merged).await.map_err(FileError::Write)?;
        Ok(FileOutcome::Written)
    }

    /// 顺序收集插入项：类型在前，随后是它的成员（按提取顺序）
    async fn collect_insertions(&self, declarations: &[Declaration]) -> Vec<Insertion> {
        let mut insertions = Vec::new();

        for declaration in declarations {
            let related = declaration
                .name
                .as_deref()
                .map(|name| self.relationships.related_to(name))
                .unwrap_or(&[]);

            if let Some(comment) = self.comments.generate(declaration, related).await {
                insertions.push(Insertion {
                    line: declaration.start_line,
                    comment,
                });
            }

            for member in &declaration.members {
                if let Some(comment) = self.comments.generate(member, related).await {
                    insertions.push(Insertion {
                        line: member.start_line,
                        comment,
                    });
                }
            }
        }

        insertions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    /// 按声明名产出固定注释的测试桩
    struct StubComments;

    impl CommentSource for StubComments {
        fn generate<'a>(
            &'a self,
            declaration: &'a Declaration,
            _related: &'a [String],
        ) -> BoxFuture<'a, Option<String>> {
            let name = declaration.name.clone().unwrap_or_default();
            Box::pin(async move { Some(format!("/** Docs for {}. */", name)) })
        }
    }

    /// 永远产不出注释的测试桩
    struct SilentComments;

    impl CommentSource for SilentComments {
        fn generate<'a>(
            &'a self,
            _declaration: &'a Declaration,
            _related: &'a [String],
        ) -> BoxFuture<'a, Option<String>> {
            Box::pin(async move { None })
        }
    }

    fn fast_config() -> ProcessingConfig {
        ProcessingConfig {
            rate_limit_pause_ms: 0,
            ..ProcessingConfig::default()
        }
    }

    fn processor(comments: Arc<dyn CommentSource>, config: ProcessingConfig) -> BatchProcessor {
        BatchProcessor::new(comments, Arc::new(ClassRelationships::default()), config)
    }

    fn write_source(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_comments_are_inserted_and_file_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "Foo.java", "class Foo {\n    void bar() {}\n}\n");

        let processor = processor(Arc::new(StubComments), fast_config());
        let stats = processor.run(vec![path.clone()]).await;

        assert_eq!(stats.written, 1);
        assert_eq!(stats.failed, 0);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "/** Docs for Foo. */\nclass Foo {\n/** Docs for bar. */\n    void bar() {}\n}\n"
        );
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "Foo.java", "class Foo {\n    void bar() {}\n}\n");

        let processor = processor(Arc::new(StubComments), fast_config());
        processor.run(vec![path.clone()]).await;
        let after_first = std::fs::read_to_string(&path).unwrap();

        let stats = processor.run(vec![path.clone()]).await;
        let after_second = std::fs::read_to_string(&path).unwrap();

        // 第二遍没有新的插入，文件字节不变
        assert_eq!(stats.written, 0);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_to_one_file() {
        let dir = TempDir::new().unwrap();
        let good_a = write_source(&dir, "A.java", "class A {}\n");
        let missing = dir.path().join("Missing.java");
        let good_b = write_source(&dir, "B.java", "class B {}\n");

        let processor = processor(Arc::new(StubComments), fast_config());
        let stats = processor.run(vec![good_a.clone(), missing, good_b.clone()]).await;

        assert_eq!(stats.total, 3);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.written, 2);

        // 其余文件仍被正确改写
        assert!(std::fs::read_to_string(&good_a)
            .unwrap()
            .starts_with("/** Docs for A. */"));
        assert!(std::fs::read_to_string(&good_b)
            .unwrap()
            .starts_with("/** Docs for B. */"));
    }

    #[tokio::test]
    async fn test_file_without_declarations_fails_but_stays_untouched() {
        let dir = TempDir::new().unwrap();
        let path = write_source(&dir, "Empty.java", "// nothing here\n");

        let processor = processor(Arc::new(StubComments), fast_config());
        let stats = processor.run(vec![path.clone()]).await;

        assert_eq!(stats.failed, 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "// nothing here\n");
    }

    #[tokio::test]
    async fn test_no_generated_comments_leaves_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let source = "class Foo {\n    void bar() {}\n}\n";
        let path = write_source(&dir, "Foo.java", source);

        let processor = processor(Arc::new(SilentComments), fast_config());
        let stats = processor.run(vec![path.clone()]).await;

        assert_eq!(stats.unchanged, 1);
        assert_eq!(stats.written, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), source);
    }

    #[tokio::test]
    async fn test_small_batches_process_every_file() {
        let dir = TempDir::new().unwrap();
        let files: Vec<PathBuf> = (0..5)
            .map(|i| {
                write_source(
                    &dir,
                    &format!("C{}.java", i),
                    &format!("class C{} {{}}\n", i),
                )
            })
            .collect();

        let config = ProcessingConfig {
            batch_size: 2,
            max_concurrent_tasks: 2,
            rate_limit_pause_ms: 0,
            ..ProcessingConfig::default()
        };
        let processor = processor(Arc::new(StubComments), config);
        let stats = processor.run(files).await;

        assert_eq!(stats.total, 5);
        assert_eq!(stats.written, 5);
        assert_eq!(stats.failed, 0);
    }
}
