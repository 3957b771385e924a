//! 源码文件发现
//!
//! 递归收集根目录下的 .java 文件，应用忽略规则与大小上限。

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;

/// 源文件扩展名
const SOURCE_EXTENSION: &str = "java";

/// 扫描错误类型
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("路径不存在: {0}")]
    PathNotFound(PathBuf),

    #[error("路径不是目录: {0}")]
    NotADirectory(PathBuf),
}

/// 文件扫描器
pub struct SourceScanner {
    max_file_size: u64,
    /// 编译后的忽略模式（glob patterns）
    ignore_patterns: Vec<glob::Pattern>,
}

impl SourceScanner {
    /// 创建新的文件扫描器
    pub fn new(config: &ProcessingConfig) -> Self {
        let ignore_patterns = config
            .ignore_patterns
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Invalid ignore pattern '{}': {}", p, e);
                    None
                }
            })
            .collect();

        Self {
            max_file_size: config.max_file_size,
            ignore_patterns,
        }
    }

    /// 扫描根目录，返回按路径排序的候选文件列表
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root.exists() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        info!("Starting source scan: {}", root.display());

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| !self.should_ignore(entry.path(), entry.depth()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("跳过无法访问的目录项: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let is_source = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
                .unwrap_or(false);
            if !is_source {
                continue;
            }

            // 跳过过大的文件
            if let Ok(metadata) = entry.metadata() {
                if metadata.len() > self.max_file_size {
                    debug!(
                        "Skipping oversized file: {} ({} bytes)",
                        path.display(),
                        metadata.len()
                    );
                    continue;
                }
            }

            files.push(path.to_path_buf());
        }

        files.sort();
        info!("Scan completed: {} candidate files", files.len());
        Ok(files)
    }

    /// 是否忽略该目录项（depth 0 是根目录本身，永不忽略）
    fn should_ignore(&self, path: &Path, depth: usize) -> bool {
        if depth == 0 {
            return false;
        }

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };

        // 隐藏文件/目录（以 . 开头）
        if name.starts_with('.') {
            return true;
        }

        self.ignore_patterns.iter().any(|pattern| pattern.matches(name))
    }
}
