//! 插入规划与合并
//!
//! 把 (目标行, 注释块) 集合按行号降序写回原文。低处的插入不会移动高处行
//! 的下标，因此从最大行号往最小行号应用时，每个目标行在执行时始终有效，
//! 不需要额外的偏移簿记。

use tracing::info;

/// 注释开始标记
const COMMENT_OPEN: &str = "/**";

/// 待执行的一次插入
#[derive(Debug, Clone)]
pub struct Insertion {
    /// 目标行（0 起始），注释插在该行之前
    pub line: usize,
    /// 完整的注释块文本
    pub comment: String,
}

/// 判断目标行上方是否已有文档注释
///
/// 只检查紧邻的上一行：去除首尾空白后以 `/**` 开头即视为已有注释。
/// 这是单行启发式，不校验既有注释是否完整。
pub fn has_doc_comment_above<S: AsRef<str>>(lines: &[S], line: usize) -> bool {
    if line == 0 {
        return false;
    }
    match lines.get(line - 1) {
        Some(previous) => previous.as_ref().trim().starts_with(COMMENT_OPEN),
        None => false,
    }
}

/// 应用全部插入，返回新文本
///
/// 没有插入项、或所有插入都被已有注释挡掉时返回 `None`，调用方保持文件
/// 原样。目标行相同的插入保持输入顺序。换行符风格沿用原文件。
pub fn apply_insertions(original: &str, mut insertions: Vec<Insertion>) -> Option<String> {
    if insertions.is_empty() {
        return None;
    }

    let terminator = if original.contains("\r\n") { "\r\n" } else { "\n" };
    let mut lines: Vec<String> = original
        .split(terminator)
        .map(|line| line.to_string())
        .collect();

    // 稳定降序排序
    insertions.sort_by(|a, b| b.line.cmp(&a.line));

    let mut inserted = 0usize;
    for insertion in insertions {
        let line = insertion.line.min(lines.len());
        if has_doc_comment_above(&lines, line) {
            info!("第 {} 行上方已有 Javadoc，跳过插入", line + 1);
            continue;
        }

        let comment = if terminator == "\r\n" {
            insertion.comment.replace("\r\n", "\n").replace('\n', "\r\n")
        } else {
            insertion.comment
        };
        lines.insert(line, comment);
        inserted += 1;
    }

    if inserted == 0 {
        return None;
    }
    Some(lines.join(terminator))
}
