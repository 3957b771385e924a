//! 声明类型定义

/// 声明种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// 类型声明（class / interface / enum）
    Type,
    /// 成员方法声明
    Member,
}

impl DeclarationKind {
    /// Prompt 与日志中使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Type => "class",
            DeclarationKind::Member => "method",
        }
    }
}

/// 一条类型或成员声明
///
/// `signature` 是声明起点到其类型体/方法体之前的源文本；找不到体时取完整
/// 节点文本。`start_line` 是声明首个 token 在原文件中的行号（0 起始）。
/// 构造完成后在单个文件的处理周期内不再变化。
#[derive(Debug, Clone)]
pub struct Declaration {
    /// 声明种类
    pub kind: DeclarationKind,
    /// 标识符，匿名或未解析时为空
    pub name: Option<String>,
    /// 签名文本（不含体）
    pub signature: String,
    /// 首个 token 所在行（0 起始）
    pub start_line: usize,
    /// 直接成员，仅类型声明持有；嵌套类型不在其中
    pub members: Vec<Declaration>,
}
