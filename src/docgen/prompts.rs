//! LLM Prompt 模板

/// 系统提示词
pub const SYSTEM_PROMPT: &str = "You are a professional Java developer. Your task is to generate high-quality Javadoc comments that follow best practices.";

/// 单条签名的 Javadoc 生成 Prompt
pub const SIGNATURE_PROMPT: &str = r#"Write a complete Javadoc comment for the following Java {kind} signature.

Signature:
{signature}

Requirements:
- Output ONLY the Javadoc comment block, starting with /** and ending with */.
- Use @param, @return and @throws tags where applicable.
- Do not repeat the signature and do not add any text outside the comment."#;

/// 相关类上下文片段
pub const RELATED_CONTEXT: &str =
    "\n\nRelated classes in this repository: {related}. Reference them with @see tags where it helps.";

/// 组装单条签名的 Prompt
pub fn format_signature_prompt(kind: &str, signature: &str, related: &[String]) -> String {
    let mut prompt = SIGNATURE_PROMPT
        .replace("{kind}", kind)
        .replace("{signature}", signature);

    if !related.is_empty() {
        prompt.push_str(&RELATED_CONTEXT.replace("{related}", &related.join(", ")));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_signature_prompt() {
        let prompt = format_signature_prompt("class", "class Foo", &[]);
        assert!(prompt.contains("Java class signature"));
        assert!(prompt.contains("class Foo"));
        assert!(!prompt.contains("Related classes"));
    }

    #[test]
    fn test_format_signature_prompt_with_related() {
        let related = vec!["Bar".to_string(), "Baz".to_string()];
        let prompt = format_signature_prompt("method", "void run()", &related);
        assert!(prompt.contains("Related classes in this repository: Bar, Baz"));
    }
}
