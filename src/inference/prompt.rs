use crate::subtitle::SubtitleItem;
use super::TranslationRequest;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional subtitle translator. Follow these rules strictly:\n\
1. Output only the translated text. No greeting, no warning, no explanation, no notes.\n\
2. Keep the tone and manner of speech of the original line.\n\
3. Use the surrounding subtitle lines only as context so the translation reads naturally in the dialogue.\n\
4. Keep ellipses (...) where the original has them.\n\
5. Do not wrap the output in quotation marks or brackets.\n\
6. Never output anything that is not the translation.\n\
\n\
Example input:\n\
\"I love you...\"\n\
Correct output:\n\
我愛你...\n\
Wrong outputs:\n\
\"Translation: 我愛你...\"\n\
\"Here is the translation: 我愛你...\"\n\
\"我愛你 (an expression of love)...\"";

/// Lines `[index - radius, index + radius]` of the sequence, clamped to its bounds.
///
/// The current line is included. A radius of zero yields no context at all.
pub fn context_window(items: &[SubtitleItem], index: usize, radius: usize) -> Vec<String> {
    if radius == 0 || items.is_empty() {
        return Vec::new();
    }

    let start = index.saturating_sub(radius);
    let end = (index + radius + 1).min(items.len());
    if start >= end {
        return Vec::new();
    }

    items[start..end].iter().map(|item| item.text.clone()).collect()
}

pub fn build_user_message(request: &TranslationRequest) -> String {
    let language = request.target_language.english_name();
    let source = request.source_language.trim();
    let direction = if source.is_empty() || source.eq_ignore_ascii_case("auto") {
        format!("into {}", language)
    } else {
        format!("from {} into {}", source, language)
    };

    if request.context.is_empty() {
        return format!("Translate the following text {}:\n{}", direction, request.text);
    }

    // serde_json keeps non-ASCII characters as-is
    let context = serde_json::to_string(&request.context).unwrap_or_default();

    format!(
        "Subtitle lines around the current one, for reference only:\n{}\nTranslate the current subtitle {}:\n'{}'",
        context, direction, request.text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetLanguage;

    fn items(n: usize) -> Vec<SubtitleItem> {
        (0..n)
            .map(|i| SubtitleItem::new(i + 1, "00:00:00,000", "00:00:01,000", &format!("line {}", i)))
            .collect()
    }

    #[test]
    fn test_context_window_clamps() {
        let subs = items(20);
        assert_eq!(context_window(&subs, 0, 5).len(), 6);
        assert_eq!(context_window(&subs, 10, 5).len(), 11);
        assert_eq!(context_window(&subs, 10, 5).first().unwrap(), "line 5");
        assert_eq!(context_window(&subs, 10, 5).last().unwrap(), "line 15");
        assert_eq!(context_window(&subs, 19, 5).len(), 6);
        assert!(context_window(&subs, 3, 0).is_empty());
        assert_eq!(context_window(&items(1), 0, 5), vec!["line 0".to_string()]);
    }

    #[test]
    fn test_user_message_with_context() {
        let request = TranslationRequest {
            text: "行くぞ".to_string(),
            context: vec!["待って".to_string(), "行くぞ".to_string()],
            source_language: "Japanese".to_string(),
            target_language: TargetLanguage::TraditionalChinese,
            model: "m".to_string(),
        };
        let message = build_user_message(&request);
        assert!(message.contains("[\"待って\",\"行くぞ\"]"));
        assert!(message.contains("from Japanese into Traditional Chinese"));
        assert!(message.ends_with("'行くぞ'"));
    }

    #[test]
    fn test_user_message_without_context() {
        let request = TranslationRequest {
            text: "Hello".to_string(),
            context: Vec::new(),
            source_language: "auto".to_string(),
            target_language: TargetLanguage::Japanese,
            model: "m".to_string(),
        };
        assert_eq!(build_user_message(&request), "Translate the following text into Japanese:\nHello");
    }
}
