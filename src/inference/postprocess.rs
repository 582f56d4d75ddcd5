const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Clean raw model output into a single subtitle line.
///
/// Drops `<think>…</think>` reasoning blocks, leading full-width colons and
/// joins the remaining lines with a single space. Returns `None` when nothing is left.
pub fn clean_translation(raw: &str) -> Option<String> {
    let without_reasoning = strip_reasoning(raw);

    let single_line = without_reasoning
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let cleaned = single_line
        .trim_start_matches(|c: char| c == '：' || c.is_whitespace())
        .trim();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn strip_reasoning(raw: &str) -> String {
    let mut text = raw.to_string();

    while let Some(start) = text.find(THINK_OPEN) {
        match text[start..].find(THINK_CLOSE) {
            Some(offset) => {
                text.replace_range(start..start + offset + THINK_CLOSE.len(), "");
            }
            // Unterminated block: the model never got to the answer
            None => {
                text.truncate(start);
                break;
            }
        }
    }

    // Some servers strip the opening tag but keep the closing one
    if let Some(end) = text.rfind(THINK_CLOSE) {
        text = text[end + THINK_CLOSE.len()..].to_string();
    }

    text
}
