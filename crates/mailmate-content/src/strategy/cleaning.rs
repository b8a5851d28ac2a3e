//! Email text cleanup before it is handed to a capability.

const HEADER_PREFIXES: &[&str] = &["from:", "to:", "subject:"];
const EXTERNAL_TAG: &str = "[external]";

/// Strip header lines, reply attributions, quoted lines and `[External]`
/// tags, then collapse whitespace.
///
/// Paragraph breaks survive as a single blank line.
pub fn clean_email_text(text: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in text.lines() {
        let line = remove_external_tags(line);
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
            continue;
        }
        if is_noise(trimmed) {
            continue;
        }
        current.push(trimmed.split_whitespace().collect::<Vec<_>>().join(" "));
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs.join("\n\n")
}

fn is_noise(line: &str) -> bool {
    let lowered = line.to_lowercase();
    HEADER_PREFIXES.iter().any(|p| lowered.starts_with(p))
        || line.starts_with('>')
        || (line.starts_with("On ") && line.ends_with("wrote:"))
}

fn remove_external_tags(line: &str) -> String {
    let mut out = line.to_string();
    while let Some(start) = out.to_ascii_lowercase().find(EXTERNAL_TAG) {
        out.replace_range(start..start + EXTERNAL_TAG.len(), "");
    }
    out
}
