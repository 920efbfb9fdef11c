//! Splitting a multi-file unified diff into per-file blocks.

/// Split a unified diff into one contiguous block per file path.
///
/// Blocks start at `diff --git` boundary lines and preserve line order, so
/// concatenating the returned blocks in order reconstructs the input text
/// exactly (git diff output always starts with a boundary line). The file
/// path is the last whitespace-delimited token of the boundary line, with
/// the `b/` prefix stripped.
#[must_use]
pub fn split_file_patches(diff_text: &str) -> Vec<(String, String)> {
    let mut blocks: Vec<(String, String)> = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in diff_text.split_inclusive('\n') {
        if line.starts_with("diff --git") {
            if let Some(block) = current.take() {
                blocks.push(block);
            }

            let path = line
                .split_whitespace()
                .last()
                .map(|token| token.strip_prefix("b/").unwrap_or(token))
                .unwrap_or("")
                .to_string();

            current = Some((path, String::new()));
        }

        if let Some((_, text)) = current.as_mut() {
            text.push_str(line);
        }
    }

    if let Some(block) = current.take() {
        blocks.push(block);
    }

    blocks
}
