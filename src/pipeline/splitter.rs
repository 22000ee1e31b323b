//! Turns generator output into an ordered statement batch.

const FENCE: &str = "```";

/// Split generator output into statements.
///
/// A fence line (with an optional language tag) counts as a blank line,
/// stray fence markers are removed, then the text is cut on blank lines. A single newline never ends a statement.
/// Order is preserved and nothing is deduplicated.
pub fn split_statements(raw: &str) -> Vec<String> {
    let text = raw.replace("\r\n", "\n");
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            if line.trim_start().starts_with(FENCE) {
                String::new()
            } else {
                line.replace(FENCE, "")
            }
        })
        .collect();

    let mut statements = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in &lines {
        if line.trim().is_empty() {
            flush(&mut current, &mut statements);
        } else {
            current.push(line);
        }
    }
    flush(&mut current, &mut statements);

    statements
}

fn flush(current: &mut Vec<&str>, statements: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    let statement = current.join("\n").trim().to_string();
    if !statement.is_empty() {
        statements.push(statement);
    }
    current.clear();
}

/// Drop `//` comment lines, which the store rejects.
pub fn strip_comment_lines(statement: &str) -> String {
    statement
        .lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
