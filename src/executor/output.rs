//! Trimming of raw tool diagnostics.

/// Sanitize tool output for inclusion in error messages.
///
/// Blank lines are dropped, long lines are cut, at most `max_lines`
/// lines are kept and the total is capped so a chatty tool cannot
/// flood the result screen.
pub fn sanitize_output(output: &str, max_lines: usize) -> String {
    const MAX_LINE_LENGTH: usize = 200;
    const MAX_TOTAL_LENGTH: usize = 1000;

    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let mut result = String::new();

    for line in lines.iter().take(max_lines) {
        let truncated = if line.chars().count() > MAX_LINE_LENGTH {
            let cut: String = line.chars().take(MAX_LINE_LENGTH).collect();
            format!("{}...", cut)
        } else {
            line.to_string()
        };

        if result.len() + truncated.len() > MAX_TOTAL_LENGTH {
            result.push_str("...[truncated]");
            return result;
        }

        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&truncated);
    }

    if lines.len() > max_lines {
        result.push_str("\n...[additional output truncated]");
    }

    result
}
