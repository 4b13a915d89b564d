//! Output sanitization for error messages and logs.

/// Sanitize command output for inclusion in error messages.
///
/// This function:
/// - Truncates long lines
/// - Limits the number of lines shown
/// - Caps the total length
///
/// # Arguments
///
/// * `output` - The raw command output
/// * `max_lines` - Maximum number of lines to include
pub fn sanitize_output(output: &str, max_lines: usize) -> String {
    const MAX_LINE_LENGTH: usize = 200;
    const MAX_TOTAL_LENGTH: usize = 1000;

    let mut result = String::new();

    for line in output.lines().take(max_lines) {
        let truncated = match line.char_indices().nth(MAX_LINE_LENGTH) {
            Some((cut, _)) => format!("{}...", &line[..cut]),
            None => line.to_string(),
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

    if output.lines().count() > max_lines {
        result.push_str("\n...[additional output truncated]");
    }

    result
}
