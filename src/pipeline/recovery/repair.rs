// Escape control characters that models emit verbatim inside JSON strings.
// Multi-line free-text fields (coaching notes, rationale) are the usual source.

/// Replace literal newline, carriage return and tab characters that occur
/// inside quoted string regions with their escaped forms. Everything outside
/// string regions is copied through untouched.
///
/// Single left-to-right pass. A pending escape is consumed by whatever
/// character follows the backslash, so `\n` written by the model stays `\n`
/// and repairing twice yields the same output as repairing once.
pub fn repair_json(input: &str) -> String {
    let mut result = String::with_capacity(input.len() + 16);
    let mut in_string = false;
    let mut escaped = false;

    for ch in input.chars() {
        if escaped {
            result.push(ch);
            escaped = false;
            continue;
        }

        match ch {
            '\\' => {
                escaped = true;
                result.push(ch);
            }
            '"' => {
                in_string = !in_string;
                result.push(ch);
            }
            '\n' if in_string => result.push_str("\\n"),
            '\r' if in_string => result.push_str("\\r"),
            '\t' if in_string => result.push_str("\\t"),
            _ => result.push(ch),
        }
    }

    result
}
