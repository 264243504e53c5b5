//! Shell-style rendering of commands for log output

/// Quote a string for display in a shell command line
///
/// The string is quoted only if it contains characters with special meaning
/// in the shell. Single quotes are used.
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }

    if s.chars().all(|c| {
        c.is_alphanumeric() || matches!(c, '-' | '_' | '=' | '/' | '.' | ':' | ',' | '@' | '+')
    }) {
        return s.to_string();
    }

    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Render `program args...` as a copy-pasteable line, masking the argument
/// at `redact` (if any) so passwords never reach the terminal or logs.
pub fn display_command(program: &str, args: &[&str], redact: Option<usize>) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(shell_quote(program));
    for (index, arg) in args.iter().enumerate() {
        if Some(index) == redact {
            parts.push("'********'".to_string());
        } else {
            parts.push(shell_quote(arg));
        }
    }
    parts.join(" ")
}
