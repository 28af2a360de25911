pub mod deploy;

/// Find the JSON payload in CLI output that mixes progress text and JSON.
///
/// Returns the first line whose content, after leading whitespace, starts
/// with `{`. The CLI writes human-readable progress before its final JSON
/// line, so anything earlier is noise. A progress line that itself starts
/// with `{` will be picked instead of the payload.
///
/// Lines split on `\n` with an optional trailing `\r`, so output captured on
/// either line-ending convention is accepted.
pub fn extract_json_line(stdout: &str) -> Option<&str> {
    stdout
        .lines()
        .map(str::trim_start)
        .find(|line| line.starts_with('{'))
}
