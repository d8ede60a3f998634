use std::path::Path;

use crate::foundation::error::{ClipreelError, ClipreelResult};

/// Return `true` for `http://` and `https://` locations.
pub fn is_url(path: &str) -> bool {
    let lower = path.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Check that `path` names an existing file, or a URL when remote requests are allowed.
pub fn assert_file_valid(path: &str, allow_remote_requests: bool) -> ClipreelResult<()> {
    if is_url(path) {
        if allow_remote_requests {
            return Ok(());
        }
        return Err(ClipreelError::validation(format!(
            "remote requests are not allowed: '{path}'"
        )));
    }
    if !Path::new(path).is_file() {
        return Err(ClipreelError::validation(format!("file does not exist: '{path}'")));
    }
    Ok(())
}
