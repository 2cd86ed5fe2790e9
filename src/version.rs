//! Build metadata for the `codekg` binary.

/// Full version line: `codekg {version} ({commit} {date}) rustc {rustc}`.
pub fn version() -> String {
    format!(
        "codekg {} ({} {}) rustc {}",
        package_version(),
        build_commit(),
        build_date(),
        rustc_version()
    )
}

pub fn package_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Short commit SHA, or "unknown" outside a git checkout.
pub fn build_commit() -> &'static str {
    option_env!("CODEKG_COMMIT_SHA").unwrap_or("unknown")
}

pub fn build_date() -> &'static str {
    option_env!("CODEKG_BUILD_DATE").unwrap_or("unknown")
}

pub fn rustc_version() -> &'static str {
    option_env!("CODEKG_RUSTC_VERSION").unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_line_starts_with_crate_name() {
        let line = version();
        assert!(line.starts_with("codekg "));
        assert!(line.contains(package_version()));
    }
}
