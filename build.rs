use std::process::Command;

/// Run a command and return its trimmed stdout, or None on any failure.
fn capture(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn main() {
    let commit =
        capture("git", &["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".into());
    let date = capture("date", &["+%Y-%m-%d"]).unwrap_or_else(|| "unknown".into());

    // "rustc 1.80.0 (051478957 2024-07-21)" -> "1.80.0"
    let rustc = capture("rustc", &["--version"])
        .and_then(|v| v.split_whitespace().nth(1).map(str::to_string))
        .unwrap_or_else(|| "unknown".into());

    println!("cargo:rustc-env=CODEKG_COMMIT_SHA={commit}");
    println!("cargo:rustc-env=CODEKG_BUILD_DATE={date}");
    println!("cargo:rustc-env=CODEKG_RUSTC_VERSION={rustc}");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
