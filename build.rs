// Stamp `chainterm --version` with the short commit hash when built from a checkout.
use std::env;
use std::process::Command;

fn git_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?.trim().to_owned();
    (!hash.is_empty()).then_some(hash)
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");

    let package = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_owned());
    let version = match git_hash() {
        Some(hash) => format!("{package} ({hash})"),
        None => package,
    };
    println!("cargo:rustc-env=CHAINTERM_VERSION={version}");
}
