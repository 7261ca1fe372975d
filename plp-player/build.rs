//! Embeds GIT_HASH, BUILD_TIMESTAMP and BUILD_PROFILE for the startup log line.

use std::env;
use std::process::Command;

use chrono::{SecondsFormat, Utc};

const UNKNOWN: &str = "unknown";

fn main() {
    let stamp = [
        ("GIT_HASH", git_short_hash().unwrap_or_else(|| UNKNOWN.to_string())),
        ("BUILD_TIMESTAMP", Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        ("BUILD_PROFILE", env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string())),
    ];
    for (key, value) in stamp {
        println!("cargo:rustc-env={}={}", key, value);
    }

    // New commits and branch switches; a missing file reruns every build
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");
}

/// `None` without git or outside a checkout
fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_owned())
}
