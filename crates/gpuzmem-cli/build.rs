use std::env;
use std::process::Command;

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

// Stamps `gpuzmem --version` with the source revision and build date.
// SOURCE_DATE_EPOCH pins the date for reproducible builds.
fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    let revision = git_output(&["describe", "--always", "--dirty", "--abbrev=10"])
        .unwrap_or_else(|| "unknown".to_string());
    let built = build_timestamp()
        .and_then(|ts| ts.format(&Rfc3339).ok())
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=GPUZMEM_BUILD_COMMIT={revision}");
    println!("cargo:rustc-env=GPUZMEM_BUILD_DATE={built}");
}

fn build_timestamp() -> Option<OffsetDateTime> {
    match env::var("SOURCE_DATE_EPOCH") {
        Ok(epoch) => epoch
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok()),
        Err(_) => Some(OffsetDateTime::now_utc()),
    }
}

fn git_output(args: &[&str]) -> Option<String> {
    let out = Command::new("git").args(args).output().ok()?;
    let text = String::from_utf8(out.stdout).ok()?;
    let text = text.trim();
    (out.status.success() && !text.is_empty()).then(|| text.to_string())
}
