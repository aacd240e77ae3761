use std::process::Command;

/// Inject git commit and tag metadata into the build as `GIT_COMMIT` and
/// `RELEASE_VERSION`. Both are empty strings when not building from a git
/// checkout (release tarballs).
pub fn emit_git_metadata() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs");

    println!("cargo:rustc-env=GIT_COMMIT={}", git_output(&["rev-list", "-1", "HEAD"]));
    println!(
        "cargo:rustc-env=RELEASE_VERSION={}",
        git_output(&["tag", "--points-at", "HEAD"])
    );
}

fn git_output(args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default()
}
