use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
    println!("cargo:rerun-if-changed=.git/refs/tags/");

    let version = env!("CARGO_PKG_VERSION");

    // Tagged builds report the bare version; anything else carries the hash.
    let build_version = if git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some() {
        version.to_string()
    } else {
        let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".into());
        let dirty = git(&["status", "--porcelain"]).is_some_and(|out| !out.is_empty());
        format!("{version}-dev ({hash}{})", if dirty { "-dirty" } else { "" })
    };

    println!("cargo:rustc-env=STINT_BUILD_VERSION={build_version}");
}
