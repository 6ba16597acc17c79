fn main() {
    // 1. An explicit MDVIEW_BUILD_VERSION (e.g. from a packaging script) wins
    println!("cargo:rerun-if-env-changed=MDVIEW_BUILD_VERSION");
    if let Ok(v) = std::env::var("MDVIEW_BUILD_VERSION") {
        if !v.is_empty() {
            println!("cargo:rustc-env=MDVIEW_BUILD_VERSION={v}");
            return;
        }
    }

    // 2. git describe, for development builds
    if let Ok(output) = std::process::Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
    {
        if output.status.success() {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let version = version.strip_prefix('v').unwrap_or(&version);
            if !version.is_empty() {
                println!("cargo:rustc-env=MDVIEW_BUILD_VERSION={version}");
                println!("cargo:rerun-if-changed=.git/HEAD");
                println!("cargo:rerun-if-changed=.git/refs/tags");
                return;
            }
        }
    }

    // 3. Fallback to Cargo.toml version
    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    println!("cargo:rustc-env=MDVIEW_BUILD_VERSION={version}");
}
