//! Build script for the storefront crate.
//!
//! Fingerprints `static/css/main.css` so the layout can link an immutable,
//! content-addressed copy of it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

const CSS_SOURCE: &str = "static/css/main.css";
const CSS_DERIVED_DIR: &str = "static/css/derived";

fn main() {
    let manifest_dir = PathBuf::from(std::env::var_os("CARGO_MANIFEST_DIR").unwrap_or_default());
    let source = manifest_dir.join(CSS_SOURCE);
    println!("cargo:rerun-if-changed={}", source.display());

    match fingerprint(&source, &manifest_dir.join(CSS_DERIVED_DIR)) {
        Ok(hash) => println!("cargo:rustc-env=CSS_HASH={hash}"),
        Err(e) => {
            println!("cargo:warning=Could not fingerprint {CSS_SOURCE}: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
        }
    }
}

/// Copy `source` to `<derived>/main.<hash>.css` and return the 8-char hash.
fn fingerprint(source: &Path, derived: &Path) -> io::Result<String> {
    let content = fs::read(source)?;
    let digest = format!("{:x}", Sha256::digest(&content));
    let hash: String = digest.chars().take(8).collect();

    fs::create_dir_all(derived)?;
    fs::write(derived.join(format!("main.{hash}.css")), &content)?;
    Ok(hash)
}
