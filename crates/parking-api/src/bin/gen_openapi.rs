//! Writes the `parking-api` `OpenAPI` document.
//!
//! Usage: `gen_openapi [OUTPUT]`. Without an output path the JSON goes to stdout.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context as _;

fn main() -> anyhow::Result<()> {
    let json = parking_api::openapi::openapi_json().context("generate OpenAPI JSON")?;

    match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => std::fs::write(&path, json.as_bytes())
            .with_context(|| format!("write OpenAPI JSON to {}", path.display()))?,
        None => io::stdout()
            .write_all(json.as_bytes())
            .context("write OpenAPI JSON to stdout")?,
    }
    Ok(())
}
