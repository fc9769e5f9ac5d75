//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document of the notes API to disk, for front-end client
//! generation. Usage: `openapi [OUTPUT]` (defaults to `openapi.json`).

use notes_api_lib::web::rest::ApiDoc;
use std::path::PathBuf;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("openapi.json"));

    let mut doc = ApiDoc::openapi();
    doc.info.title = "Study Notes API".to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();

    std::fs::write(&output, doc.to_pretty_json()?)?;
    println!("✅ OpenAPI specification generated at {}", output.display());
    Ok(())
}
