//! Load a document and print its discovery listing.
//!
//! Usage: cargo run --example list_operations -- path/to/openapi.yaml

use openapi_operations::DocumentLoader;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: list_operations <document>")?;

    let set = DocumentLoader::load_file(&path)?;

    println!("{} operations:", set.len());
    for operation in set.iter() {
        println!(
            "  {:<40} {} {}",
            operation.name, operation.method, operation.path_template
        );
    }

    println!("\n{}", serde_json::to_string_pretty(&set.listing())?);
    Ok(())
}
