//! Render the baseline call of every NFSv3 procedure.
//!
//! Prints one line per procedure (`TOKEN <len> <hex>`) followed by the field
//! metadata of the first call as JSON. Set `RUST_LOG=xdr_blocks=trace` to see
//! size resolution.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use xdr_blocks::{Catalog, Nfs3Args};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        error!(error = %e, "rendering failed");
        std::process::exit(1);
    }
}

fn run() -> xdr_blocks::Result<()> {
    let catalog = Catalog::nfs3();
    let args = Nfs3Args::default();
    let messages = catalog.build_all(&args)?;
    info!(procedures = catalog.len(), "built baseline calls");

    for (token, message) in catalog.tokens().zip(&messages) {
        let bytes = message.render()?;
        println!("{token:<12} {:>4} {}", bytes.len(), hex::encode(&bytes));
    }

    if let Some(first) = messages.first() {
        println!("{}", first.describe_json()?);
    }
    Ok(())
}
