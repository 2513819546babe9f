//! zipmount: inspect a source tree through an archive mount.
//!
//! # Usage
//!
//! ```bash
//! zipmount --zip deps.zip --mount node_modules --zip-root node_modules/ ls node_modules
//! zipmount --config mount.toml cat node_modules/pkg/package.json
//! zipmount trace src lib/index.js
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use zipmount_cli::{Cli, run};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("zipmount=info".parse()?))
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(&cli, &mut stdout.lock())
}
