//! # EMBER Preview
//!
//! Renders an effect file headlessly and writes the last frame as a PNG.
//!
//! ```bash
//! ember_preview data/effects/radial_field.toml --size 800x450 --frames 240 --out field.png
//!
//! # Watch lifecycle transitions and reseeds
//! RUST_LOG=ember_effects=debug ember_preview data/effects/ribbon_trail.toml --resize 400x400
//! ```

use std::process::ExitCode;

use ember::{run, Invocation, USAGE};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    let options = match Invocation::parse(std::env::args().skip(1)) {
        Ok(Invocation::Run(options)) => options,
        Ok(Invocation::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("error: {e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(&options) {
        Ok(report) => {
            println!("═══════════════════════════════════════════════════════════════════");
            println!("  EMBER PREVIEW: {}", report.kind);
            println!("═══════════════════════════════════════════════════════════════════");
            println!("  Ticks:      {}", report.ticks);
            println!("  Drawn:      {}", report.drawn);
            println!("  Dropped:    {}", report.dropped);
            println!("  Deferred:   {}", report.deferred);
            println!("  Reseeds:    {}", report.reseeds);
            println!("  Population: {}", report.population);
            println!("  Image:      {}x{} -> {}", report.width, report.height, options.out.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
