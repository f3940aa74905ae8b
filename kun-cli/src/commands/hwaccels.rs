//! Implementation of the 'hwaccels' subcommand.

use anyhow::{Result, bail};
use console::style;
use kun_core::EngineLocator;
use kun_core::hardware_accel::{HwAccelBackend, best_available};
use std::path::Path;

use super::create_runner;
use crate::output::{print_heading, print_info};

pub fn run_hwaccels(ffmpeg: Option<&Path>) -> Result<()> {
    let runner = create_runner(ffmpeg);
    let locator = runner.locator();
    let Some(engine) = locator.locate() else {
        bail!("FFmpeg is not available");
    };
    let capabilities = locator.capabilities();

    print_heading("Hardware acceleration");
    print_info("FFmpeg", engine.display());
    for backend in HwAccelBackend::PREFERENCE {
        let status = if capabilities.contains(backend.as_str()) {
            style("available").green()
        } else {
            style("missing").dim()
        };
        println!("  {:<13} {} ({})", backend.as_str(), status, backend.description());
    }

    let mut others: Vec<_> = capabilities
        .iter()
        .filter(|name| name.parse::<HwAccelBackend>().is_err())
        .map(String::as_str)
        .collect();
    if !others.is_empty() {
        others.sort_unstable();
        print_info("Other", others.join(", "));
    }

    match best_available(&capabilities) {
        Some(best) => print_info("auto selects", best),
        None => print_info("auto selects", "software decoding"),
    }
    Ok(())
}
