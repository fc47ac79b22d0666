//! File logging example
//!
//! Demonstrates console and size-rotated file handlers side by side, each
//! with its own level and formatter.
//!
//! Run with: cargo run --example file_logging

use rust_logging::prelude::*;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Rust Logging - File Logging Example ===\n");

    let manager = Manager::new();
    let root = manager.root();
    root.set_level(Level::DEBUG);

    let console = Handler::new(StreamSink::stdout())
        .with_level(Level::INFO)
        .with_formatter(Formatter::new("%(levelname)s: %(message)s")?);
    root.add_handler(Arc::new(console));

    // keep application.log under 64 KiB with three backups
    let file = Handler::new(FileSink::rotating("application.log", 64 * 1024, 3)?)
        .with_formatter(Formatter::new("%(asctime)s [%(levelname)s] %(name)s: %(message)s")?);
    let file = Arc::new(file);
    root.add_handler(Arc::clone(&file));

    let logger = manager.get_logger("app");
    println!("1. Logging to both console and file:");
    logger.info("Application started", ());
    logger.debug("Loading configuration... (file only)", ());
    logger.info("Configuration loaded successfully", ());
    logger.warning("Using default settings for some options", ());
    logger.error("Failed to load optional plugin", ());

    println!("\n2. Performing some operations:");
    for i in 1..=5 {
        logger.info("Processing item %d/5", vec![Value::from(i)]);
        if i == 3 {
            logger.warning("Item 3 took longer than expected", ());
        }
    }
    logger.info("All operations completed", ());

    file.flush()?;
    manager.shutdown()?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'application.log' for the full log output");

    Ok(())
}
