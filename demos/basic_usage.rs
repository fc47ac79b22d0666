//! Basic logger usage example
//!
//! Demonstrates a logger hierarchy writing to standard output, level
//! inheritance and printf-style arguments.
//!
//! Run with: cargo run --example basic_usage

use rust_logging::prelude::*;
use rust_logging::{info, warning};
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Rust Logging - Basic Usage Example ===\n");

    let manager = Manager::new();
    let console = Handler::new(StreamSink::stdout())
        .with_formatter(Formatter::new("%(asctime)s %(levelname)-8s %(name)s: %(message)s")?);
    manager.root().add_handler(Arc::new(console));
    manager.root().set_level(Level::DEBUG);

    let app = manager.get_logger("app");
    let db = manager.get_logger("app.db");

    println!("1. Logging at different levels:");
    db.debug("This is a debug message", ());
    db.info("This is an info message", ());
    db.warning("This is a warning message", ());
    db.error("This is an error message", ());
    db.critical("This is a critical message", ());

    println!("\n2. Levels are inherited from ancestors:");
    app.set_level(Level::WARNING);
    println!("   'app' set to WARNING - debug and info from 'app.db' won't show:");
    db.debug("Debug message (hidden)", ());
    db.info("Info message (hidden)", ());
    db.warning("Warning message (visible)", ());

    println!("\n3. Arguments and macros:");
    db.warning("%d of %d connections idle", vec![Value::from(3), Value::from(10)]);
    info!(app, "Hidden: below the 'app' level");
    warning!(app, "Pool %s is at %.1f%% capacity", "primary", 97.5);

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
