//! Queue logging example
//!
//! Worker threads log through a queue; a listener thread does the slow
//! file and console output.
//!
//! Run with: cargo run --example queue_logging

use rust_logging::prelude::*;
use std::sync::Arc;
use std::thread;

fn main() -> Result<()> {
    println!("=== Rust Logging - Queue Logging Example ===\n");

    let queue = LogQueue::bounded(10_000);
    let console = Handler::new(StreamSink::stdout())
        .with_formatter(Formatter::new("%(threadName)s %(name)s: %(message)s")?);
    let listener = QueueListener::new(queue.clone(), vec![Arc::new(console)])
        .respect_handler_level(true);
    listener.start()?;

    let manager = Manager::new();
    manager.root().set_level(Level::INFO);
    manager
        .root()
        .add_handler(Arc::new(Handler::new(QueueSink::new(queue))));

    let workers: Vec<_> = (0..4)
        .map(|id| {
            let logger = manager.get_logger(&format!("worker.{}", id));
            thread::Builder::new()
                .name(format!("worker-{}", id))
                .spawn(move || {
                    for step in 1..=3 {
                        logger.info("step %d done", vec![Value::from(step)]);
                    }
                })
        })
        .collect::<std::io::Result<_>>()?;

    for worker in workers {
        if worker.join().is_err() {
            eprintln!("worker panicked");
        }
    }

    // dispatches everything queued so far, then joins the listener
    listener.stop();

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
