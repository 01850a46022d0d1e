//! Report compute backend availability.

use beatstream_core::detect_capabilities;

/// Run the backends command.
pub fn run() -> anyhow::Result<()> {
    let caps = detect_capabilities();

    println!("Compute Backends");
    println!("================\n");
    println!("  cpu          available");
    if caps.accelerated_available() {
        let threads = caps.accelerated_threads.unwrap_or_default();
        println!("  accelerated  available ({threads} worker threads)");
    } else {
        match &caps.accelerated_error {
            Some(err) => println!("  accelerated  unavailable: {err}"),
            None => println!("  accelerated  unavailable"),
        }
    }
    println!("\nHardware threads: {}", caps.available_threads);

    Ok(())
}
