//! Prints a greeting and waits for Enter.

use std::io::{self, BufRead};

fn main() -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    println!("Hello, World!");
    println!("Press Enter to exit");
    log::debug!("waiting for input");

    let stdin = io::stdin();
    let mut line = String::new();
    // read_line returns 0 once stdin is closed
    let read = stdin.lock().read_line(&mut line)?;
    log::info!("exiting after {} bytes of input", read);
    Ok(())
}
