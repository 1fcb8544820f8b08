use anyhow::Result;
use identita::cli::{actions::run, start, telemetry};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let (action, globals) = start()?;

    // Handle the action
    let result = run::handle(action, &globals).await;

    telemetry::shutdown_tracer();

    result
}
