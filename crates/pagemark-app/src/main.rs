//! Replay tool entry point (native).
//!
//! Runs a JSON session script through the engine and prints each export
//! payload as one JSON line.

#[cfg(feature = "native")]
fn main() -> std::process::ExitCode {
    use pagemark_app::{Script, run_script};
    use std::process::ExitCode;

    env_logger::init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: pagemark-replay <script.json>");
        return ExitCode::FAILURE;
    };
    log::info!("Replaying {}", path);

    let outcome = match Script::load(&path).and_then(run_script) {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Replay failed: {}", e);
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    for payload in &outcome.payloads {
        match payload.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => log::warn!("Skipping payload that failed to serialize: {}", e),
        }
    }
    log::info!(
        "Replay finished: {} marks on {} pages, {} exports",
        outcome.store.len(),
        outcome.store.pages().len(),
        outcome.payloads.len()
    );
    ExitCode::SUCCESS
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
