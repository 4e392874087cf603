//! One-shot prediction process: read one JSON request from stdin, write one
//! JSON response to stdout, exit 0 on success and 1 on any failure. Logging
//! goes to stderr so stdout stays machine-readable.

use std::io::Read;
use std::process;

use mushroom_vision::backend::{default_device, DefaultBackend};
use mushroom_vision::inference::runner;
use mushroom_vision::utils::logging::{init_logging, LogConfig};

fn main() {
    init_logging(&LogConfig::quiet());

    let mut input = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut input) {
        let response = runner::OneShotResponse::failure(format!("failed to read stdin: {e}"));
        print_response(&response);
        process::exit(1);
    }

    let device = default_device();
    let (response, code) = runner::run::<DefaultBackend>(&input, &device);
    print_response(&response);
    process::exit(code);
}

fn print_response(response: &runner::OneShotResponse) {
    match serde_json::to_string(response) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            // Should not happen; emit a minimal hand-built error object
            println!(r#"{{"success":false,"error":"serialization failed: {e}"}}"#);
        }
    }
}
