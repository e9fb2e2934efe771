//! tourbase server entry point.
//!
//! Bootstrap owns configuration, logging and the listener; main only
//! reports the failure and exits non-zero.

use tourbase::bootstrap;

#[tokio::main]
async fn main() {
    if let Err(e) = bootstrap::run().await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
