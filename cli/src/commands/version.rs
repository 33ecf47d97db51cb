//! Version command

/// Run the version command.
pub fn run() {
    println!("volttron-bootstrap {}", env!("CARGO_PKG_VERSION"));
}
