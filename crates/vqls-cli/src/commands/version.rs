//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - variational quantum linear solver",
        style("VQLS").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  vqls-ir           Circuit intermediate representation");
    println!("  vqls-hal          Backend abstraction layer");
    println!("  vqls-core         Cost assembly, gradients and optimizer");
    println!("  vqls-adapter-sim  Statevector simulator");
    println!("  vqls-cli          Command-line interface");
    println!();
    println!("License:    {}", style("Apache-2.0").dim());
}
