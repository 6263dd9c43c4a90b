//! Inspect command implementation.

use anyhow::{Context, Result};
use console::style;

use vqls_core::Solver;

use super::common::{Overrides, create_backend, load_config};

/// Execute the inspect command.
pub async fn execute(overrides: &Overrides) -> Result<()> {
    let config = load_config(overrides)?;
    let backend = create_backend(&config.backend);
    let solver = Solver::from_config(&config, backend).context("Failed to set up solver")?;
    let cost = solver.cost();

    println!("{}", style("Operator").bold());
    println!(
        "  A   = {} ({} qubits, {} terms)",
        style(cost.operator()).green(),
        cost.operator().n_qubits(),
        cost.operator().len()
    );
    println!(
        "  A·A = {} ({} terms)",
        style(cost.product()).green(),
        cost.product().len()
    );
    println!("  Σ|cₖ| = {:.6}", cost.operator().coefficient_l1());

    println!("\n{}", style("Ansatz").bold());
    println!("  {}", cost.ansatz());
    println!(
        "  Circuit width: {} qubits ({} numerator)",
        cost.mode().required_qubits(cost.operator().n_qubits()),
        cost.mode()
    );

    let theta = solver.initial_parameters();
    let estimate = solver
        .evaluate(&theta)
        .await
        .context("Failed to evaluate C(θ₀)")?;

    println!("\n{}", style("Cost at θ = 0").bold());
    println!("  ⟨A·A⟩   = {:.8}", estimate.denom);
    println!("  numer   = {:.8}", estimate.numer);
    println!("  C       = {}", style(format!("{:.8}", estimate.cost)).cyan());
    println!("  Circuits executed: {}", estimate.circuits_executed);

    Ok(())
}
