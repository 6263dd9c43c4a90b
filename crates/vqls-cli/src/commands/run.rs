//! Run command implementation.

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::warn;

use vqls_core::{Solver, stop_channel};

use super::common::{Overrides, create_backend, load_config, print_summary};

/// Execute the run command.
pub async fn execute(overrides: &Overrides, json: bool) -> Result<()> {
    let config = load_config(overrides)?;
    let backend = create_backend(&config.backend);
    let solver = Solver::from_config(&config, backend).context("Failed to set up solver")?;

    if !json {
        println!(
            "{} Solving A = {} ({} shots)",
            style("→").cyan().bold(),
            style(solver.cost().operator()).green(),
            match solver.cost().engine().shots() {
                0 => "exact".to_string(),
                n => n.to_string(),
            }
        );
        println!("  Ansatz:     {}", solver.cost().ansatz());
        println!(
            "  Estimation: {}, gradient: {}",
            style(solver.cost().mode()).yellow(),
            style(solver.gradient().name()).yellow()
        );
    }

    let (handle, signal) = stop_channel();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the last completed step");
            handle.stop();
        }
    });

    let bar = ProgressBar::new(solver.optimizer().iterations as u64);
    if json {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress template")?
            .progress_chars("=> "),
    );
    bar.set_message("evaluating C(θ₀)...");

    let outcome = solver
        .run(Some(signal), |step| {
            bar.inc(1);
            bar.set_message(format!("cost {:.6}", step.cost));
            if !json {
                bar.suspend(|| {
                    println!(
                        "  step {:>4}  cost {:>14.8}  |∇| {:>12.6}  {:>6} ms",
                        step.iteration,
                        step.cost,
                        step.gradient_norm,
                        step.elapsed.as_millis()
                    );
                });
            }
        })
        .await;
    bar.finish_and_clear();
    ctrl_c.abort();

    let report = outcome.context("Optimization failed")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report.result);
    }

    Ok(())
}
