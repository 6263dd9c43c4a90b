//! Shared helpers for CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use vqls_adapter_sim::SimulatorBackend;
use vqls_core::config::SimulatorConfig;
use vqls_core::{
    AnsatzVariant, EstimationMode, GradientMethod, OptimizationResult, ProblemConfig,
    load_operator_file,
};
use vqls_hal::Backend;

/// Problem sources and per-run overrides. Flags win over `VQLS_*`
/// environment variables, which win over the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Problem configuration (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Operator file, one `<coefficient> <pauli>` term per line
    #[arg(short, long)]
    pub operator_file: Option<PathBuf>,

    /// Ansatz layers
    #[arg(short, long)]
    pub layers: Option<u32>,

    /// Ansatz variant (rotation, paired, rotation_xy)
    #[arg(long)]
    pub ansatz: Option<AnsatzVariant>,

    /// Numerator estimation (surrogate, swap_test)
    #[arg(short, long)]
    pub estimation: Option<EstimationMode>,

    /// Gradient descent iterations
    #[arg(short, long)]
    pub iterations: Option<usize>,

    /// Gradient descent step size
    #[arg(long)]
    pub step_size: Option<f64>,

    /// Gradient method (forward, central, parameter_shift)
    #[arg(short, long)]
    pub gradient: Option<GradientMethod>,

    /// Shots per circuit, 0 for exact expectation values
    #[arg(short, long)]
    pub shots: Option<u32>,

    /// Simulator sampling seed
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Load the configuration and apply environment and flag overrides.
pub fn load_config(overrides: &Overrides) -> Result<ProblemConfig> {
    let mut config = ProblemConfig::load(overrides.config.as_deref()).with_context(|| {
        match &overrides.config {
            Some(path) => format!("Failed to load config: {}", path.display()),
            None => "Failed to load default config".to_string(),
        }
    })?;
    apply_overrides(&mut config, overrides)?;
    Ok(config)
}

/// Apply flag overrides on top of `config` and validate the result.
pub fn apply_overrides(config: &mut ProblemConfig, overrides: &Overrides) -> Result<()> {
    if let Some(path) = &overrides.operator_file {
        let operator = load_operator_file(path)
            .with_context(|| format!("Failed to read operator file: {}", path.display()))?;
        config.set_operator(&operator);
    }
    if let Some(layers) = overrides.layers {
        config.ansatz.layers = layers;
    }
    if let Some(variant) = overrides.ansatz {
        config.ansatz.variant = variant;
    }
    if let Some(mode) = overrides.estimation {
        config.estimation = mode;
    }
    if let Some(iterations) = overrides.iterations {
        config.optimizer.iterations = iterations;
    }
    if let Some(step) = overrides.step_size {
        config.optimizer.step_size = step;
    }
    if let Some(method) = overrides.gradient {
        config.gradient.method = method;
    }
    if let Some(shots) = overrides.shots {
        config.engine.shots = shots;
    }
    if let Some(seed) = overrides.seed {
        config.backend.seed = Some(seed);
    }
    config.validate()?;
    Ok(())
}

/// Build the local simulator described by `config`.
pub fn create_backend(config: &SimulatorConfig) -> Arc<dyn Backend> {
    let backend = SimulatorBackend::with_max_qubits(config.max_qubits);
    match config.seed {
        Some(seed) => Arc::new(backend.with_seed(seed)),
        None => Arc::new(backend),
    }
}

/// Format θ for terminal output.
pub fn format_theta(theta: &[f64]) -> String {
    let values: Vec<String> = theta.iter().map(|t| format!("{t:.6}")).collect();
    format!("[{}]", values.join(", "))
}

/// Print a finished optimization in a table format.
pub fn print_summary(result: &OptimizationResult) {
    use console::style;

    let mark = if result.stopped {
        style("■").yellow().bold()
    } else {
        style("✓").green().bold()
    };
    println!(
        "\n{} {} steps{}",
        mark,
        result.iterations_completed(),
        if result.stopped { " (stopped)" } else { "" }
    );
    println!("  Initial cost: {}", style(format!("{:.8}", result.initial_cost)).cyan());
    println!("  Final cost:   {}", style(format!("{:.8}", result.final_cost())).cyan());
    println!("  Best cost:    {}", style(format!("{:.8}", result.best_cost())).cyan());
    println!("  θ = {}", format_theta(&result.theta));
}
