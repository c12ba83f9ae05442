//! sqcircuit command-line interface.

use anyhow::{bail, Context, Result};
use clap::Parser;
use sqcircuit::{AnalysisConfig, BasisCompletion, DMatrix, SymbolicCircuit};

#[derive(Parser)]
#[command(name = "sqcircuit")]
#[command(about = "Symbolic analysis of superconducting circuits", long_about = None)]
#[command(version)]
struct Cli {
    /// Number of non-ground nodes
    #[arg(short, long)]
    nodes: usize,

    /// Branch descriptor such as "JJ 1,2 EJ=10 1" (repeatable)
    #[arg(short, long = "branch", value_name = "DESCRIPTOR", required = true)]
    branches: Vec<String>,

    /// Basis completion: simple or standard
    #[arg(long, default_value = "simple")]
    basis: BasisCompletion,

    /// Override a parameter value, as NAME=VALUE (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    overrides: Vec<String>,

    /// Print the Hamiltonian with every parameter replaced by its value
    #[arg(long)]
    substitute: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let descriptors = sqcircuit::parse_branches(&cli.branches).context("Invalid branch")?;
    let config = AnalysisConfig::default().with_basis_completion(cli.basis);
    let mut circuit = SymbolicCircuit::from_descriptors(cli.nodes, &descriptors, config)
        .context("Analysis failed")?;

    for assignment in &cli.overrides {
        let Some((name, value)) = assignment.split_once('=') else {
            bail!("Expected NAME=VALUE, got `{assignment}`");
        };
        let value: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value in `{assignment}`"))?;
        circuit.update_parameter(name.trim(), value)?;
    }

    print_summary(&circuit, cli.verbose)?;

    println!("Hamiltonian:");
    println!("  H = {}", circuit.generate_hamiltonian(cli.substitute)?);

    Ok(())
}

fn print_summary(circuit: &SymbolicCircuit, verbose: bool) -> Result<()> {
    let graph = circuit.graph();
    println!(
        "Circuit: {} nodes, {} branches{}",
        graph.node_count(),
        graph.branches().len(),
        if graph.is_grounded() { ", grounded" } else { "" }
    );
    if verbose {
        for branch in graph.branches() {
            println!("  {branch}");
        }
        if !circuit.parameters().is_empty() {
            println!("Parameters:");
            for (name, value) in circuit.parameters().iter() {
                println!("  {name} = {value}");
            }
        }
    }
    println!();

    println!("Transformation (φ = T·θ):");
    print_matrix(circuit.transformation_matrix());
    println!("Variables: {}", circuit.categories());
    for warning in circuit.warnings() {
        println!("Warning: {warning}");
    }
    println!();

    if !circuit.closure_branches().is_empty() {
        println!("External fluxes:");
        for (branch, flux) in circuit
            .closure_branches()
            .iter()
            .zip(circuit.external_fluxes())
        {
            println!("  {flux} through {}", graph.branch(*branch));
        }
        println!();
    }

    if verbose {
        println!("Capacitance matrix:");
        print_matrix(&circuit.capacitance_matrix_numeric()?);
        println!();
        println!("Lagrangian (node fluxes):");
        println!("  L = {}", circuit.lagrangian_node_vars());
        println!();
    }

    println!("Lagrangian:");
    println!("  L = {}", circuit.lagrangian());
    println!();
    Ok(())
}

fn print_matrix(m: &DMatrix<f64>) {
    for row in m.row_iter() {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:>8.4}")).collect();
        println!("  [{}]", cells.join(" "));
    }
}
