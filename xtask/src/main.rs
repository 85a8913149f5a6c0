use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for lumen")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy and tests
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Run the ray tracer benchmark in release mode
    Bench,
    /// Render sample images into target/samples with lumen-cli
    Samples,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_tests()?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Bench => cargo(
            "cargo bench",
            &["bench", "-p", "lumen-raytrace", "--bench", "bench_trace"],
        )?,
        Commands::Samples => run_samples()?,
    }

    Ok(())
}

fn cargo(what: &str, args: &[&str]) -> Result<()> {
    println!("==> Running {what}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{what} failed");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    cargo("cargo fmt --check", &["fmt", "--all", "--", "--check"])
}

fn run_clippy() -> Result<()> {
    cargo(
        "cargo clippy",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )
}

fn run_tests() -> Result<()> {
    cargo("cargo test", &["test", "--workspace"])
}

fn run_samples() -> Result<()> {
    let out = Path::new("target").join("samples");
    std::fs::create_dir_all(&out)?;
    let scene = out.join("default_scene.yaml");
    let image = out.join("default_scene.png");
    let (scene, image) = (scene.to_string_lossy(), image.to_string_lossy());

    cargo(
        "lumen-cli default-scene",
        &lumen_cli(&["default-scene", "-o", &*scene]),
    )?;
    cargo(
        "lumen-cli raytrace",
        &lumen_cli(&["raytrace", "--scene", &*scene, "-o", &*image]),
    )?;
    println!("==> Samples written to {}", out.display());
    Ok(())
}

fn lumen_cli<'a>(rest: &[&'a str]) -> Vec<&'a str> {
    ["run", "--release", "-p", "lumen-cli", "--"]
        .into_iter()
        .chain(rest.iter().copied())
        .collect()
}
