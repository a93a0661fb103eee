//! Rearrangement planner CLI
//!
//! Usage:
//!   rearrange "(h w) c -> h w c" --shape 12x10 --axis h=3
//!   rearrange "b h w c -> b c h w" --shape 2x4x4x3 --json
//!   rearrange "... c -> c ..." --shape 2x3x4 --run --executor native

use clap::Parser as ClapParser;
use colored::Colorize;
use ndarray::{Array, ArrayD};
use std::fs;

use pattern_rearrange::{ExecutorKind, RearrangeConfig, RearrangementPlan, Rearranger};

#[derive(ClapParser, Debug)]
#[command(name = "rearrange")]
#[command(author = "Pattern Rearrange Developers")]
#[command(version = "0.1.0")]
#[command(about = "Plans einops-style axis rearrangements")]
struct Args {
    /// Rearrangement pattern (e.g., "(h w) c -> h w c")
    #[arg(value_name = "PATTERN")]
    pattern: String,

    /// Input shape (e.g., "12x10"); an empty string is a 0-d array
    #[arg(short = 's', long = "shape", value_parser = parse_shape)]
    shape: Shape,

    /// Known axis lengths (e.g., "h=3")
    #[arg(short = 'a', long = "axis", value_parser = parse_axis)]
    axes: Vec<(String, usize)>,

    /// Executor used with --run
    #[arg(short = 'e', long = "executor")]
    executor: Option<ExecutorKind>,

    /// Read configuration from a JSON file
    #[arg(short = 'c', long = "config")]
    config_file: Option<String>,

    /// Execute the plan on an arange array of the given shape
    #[arg(short = 'r', long = "run")]
    run: bool,

    /// Output as JSON
    #[arg(short = 'j', long = "json")]
    json_output: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

#[derive(Debug, Clone)]
struct Shape(Vec<usize>);

fn parse_shape(s: &str) -> Result<Shape, String> {
    if s.trim().is_empty() {
        return Ok(Shape(Vec::new()));
    }
    s.split('x')
        .map(|dim| {
            dim.trim()
                .parse::<usize>()
                .map_err(|_| format!("Invalid dimension: {}", dim))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Shape)
}

fn parse_axis(s: &str) -> Result<(String, usize), String> {
    let parts: Vec<&str> = s.split('=').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid axis format: {}", s));
    }

    let length = parts[1]
        .parse::<usize>()
        .map_err(|_| format!("Invalid axis length: {}", parts[1]))?;

    Ok((parts[0].trim().to_string(), length))
}

fn fail(context: &str, message: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", context.red(), message);
    std::process::exit(1);
}

fn main() {
    let args = Args::parse();
    let shape = args.shape.0.as_slice();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = match &args.config_file {
        Some(file) => {
            let text = fs::read_to_string(file)
                .unwrap_or_else(|e| fail("Error", format!("Failed to read file '{}': {}", file, e)));
            RearrangeConfig::from_json(&text)
                .unwrap_or_else(|e| fail("Config error", e))
        }
        None => RearrangeConfig::default(),
    };
    if let Some(executor) = args.executor {
        config.executor = executor;
    }

    if args.verbose {
        println!("{}", "Axis Rearrangement Planner".bold().blue());
        println!("{}", "=".repeat(26));
        println!();
        println!("{}: {}", "Pattern".green(), args.pattern);
        println!("{}: {:?}", "Shape".green(), shape);
        println!("{}: {}", "Executor".green(), config.executor);
        println!();
    }

    let hints: Vec<(&str, usize)> = args
        .axes
        .iter()
        .map(|(name, length)| (name.as_str(), *length))
        .collect();

    let rearranger = Rearranger::new(config);
    let plan = rearranger
        .plan(shape, &args.pattern, &hints)
        .unwrap_or_else(|e| fail("Planning error", e));

    if args.json_output {
        match plan.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => fail("Error", format!("Failed to serialize to JSON: {}", e)),
        }
    } else {
        print_plan(&plan);
    }

    if args.run {
        let n: usize = shape.iter().product();
        let input: ArrayD<u64> = Array::from_iter(0..n as u64)
            .into_shape_with_order(shape)
            .unwrap_or_else(|e| fail("Error", e));
        let output = rearranger
            .rearrange(input, &args.pattern, &hints)
            .unwrap_or_else(|e| fail("Execution error", e));

        println!();
        println!("{}", "Execution".bold().yellow());
        println!("{}", "-".repeat(50));
        println!("{}: {:?}", "Output shape".cyan(), output.shape());
        let preview: Vec<u64> = output.iter().take(16).copied().collect();
        println!("{}: {:?}{}", "Elements".cyan(), preview, if n > 16 { " ..." } else { "" });
    }
}

fn print_plan(plan: &RearrangementPlan) {
    println!("{}", "Rearrangement Plan".bold().green());
    println!("{}", "=".repeat(50));
    println!();

    let names = |ids: &[pattern_rearrange::AxisId]| {
        ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(" ")
    };

    println!("{}: {:?}", "Input shape".cyan(), plan.input_shape);
    if !plan.elided_axes.is_empty() {
        println!("{}: {:?}", "Elided axes".cyan(), plan.elided_axes);
    }
    println!("{}: {:?}", "Intermediate shape".cyan(), plan.intermediate_shape);
    println!("{}: [{}]", "Input axes".cyan(), names(&plan.input_axis_order));
    println!("{}: [{}]", "Output axes".cyan(), names(&plan.output_axis_order));
    if plan.is_identity_permutation() {
        println!("{}: {:?} (identity)", "Permutation".cyan(), plan.permutation);
    } else {
        println!("{}: {:?}", "Permutation".cyan(), plan.permutation);
    }
    println!("{}: {:?}", "Final shape".cyan(), plan.final_shape);
}
