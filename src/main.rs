//! Arise: fused custom instruction synthesis for RISC-V
//!
//! Decodes programs, proposes fused instructions, ranks them and writes one
//! CoreDSL instruction-set extension per target width.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use arise::disasm::{load_frequencies, load_program, InputFormat};
use arise::fusion::Width;
use arise::persistence::{RunReport, SynthesisReport};
use arise::pipeline::{SynthesisConfig, SynthesisOutcome, SynthesisPipeline};
use arise::select::{relative_improvement, Objective};

#[derive(Parser)]
#[command(name = "arise")]
#[command(author, version, about = "Synthesizes fused custom instructions for RISC-V programs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate instruction-set extensions from programs
    Generate {
        /// Disassembly listings or traces to generate from
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Format of the inputs
        #[arg(short, long, default_value = "objdump")]
        format: InputKind,

        /// Execution trace weighting the scores (requires a single input)
        #[arg(short, long)]
        trace: Option<PathBuf>,

        /// Format of the trace
        #[arg(long, default_value = "etiss")]
        trace_format: InputKind,

        /// Optimization objective (overrides the configuration)
        #[arg(short, long)]
        objective: Option<ObjectiveArg>,

        /// Target widths in bits, repeatable (overrides the configuration)
        #[arg(short, long)]
        width: Vec<Width>,

        /// Directory the instruction-set descriptions are written to
        #[arg(short = 'O', long, default_value = ".")]
        output_dir: PathBuf,

        /// Save a report (JSON if the name ends in .json)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the ranking and improvements
        #[arg(long)]
        results: bool,
    },

    /// List the instructions in a report
    List {
        /// Report file
        #[arg(required = true)]
        report: PathBuf,

        /// Show encodings and behaviors
        #[arg(short, long)]
        detailed: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show report information
    Info {
        /// Report file
        #[arg(required = true)]
        report: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputKind {
    Objdump,
    Etiss,
    Spike,
}

impl From<InputKind> for InputFormat {
    fn from(kind: InputKind) -> Self {
        match kind {
            InputKind::Objdump => InputFormat::Objdump,
            InputKind::Etiss => InputFormat::Etiss,
            InputKind::Spike => InputFormat::Spike,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ObjectiveArg {
    Size,
    Count,
}

impl From<ObjectiveArg> for Objective {
    fn from(arg: ObjectiveArg) -> Self {
        match arg {
            ObjectiveArg::Size => Objective::Size,
            ObjectiveArg::Count => Objective::Count,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Options of the generate command
struct GenerateOptions {
    format: InputFormat,
    trace: Option<PathBuf>,
    trace_format: InputFormat,
    output_dir: PathBuf,
    report: Option<PathBuf>,
    results: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            inputs,
            format,
            trace,
            trace_format,
            objective,
            width,
            output_dir,
            report,
            config,
            results,
        } => {
            let mut config = match config {
                Some(path) => SynthesisConfig::load(&path)?,
                None => SynthesisConfig::default(),
            };
            if let Some(objective) = objective {
                config.objective = objective.into();
            }
            if !width.is_empty() {
                config.widths = width;
            }
            let options = GenerateOptions {
                format: format.into(),
                trace,
                trace_format: trace_format.into(),
                output_dir,
                report,
                results,
            };
            generate(&inputs, config, &options)
        }

        Commands::List {
            report,
            detailed,
            format,
        } => list_instructions(&report, detailed, format),

        Commands::Info { report } => show_info(&report),
    }
}

/// Log to stderr; `RUST_LOG` overrides the level chosen by `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Generate instruction sets for every input
fn generate(inputs: &[PathBuf], config: SynthesisConfig, options: &GenerateOptions) -> Result<()> {
    if options.trace.is_some() && inputs.len() != 1 {
        bail!("--trace requires exactly one input, got {}", inputs.len());
    }
    std::fs::create_dir_all(&options.output_dir)
        .with_context(|| format!("Failed to create {}", options.output_dir.display()))?;

    let pipeline = SynthesisPipeline::with_config(config);
    let config = pipeline.config();
    let mut runs = Vec::new();
    let mut total_improvement = 0.0;
    let mut total_baseline = 0.0;

    for input in inputs {
        info!(input = %input.display(), "processing");
        let program = load_program(input, options.format, &config.decode)?;
        let frequencies = options
            .trace
            .as_deref()
            .map(|trace| load_frequencies(trace, options.trace_format, &program, &config.decode))
            .transpose()?;

        let outcome = pipeline.run(&program, frequencies.as_ref())?;
        if outcome.widths.is_empty() {
            warn!(input = %input.display(), "no instructions decoded, nothing written");
            continue;
        }

        for width in &outcome.widths {
            let path = options.output_dir.join(output_name(&config.isa.name, width.width, input, &outcome));
            std::fs::write(&path, &width.document).with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), instructions = width.encoded.len(), "instruction set written");

            total_improvement += width.total_improvement();
            total_baseline += outcome.baseline;
        }

        if options.results {
            print_results(input, &outcome);
        }

        let trace = options.trace.as_deref().map(|t| t.to_string_lossy().to_string());
        runs.push(RunReport::from_outcome(&input.to_string_lossy(), trace.as_deref(), &outcome));
    }

    if options.results {
        let mode = if options.trace.is_some() { "dynamic" } else { "static" };
        println!(
            "Overall average {} {} improvement: {:.2}%",
            mode,
            config.objective.as_str(),
            relative_improvement(total_improvement, total_baseline)
        );
    }

    if let Some(path) = &options.report {
        let report = SynthesisReport::new(config.clone(), runs);
        report.save_any(path)?;
        info!(path = %path.display(), "report saved");
    }

    Ok(())
}

/// `<ISA><width>_<name>_<static|dynamic>_<size|count>.core_desc`
fn output_name(isa: &str, width: Width, input: &Path, outcome: &SynthesisOutcome) -> String {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let name = file_name.split('.').next().unwrap_or_default();
    let mode = if outcome.dynamic { "dynamic" } else { "static" };
    format!(
        "{}{}_{}_{}_{}.core_desc",
        isa,
        width.bits(),
        name,
        mode,
        outcome.objective.as_str()
    )
}

/// Print the ranking of one input
fn print_results(input: &Path, outcome: &SynthesisOutcome) {
    println!("Target: {}", input.display());
    println!("Instructions: {}", outcome.instruction_count);
    println!();

    for width in &outcome.widths {
        for (rank, scored) in width.selected.iter().enumerate() {
            println!(
                "{}: {}: {} ({:.2}%)",
                rank,
                scored.candidate,
                scored.score,
                outcome.relative(scored.score)
            );
        }
        if width.dropped > 0 {
            println!("({} candidates without an opcode)", width.dropped);
        }
        println!(
            "Total Improvement: {} {} ({:.2}%)",
            width.total_improvement(),
            outcome.objective.unit(),
            outcome.relative(width.total_improvement())
        );
        println!();
    }
}

/// List instructions in a report
fn list_instructions(report_path: &Path, detailed: bool, format: OutputFormat) -> Result<()> {
    let report = SynthesisReport::load_any(report_path)?;

    match format {
        OutputFormat::Text => {
            println!("Instructions in report");
            println!("======================");
            println!();

            for run in &report.runs {
                println!("{}", run.metadata.input);
                for width in &run.widths {
                    println!("  {}-bit:", width.width.bits());
                    for entry in &width.entries {
                        println!(
                            "    {}: {}, score: {} ({:.2}%)",
                            entry.rank, entry.name, entry.score, entry.relative
                        );

                        if detailed {
                            println!("      Encoding: {}", entry.encoding);
                            println!("      Assembly: {}", entry.assembly);
                            println!("      Behavior: {}", entry.behavior);
                            println!();
                        }
                    }
                }
            }

            println!();
            println!("Total: {} instructions", report.num_instructions());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report.runs)?);
        }
    }

    Ok(())
}

/// Show report information
fn show_info(report_path: &Path) -> Result<()> {
    let report = SynthesisReport::load_any(report_path)?;

    println!("Arise Report Information");
    println!("========================");
    println!();
    println!("Version: {}", report.version);
    println!("Runs: {}", report.runs.len());
    println!("Instructions: {}", report.num_instructions());
    println!();
    println!("Configuration:");
    println!(
        "  Widths: {:?}",
        report.config.widths.iter().map(|w| w.bits()).collect::<Vec<_>>()
    );
    println!("  Objective: {}", report.config.objective.as_str());
    println!("  Opcode length: {}", report.config.fusion.opcode_len);
    println!("  Ignore memory ops: {}", report.config.fusion.ignore_memory_ops);
    println!("  Instruction set: {} extends {}", report.config.isa.name, report.config.isa.base);
    println!();

    for run in &report.runs {
        let mode = if run.metadata.dynamic { "dynamic" } else { "static" };
        println!("Run: {}", run.metadata.input);
        if let Some(trace) = &run.metadata.trace {
            println!("  Trace: {}", trace);
        }
        println!("  Timestamp: {}", run.metadata.timestamp);
        println!("  Mode: {} {}", mode, run.metadata.objective.as_str());
        println!("  Instructions decoded: {}", run.metadata.instruction_count);
        println!("  Baseline: {} {}", run.metadata.baseline, run.metadata.objective.unit());
        for width in &run.widths {
            println!(
                "  {}-bit: {} instructions, {:.2}% improvement",
                width.width.bits(),
                width.entries.len(),
                run.relative(width)
            );
        }
        println!();
    }

    Ok(())
}
