//! Pipeline simulator CLI.
//!
//! Single entry point for running a program image through the simulator:
//! load a binary or hex image, run the pipeline to HALT (or a cycle
//! budget), then dump the trace, final state, and statistics files.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use pipesim_core::sim::loader;
use pipesim_core::{
    MemoryStore, PipelineEngine, RunStatus, SimConfig, Simulator, TraceSink,
};

#[derive(Parser, Debug)]
#[command(
    name = "pipesim",
    author,
    version,
    about = "Cycle-accurate five-stage pipeline simulator",
    long_about = "Run a program image through a five-stage in-order pipeline with split\n\
                  instruction and data caches.\n\n\
                  Examples:\n  \
                  pipesim run -f prog.bin -o out\n  \
                  pipesim run -f prog.hex --hex --config machine.json --cycles 10000"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a program image until HALT or a cycle budget.
    Run {
        /// Program image to execute.
        #[arg(short, long)]
        file: PathBuf,

        /// Treat the image as hex text (one 32-bit word per line).
        #[arg(long)]
        hex: bool,

        /// JSON configuration file; defaults apply when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Cycle budget; 0 runs until HALT.
        #[arg(long, default_value_t = 0)]
        cycles: u64,

        /// Base name for the output files.
        #[arg(short, long, default_value = "sim")]
        output: String,

        /// Print a per-cycle pipeline diagram to stderr.
        #[arg(long)]
        trace: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            file,
            hex,
            config,
            cycles,
            output,
            trace,
        } => cmd_run(file, hex, config, cycles, &output, trace),
    }
}

/// Loads the image, runs the engine, and writes all output files.
fn cmd_run(
    file: PathBuf,
    hex: bool,
    config_path: Option<PathBuf>,
    cycles: u64,
    output: &str,
    trace: bool,
) {
    let mut config = match config_path {
        Some(path) => {
            let text = std::fs::read_to_string(&path).unwrap_or_else(|e| {
                eprintln!("[!] cannot read config {}: {}", path.display(), e);
                process::exit(1);
            });
            serde_json::from_str::<SimConfig>(&text).unwrap_or_else(|e| {
                eprintln!("[!] bad config {}: {}", path.display(), e);
                process::exit(1);
            })
        }
        None => SimConfig::default(),
    };
    config.general.trace = config.general.trace || trace;

    if let Err(e) = config.validate() {
        eprintln!("[!] invalid configuration: {}", e);
        process::exit(1);
    }

    let image = if hex {
        loader::load_hex(&file)
    } else {
        loader::load_binary(&file)
    }
    .unwrap_or_else(|e| {
        eprintln!("[!] cannot load {}: {}", file.display(), e);
        process::exit(1);
    });

    let mut mem = MemoryStore::new(config.memory.size_bytes);
    if !mem.load_at(&image, config.general.start_pc) {
        eprintln!(
            "[!] image ({} bytes) does not fit in memory ({} bytes) at {:#x}",
            image.len(),
            config.memory.size_bytes,
            config.general.start_pc
        );
        process::exit(1);
    }

    let sink = TraceSink::to_files(output).unwrap_or_else(|e| {
        eprintln!("[!] cannot create output files for base '{}': {}", output, e);
        process::exit(1);
    });

    let sim = Simulator::new(mem);
    let mut engine = PipelineEngine::new(&config, sim, sink).unwrap_or_else(|e| {
        eprintln!("[!] invalid cache configuration: {}", e);
        process::exit(1);
    });

    println!(
        "[*] {} ({} bytes) @ {:#x}",
        file.display(),
        image.len(),
        config.general.start_pc
    );
    println!(
        "    I-cache {}B/{}B/{}-way miss={}  D-cache {}B/{}B/{}-way miss={}",
        config.icache.size_bytes,
        config.icache.line_bytes,
        config.icache.ways,
        config.icache.miss_latency,
        config.dcache.size_bytes,
        config.dcache.line_bytes,
        config.dcache.ways,
        config.dcache.miss_latency
    );

    let status = engine.run_cycles(cycles).unwrap_or_else(|e| {
        eprintln!("[!] simulation failed: {}", e);
        process::exit(1);
    });

    let stats = engine.finalize().unwrap_or_else(|e| {
        eprintln!("[!] finalize failed: {}", e);
        process::exit(1);
    });

    match status {
        RunStatus::Halted => println!("[*] HALT after {} cycles", stats.cycles),
        RunStatus::Completed => println!("[*] cycle budget exhausted at {} cycles", stats.cycles),
    }
    stats.print();
}
