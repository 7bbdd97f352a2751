use clap::{Parser, Subcommand};
use seistream::filter::{apply_to_trace, Butterworth, FilterPhase};
use seistream::{LengthMode, StreamPreamble, StreamRegistry, TraceRecord};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "seistream", about = "Trace record stream writer and zero-phase filter CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a trace stream, re-encoding every record
    Copy {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Allow per-trace sample counts instead of fixed-length mode
        #[arg(long)]
        variable: bool,
        /// Prepend the one-time text + binary stream preamble
        #[arg(long)]
        preamble: bool,
    },
    /// Apply a Butterworth band filter to every trace
    Filter {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Low-cut (highpass) 3 dB frequency, cycles/sample
        #[arg(long)]
        f3dblo: Option<f32>,
        /// High-cut (lowpass) 3 dB frequency, cycles/sample
        #[arg(long)]
        f3dbhi: Option<f32>,
        /// Poles in the low-cut stage
        #[arg(long, default_value_t = 3)]
        npoleslo: usize,
        /// Poles in the high-cut stage
        #[arg(long, default_value_t = 3)]
        npoleshi: usize,
        /// Minimum-phase (causal) filtering instead of zero-phase
        #[arg(long)]
        minphase: bool,
        /// Allow per-trace sample counts instead of fixed-length mode
        #[arg(long)]
        variable: bool,
    },
    /// Show header fields of the leading traces
    Info {
        input: PathBuf,
        /// Number of traces to show
        #[arg(short, long, default_value_t = 10)]
        count: usize,
        /// Emit headers as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    match Cli::parse().command {

        // ── Copy ─────────────────────────────────────────────────────────────
        Commands::Copy { input, output, variable, preamble } => {
            let mode = length_mode(variable);
            let mut reader = BufReader::new(File::open(&input)?);
            let mut registry = StreamRegistry::new();
            let dest = registry.open(Box::new(File::create(&output)?))?;

            let mut written = 0u64;
            while let Some(trace) = TraceRecord::read_from(&mut reader)? {
                if written == 0 && preamble {
                    let block = StreamPreamble::new(
                        trace.header.trid,
                        trace.header.ns,
                        trace.header.dt,
                    );
                    registry.write_preamble(dest, &block)?;
                }
                registry.write_trace(dest, &trace, mode)?;
                written += 1;
            }
            registry.release(dest)?;
            println!("Copied {} trace(s) to {}", written, output.display());
        }

        // ── Filter ───────────────────────────────────────────────────────────
        Commands::Filter {
            input, output, f3dblo, f3dbhi, npoleslo, npoleshi, minphase, variable,
        } => {
            let phase = if minphase { FilterPhase::Causal } else { FilterPhase::ZeroPhase };
            let locut = f3dblo.map(|f| Butterworth::highpass(npoleslo, f)).transpose()?;
            let hicut = f3dbhi.map(|f| Butterworth::lowpass(npoleshi, f)).transpose()?;
            if locut.is_none() && hicut.is_none() {
                return Err("nothing to do: give --f3dblo and/or --f3dbhi".into());
            }

            let mode = length_mode(variable);
            let mut reader = BufReader::new(File::open(&input)?);
            let mut registry = StreamRegistry::new();
            let dest = registry.open(Box::new(File::create(&output)?))?;

            let mut written = 0u64;
            while let Some(mut trace) = TraceRecord::read_from(&mut reader)? {
                if let Some(ref f) = locut {
                    apply_to_trace(f, &mut trace, phase);
                }
                if let Some(ref f) = hicut {
                    apply_to_trace(f, &mut trace, phase);
                }
                registry.write_trace(dest, &trace, mode)?;
                written += 1;
            }
            registry.release(dest)?;
            println!("Filtered {} trace(s) to {}", written, output.display());
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input, count, json } => {
            let mut reader = BufReader::new(File::open(&input)?);
            let mut headers = Vec::new();
            while headers.len() < count {
                match TraceRecord::read_from(&mut reader)? {
                    Some(trace) => headers.push(trace.header),
                    None => break,
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&headers)?);
            } else {
                println!("{:>6} {:>6} {:>6} {:>6} {:>8} {:>10}",
                         "trace", "ns", "dt", "trid", "cdp", "offset");
                for (i, h) in headers.iter().enumerate() {
                    println!("{:>6} {:>6} {:>6} {:>6} {:>8} {:>10}",
                             i + 1, h.ns, h.dt, h.trid, h.cdp, h.offset);
                }
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn length_mode(variable: bool) -> LengthMode {
    if variable {
        LengthMode::Variable
    } else {
        LengthMode::Fixed
    }
}
