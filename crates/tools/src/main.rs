use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline tools for globe geography files")]
struct Args {
    /// Engine config JSON (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarize features, codes and vertex counts
    Inspect {
        geography: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report the feature containing a lon/lat point
    Pick {
        geography: PathBuf,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
    },

    /// Write the equirectangular map texture as a PNG
    Render {
        geography: PathBuf,

        #[arg(long, default_value = "map.png")]
        out: PathBuf,

        /// Highlight this country code as selected
        #[arg(long)]
        select: Option<String>,
    },

    /// Run a headless engine through an external selection
    Simulate {
        geography: PathBuf,

        #[arg(long)]
        select: Option<String>,

        #[arg(long, default_value_t = 60)]
        frames: u64,

        /// Milliseconds between frames
        #[arg(long, default_value_t = 16.0)]
        dt_ms: f64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let config = tools::load_config(args.config.as_deref())?;

    match args.command {
        Command::Inspect { geography, json } => {
            let index = tools::load_index(&geography)?;
            let report = tools::inspect(&index);
            if json {
                let text = serde_json::to_string_pretty(&report).map_err(|e| format!("json: {e}"))?;
                println!("{text}");
            } else {
                println!(
                    "{} features, {} codes ({} duplicates), {} vertices",
                    report.features, report.codes, report.duplicate_codes, report.vertices
                );
                for f in &report.entries {
                    println!(
                        "{:>4}  {:<4}  {:<40}  {} polygon(s), {} vertices",
                        f.index,
                        f.code.as_deref().unwrap_or("-"),
                        f.name.as_deref().unwrap_or(""),
                        f.polygons,
                        f.vertices
                    );
                }
            }
        }
        Command::Pick {
            geography,
            lon,
            lat,
        } => {
            let index = tools::load_index(&geography)?;
            match tools::pick(&index, lon, lat) {
                Some(f) => println!(
                    "#{} {} {}",
                    f.index,
                    f.code.as_deref().unwrap_or("-"),
                    f.name.as_deref().unwrap_or("")
                ),
                None => println!("ocean"),
            }
        }
        Command::Render {
            geography,
            out,
            select,
        } => {
            let index = tools::load_index(&geography)?;
            let texture = tools::render(&index, &config, select.as_deref())?;
            tools::write_png(&texture, &out)?;
            tracing::info!(
                width = texture.width(),
                height = texture.height(),
                "wrote {}",
                out.display()
            );
        }
        Command::Simulate {
            geography,
            select,
            frames,
            dt_ms,
        } => {
            let index = tools::load_index(&geography)?;
            let report = tools::simulate(index, config, select.as_deref(), frames, dt_ms);
            let text = serde_json::to_string_pretty(&report).map_err(|e| format!("json: {e}"))?;
            println!("{text}");
        }
    }
    Ok(())
}
