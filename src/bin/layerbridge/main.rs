//! layerbridge CLI - inspect and convert point cloud and surface files.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use layerbridge::core::{Layer, LayerData};
use layerbridge::plugin::{detect, load_with, write_with, ReadInput};
use layerbridge::util::BBox3d;
use layerbridge::Config;

/// Verbosity level
#[derive(Clone, Copy)]
enum Verbosity {
    Quiet,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

fn init_tracing(verbosity: Verbosity) {
    // RUST_LOG wins over the command line flags.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("layerbridge={}", verbosity.directive())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut verbosity = Verbosity::Info;
    let mut config_path: Option<PathBuf> = None;
    let mut filtered_args: Vec<&str> = Vec::new();
    let mut iter = args[1..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => verbosity = Verbosity::Debug,
            "-vv" | "--trace" => verbosity = Verbosity::Trace,
            "-q" | "--quiet" => verbosity = Verbosity::Quiet,
            "--config" => match iter.next() {
                Some(p) => config_path = Some(PathBuf::from(p)),
                None => {
                    eprintln!("Error: --config needs a file argument");
                    std::process::exit(1);
                }
            },
            _ => filtered_args.push(arg),
        }
    }
    init_tracing(verbosity);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = load_config(config_path.as_deref()).and_then(|config| {
        match filtered_args[0] {
            "info" | "i" => {
                let json = filtered_args.iter().any(|&s| s == "--json" || s == "-j");
                let inputs: Vec<&str> = filtered_args[1..]
                    .iter()
                    .copied()
                    .filter(|&s| s != "--json" && s != "-j")
                    .collect();
                if inputs.is_empty() {
                    bail!("missing input\nUsage: layerbridge info <path>... [--json]");
                }
                cmd_info(&inputs, json, &config)
            }
            "convert" | "c" => {
                if filtered_args.len() < 3 {
                    bail!("missing arguments\nUsage: layerbridge convert <input>... <output>");
                }
                let (output, inputs) = filtered_args[1..]
                    .split_last()
                    .context("missing output")?;
                cmd_convert(inputs, output, &config)
            }
            "version" | "--version" | "-V" => {
                print_version();
                Ok(())
            }
            "help" | "h" | "-h" | "--help" => {
                print_help();
                Ok(())
            }
            // Default: if the path exists, show info
            other => {
                if Path::new(other).exists() {
                    cmd_info(&filtered_args, false, &config)
                } else {
                    print_help();
                    bail!("unknown command: {}", other)
                }
            }
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn print_help() {
    println!("layerbridge - point cloud and surface file bridge");
    println!();
    println!("USAGE:");
    println!("    layerbridge [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info    <path>... [--json]     Show kind, frames, rows, faces and features");
    println!("    c, convert <input>... <output>    Load input(s) as one layer and write it out");
    println!("    version                           Show version and build date");
    println!("    h, help                           Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose      Show debug output");
    println!("    -vv, --trace       Show trace output (very verbose)");
    println!("    -q, --quiet        Only show errors");
    println!("    --config <file>    Read settings from a JSON file");
    println!();
    println!("EXAMPLES:");
    println!("    layerbridge info mesh.ply                    # Single frame");
    println!("    layerbridge info tracks/ --json              # Directory of frames as JSON");
    println!("    layerbridge convert tracks/ out/tracks.vtk   # Writes out/tracks/000.vtk ...");
    println!("    layerbridge convert 0.obj 1.obj both.ply     # Two frames -> both/000.ply, both/001.ply");
    println!();
    println!("NOTES:");
    println!("    - Inputs are a file, several files or a directory; files are ordered by");
    println!("      the integer value of their names");
    println!("    - Passing an existing path directly is equivalent to 'info'");
    println!("    - Without --config, settings are read from the user config directory");
}

fn print_version() {
    let (date, time) = layerbridge::build_info();
    println!("layerbridge {} (built {} {})", env!("CARGO_PKG_VERSION"), date, time);
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(p) => Config::load(p).with_context(|| format!("loading config {}", p.display())),
        None => Ok(Config::load_or_default()),
    }
}

fn read_input(args: &[&str]) -> ReadInput {
    match args {
        [single] => ReadInput::from(*single),
        many => ReadInput::Paths(many.iter().map(PathBuf::from).collect()),
    }
}

/// Number of frames in a layer: distinct time indices for 4D data.
fn frame_count(layer: &Layer) -> usize {
    match layer.data().coordinates().time_column() {
        Some(times) => times
            .iter()
            .fold(0usize, |n, &t| n.max(t.round() as usize + 1)),
        None => 1,
    }
}

fn cmd_info(args: &[&str], json: bool, config: &Config) -> anyhow::Result<()> {
    let input = read_input(args);
    let kind = detect(&input).context("no reader for input (unsupported or unreadable)")?;
    let layer = kind
        .read(&input, config)
        .with_context(|| format!("loading {}", args.join(" ")))?;

    let positions = layer.data().coordinates().positions();
    let bounds = BBox3d::from_points(&positions);
    let faces = match layer.data() {
        LayerData::Surface { faces, .. } => faces.len(),
        LayerData::Points(_) => 0,
    };
    let features: Vec<&str> = layer.features().names().collect();
    let meta = layer.metadata();

    if json {
        let value = serde_json::json!({
            "name": meta.name,
            "kind": layer.kind().as_str(),
            "ndim": layer.data().coordinates().ndim(),
            "frames": frame_count(&layer),
            "rows": layer.data().num_rows(),
            "faces": faces,
            "features": features,
            "color_by": meta.color_by,
            "bounds": if bounds.is_empty() {
                serde_json::Value::Null
            } else {
                serde_json::json!({
                    "min": [bounds.min.x, bounds.min.y, bounds.min.z],
                    "max": [bounds.max.x, bounds.max.y, bounds.max.z],
                })
            },
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Layer:    {}", meta.name.as_deref().unwrap_or("(unnamed)"));
    println!("Kind:     {} ({}D)", layer.kind(), layer.data().coordinates().ndim());
    println!("Frames:   {}", frame_count(&layer));
    println!("Rows:     {}", layer.data().num_rows());
    if faces > 0 {
        println!("Faces:    {}", faces);
    }
    if features.is_empty() {
        println!("Features: (none)");
    } else {
        println!("Features: {}", features.join(", "));
    }
    if let Some(c) = &meta.color_by {
        println!("Color by: {}", c);
    }
    if !bounds.is_empty() {
        println!(
            "Bounds:   [{:.4}, {:.4}, {:.4}] - [{:.4}, {:.4}, {:.4}]",
            bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
        );
    }
    Ok(())
}

fn cmd_convert(inputs: &[&str], output: &str, config: &Config) -> anyhow::Result<()> {
    let input = read_input(inputs);
    let layer = load_with(&input, config).with_context(|| format!("loading {}", inputs.join(" ")))?;
    let written = write_with(output, &layer, config).with_context(|| format!("writing {}", output))?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}
