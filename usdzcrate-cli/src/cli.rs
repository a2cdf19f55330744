use std::path::PathBuf;

use clap::{Subcommand, ValueHint};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, clap::ValueEnum)]
pub enum LogFormat {
    Compact,
    Full,
    Pretty,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Compact => f.write_str("compact"),
            LogFormat::Full => f.write_str("full"),
            LogFormat::Pretty => f.write_str("pretty"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

#[derive(Debug, clap::Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Logging output filters; comma-separated
    #[arg(
        short,
        long,
        global = true,
        default_value = "warn,usdzcrate=info",
        env = "USDZCRATE_LOG"
    )]
    pub log_filter: String,
    /// Logging output format
    #[arg(long, global = true, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a 3MF or OBJ mesh into a normalized USDZ preview
    Convert {
        /// Mesh to convert (.3mf or .obj)
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Archive to write
        #[arg(value_hint = ValueHint::FilePath)]
        output: PathBuf,
        /// Diffuse color
        #[arg(long, default_value = "0.6,0.6,0.6", value_parser = parse_rgb, value_name = "R,G,B")]
        color: [f32; 3],
        /// Approximate number of faces after simplification; 0 disables
        #[arg(long, default_value_t = usdzcrate_cli::DEFAULT_TARGET_FACES)]
        target_faces: usize,
        /// Move the center of mass to the origin before export
        #[arg(long)]
        center: bool,
        /// Longest edge after normalization; 0 disables
        #[arg(long, default_value_t = usdzcrate_cli::DEFAULT_TARGET_SIZE)]
        target_size: f32,
        /// Store the scene uncompressed instead of deflating it
        #[arg(long)]
        store: bool,
    },
    /// Replace an existing asset with a plain colored cube
    Cube {
        /// Asset being replaced; must exist
        #[arg(value_hint = ValueHint::FilePath)]
        source: PathBuf,
        /// Archive to write; parent directories are created
        #[arg(value_hint = ValueHint::FilePath)]
        destination: PathBuf,
        /// Cube edge length in meters
        #[arg(long, default_value_t = usdzcrate_core::DEFAULT_CUBE_SIZE)]
        size: f32,
        /// Diffuse color
        #[arg(long, num_args = 3, value_names = ["R", "G", "B"], default_values_t = usdzcrate_cli::DEFAULT_BLOCK_COLOR)]
        color: Vec<f32>,
        /// Mesh prim name inside the scene
        #[arg(long, default_value = "Block")]
        name: String,
    },
    /// Write the built-in palette of cube blocks
    Blocks {
        /// Directory receiving one archive per block
        #[arg(long, default_value = "Resources/Blocks", value_hint = ValueHint::DirPath)]
        out_dir: PathBuf,
        /// Cube edge length in meters
        #[arg(long, default_value_t = usdzcrate_core::DEFAULT_CUBE_SIZE)]
        size: f32,
    },
}

/// Parse `R,G,B`; whitespace around components is allowed.
pub fn parse_rgb(s: &str) -> Result<[f32; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [r, g, b] = parts[..] else {
        return Err(format!("expected three comma-separated numbers, got \"{}\"", s));
    };
    let component = |v: &str| {
        v.parse::<f32>()
            .map_err(|e| format!("invalid color component \"{}\": {}", v, e))
    };
    Ok([component(r)?, component(g)?, component(b)?])
}

/// Set up log output on stderr
pub(crate) fn initialize_tracing(log_filter: &str, log_format: LogFormat) {
    let tsub = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter);

    match log_format {
        LogFormat::Compact => tsub.compact().init(),
        LogFormat::Full => tsub.init(),
        LogFormat::Pretty => tsub.pretty().init(),
        LogFormat::Json => tsub.json().init(),
    }
}
