use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use usdzcrate_cli::{convert, emit_blocks, emit_cube, ConversionOptions};
use usdzcrate_io::{ArchiveOptions, SceneOptions};

mod cli;

use cli::{Cli, Command};

fn main() -> ExitCode {
    let args = Cli::parse();
    cli::initialize_tracing(&args.log_filter, args.log_format);

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Convert {
            input,
            output,
            color,
            target_faces,
            center,
            target_size,
            store,
        } => {
            let options = ConversionOptions {
                color,
                target_faces,
                center,
                target_size: (target_size != 0.0).then_some(target_size),
                archive: if store {
                    ArchiveOptions::stored()
                } else {
                    ArchiveOptions::deflated()
                },
            };
            let report = convert(&input, &output, &options)
                .with_context(|| format!("converting {}", input.display()))?;
            println!(
                "Converted {} -> {} ({} faces, {} bytes)",
                input.display(),
                report.archive.path.display(),
                report.output_faces,
                report.archive.bytes
            );
        }
        Command::Cube {
            source,
            destination,
            size,
            color,
            name,
        } => {
            let color: [f32; 3] = color
                .as_slice()
                .try_into()
                .context("--color takes exactly three values")?;
            let report = emit_cube(&source, &destination, size, color, &SceneOptions::new(name, true))
                .with_context(|| format!("writing cube for {}", source.display()))?;
            println!(
                "Wrote {} ({} bytes)",
                report.path.display(),
                report.bytes
            );
        }
        Command::Blocks { out_dir, size } => {
            let reports = emit_blocks(&out_dir, size)
                .with_context(|| format!("writing blocks into {}", out_dir.display()))?;
            for report in reports {
                println!("Generated {}", report.path.display());
            }
        }
    }
    Ok(())
}
