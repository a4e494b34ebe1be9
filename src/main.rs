//! geoprep: command-line front end for the preparation pipelines

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use geoprep::cli::{
    derive_output_path, run_bin_years, run_harmonize, run_select, Cli, Commands,
    HarmonizeOptions, SelectOptions,
};
use geoprep::utils::{print_banner, print_completion, print_paths};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let start = Instant::now();

    print_banner(env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Harmonize {
            base_path,
            units,
            output_dir,
            format,
            discover,
            output_format,
            config,
        } => {
            let source = base_path.as_deref().unwrap_or("(from config)");
            print_paths("Geographic harmonization", Path::new(source), Some(&output_dir));
            let summary = run_harmonize(&HarmonizeOptions {
                base_path,
                units,
                output_dir,
                format,
                discover,
                output_format,
                config,
            })?;
            summary.display();
        }
        Commands::BinYears {
            input,
            output,
            config,
            infer_schema_length,
        } => {
            let output = output.unwrap_or_else(|| derive_output_path(&input, "binned"));
            print_paths("Year-of-loss binning", &input, Some(&output));
            let rows = run_bin_years(&input, &output, config.as_deref(), infer_schema_length)?;
            println!("    Wrote {} row(s)", rows);
        }
        Commands::Select {
            input,
            candidates,
            target,
            strategy,
            scale,
            drop_columns,
            sample_size,
            seed,
            export,
            config,
            infer_schema_length,
        } => {
            print_paths("Incremental feature selection", &input, export.as_deref());
            run_select(&SelectOptions {
                input,
                candidates,
                target,
                strategy,
                scale,
                drop_columns,
                sample_size,
                seed,
                export,
                config,
                infer_schema_length,
            })?;
        }
    }

    print_completion(&format!(
        "Done in {:.1}s",
        start.elapsed().as_secs_f64()
    ));
    Ok(())
}
