use crate::cli::args::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::processors::{IntegrityChecker, ParallelProcessor};
use crate::readers::ConcurrentReader;
use crate::utils::constants::{CLEANED_FILE, FEATURES_FILE, OUTLIERS_FILE, REPORT_FILE, WEEKLY_FILE};
use crate::utils::filename::generate_default_output_dir;
use crate::utils::progress::ProgressReporter;
use crate::writers::{ParquetWriter, ReviewWriter};
use tracing::info;

pub async fn run(cli: Cli) -> Result<()> {
    let config = PipelineConfig::load(cli.config.as_deref())?;

    // The spinner and log lines would interleave, so keep only one
    let silent = cli.verbose;

    match cli.command {
        Commands::Process {
            input,
            translations,
            output_dir,
            compression,
            validate_only,
        } => {
            let output_dir = output_dir.unwrap_or_else(generate_default_output_dir);

            println!("Processing weather snapshot...");
            println!("Input file: {}", input.display());
            println!("Output directory: {}", output_dir.display());
            println!(
                "Workers: {}, Chunk size: {}",
                config.max_workers, config.chunk_size
            );

            // Fail on a bad codec before doing any work
            let writer = ParquetWriter::new()
                .with_compression(&compression)?
                .with_batch_size(config.chunk_size);

            let (snapshot, translations) = ConcurrentReader::new()
                .load_inputs(&input, translations.as_deref())
                .await?;

            let progress = ProgressReporter::with_stages("Cleaning snapshot...", 4, silent);
            let processor = ParallelProcessor::new(config);
            let output = processor.process(&snapshot, &translations, Some(&progress))?;

            progress.finish_with_message(&format!(
                "Cleaned {} rows into {}",
                output.report.input_rows, output.report.cleaned_rows
            ));

            println!("\n{}", output.report.summary());
            println!("{}", IntegrityChecker::new().generate_summary(&output.integrity));

            if validate_only {
                println!("Validation complete - no output files written");
                return Ok(());
            }

            std::fs::create_dir_all(&output_dir)?;

            let cleaned_path = output_dir.join(CLEANED_FILE);
            let features_path = output_dir.join(FEATURES_FILE);
            let weekly_path = output_dir.join(WEEKLY_FILE);

            writer.write_cleaned(&output.cleaned, &cleaned_path)?;
            writer.write_features(&output.features, &features_path)?;
            writer.write_weekly(&output.weekly, &weekly_path)?;

            let review = ReviewWriter::new();
            review.write_outliers(&output.flags, &output_dir.join(OUTLIERS_FILE))?;
            review.write_report(&output.report, &output_dir.join(REPORT_FILE))?;

            for path in [&cleaned_path, &features_path, &weekly_path] {
                let file_info = writer.get_file_info(path)?;
                println!("\n{}\n{}", path.display(), file_info.summary());
            }

            info!("Outputs written to {}", output_dir.display());
            println!("\nProcessing complete!");
        }

        Commands::Validate {
            input,
            translations,
        } => {
            println!("Validating weather snapshot...");
            println!("Input file: {}", input.display());

            let (snapshot, translations) = ConcurrentReader::new()
                .load_inputs(&input, translations.as_deref())
                .await?;

            let progress = ProgressReporter::new_spinner("Validating data...", silent);
            let processor = ParallelProcessor::new(config);
            let (_cleaned, integrity_report, report) =
                processor.clean_only(&snapshot, &translations)?;

            progress.finish_with_message("Validation complete");

            println!("\n{}", report.summary());
            println!("{}", IntegrityChecker::new().generate_summary(&integrity_report));

            if integrity_report.is_clean() && report.skipped_rows.is_empty() {
                println!("✅ All data passed validation checks");
            } else {
                println!(
                    "⚠️  Found {} skipped rows and {} integrity violations",
                    report.skipped_rows.len(),
                    integrity_report.violations.len()
                );
                for skipped in report.skipped_rows.iter().take(10) {
                    println!("  line {}: {}", skipped.line, skipped.reason);
                }
            }
        }

        Commands::Info { file } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;

            println!("\nFile Details:");
            println!("{}", file_info.summary());
        }
    }

    Ok(())
}
