use anyhow::{anyhow, Result};
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use octoquant::{dispatch, Bitmap, DispatchReport, Quantizer, QuantizerConfig};

mod utils
{
	pub mod arg_utils;
	pub mod file_utils;
	pub mod time_utils;
}
use utils::arg_utils::Args;
use utils::file_utils::{load_bitmap, PngFileSink};
use utils::time_utils::format_duration;


/// Reduce an image to one or more colour counts.
fn main() -> Result<()>
{
	// Diagnostics go to stderr, controlled by RUST_LOG.
	let filter: EnvFilter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	// Parse command line arguments.
	let args: Args = Args::parse()?;

	// Validate parameters using the centralized validation method.
	args.validate()?;

	let input: &Path = args.input.as_deref().ok_or_else(|| anyhow!("Missing input image"))?;
	let config: QuantizerConfig = QuantizerConfig::new()
		.block_size(args.block_size)
		.max_targets(args.max_counts)
		.parallel_output(!args.sequential);
	let targets: Vec<usize> = config.normalize_targets(&args.counts)?;

	// Print the processing settings with logical grouping.
	println!("Settings:");
	println!("----------------------------------------");

	// 1. Input/Output Parameters.
	println!("INPUT/OUTPUT:");
	println!("  - Image: {}", input.display());
	match &args.out_dir
	{
		Some(dir) => println!("  - Output directory: {}", dir.display()),
		None => println!("  - Output directory: Next to input"),
	}

	// 2. Reduction Parameters.
	println!("\nREDUCTION:");
	println!("  - Colour counts: {}", targets.iter().map(|count| count.to_string()).collect::<Vec<_>>().join(", "));
	println!("  - Palette tile size: {} px", config.block_size);

	// 3. Output Parameters.
	println!("\nOUTPUT:");
	println!("  - Writers: {}", if config.parallel_output { "Parallel" } else { "Sequential" });
	println!("  - PNG optimization: {}", if args.optimize { "Yes (Zopfli)" } else { "Off" });
	println!("----------------------------------------");
	println!();

	let start: Instant = Instant::now();

	let bitmap: Bitmap = load_bitmap(input)?;
	let mut quantizer: Quantizer = Quantizer::scan(&bitmap, config.clone())?;
	println!("Read {}x{} pixels containing {} unique colours", bitmap.width(), bitmap.height(), quantizer.distinct_colors());

	let sink: PngFileSink = PngFileSink
	{
		input: input.to_path_buf(),
		out_dir: args.out_dir.clone(),
		optimize: args.optimize,
	};
	let report: DispatchReport = dispatch(&mut quantizer, &targets, &sink, config.parallel_output)?;

	// Print summary.
	println!("\n========================================");
	println!("REDUCTION SUMMARY");
	println!("========================================");
	println!("Unique colours in source: {}", report.distinct_colors);
	println!("Reductions written: {}", report.written.len());

	if !report.failures.is_empty()
	{
		println!("Reductions with errors: {}", report.failures.len());
		println!("\nErrors:");
		for (count, error) in &report.failures
		{
			println!("  {} colours: {}", count, error);
		}
	}

	println!("Elapsed: {}", format_duration(start.elapsed()));
	println!("========================================");

	if !report.is_success()
	{
		return Err(anyhow!("{} of {} reductions could not be written", report.failures.len(), targets.len()));
	}

	Ok(())
}
