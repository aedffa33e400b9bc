use std::path::PathBuf;
use std::env;
use anyhow::{anyhow, Result};

use crate::utils::file_utils::is_supported_image;

#[derive(Debug)]
pub struct Args
{
	// 1. Input/Output Parameters.
	/// Image to reduce (PNG or JPEG).
	pub input: Option<PathBuf>,

	/// Directory for the generated files. If not provided, files are written next to the input.
	pub out_dir: Option<PathBuf>,

	// 2. Reduction Parameters.
	/// Colour counts to reduce to, in the order given on the command line.
	pub counts: Vec<usize>,

	/// Maximum number of colour counts accepted in one run.
	pub max_counts: usize,

	/// Edge length in pixels of each colour tile in the palette image.
	pub block_size: u32,

	// 3. Output Parameters.
	/// Write the output files one after another instead of on worker threads.
	pub sequential: bool,

	/// Run a lossless PNG optimisation pass on every written file.
	pub optimize: bool,

	// 4. Program Metadata.
	/// Program version info.
	pub version: String,

	/// Program author info.
	pub author: String,

	/// Program description.
	pub about: String,
}

impl Args
{
	/// Create a new Args instance with default values.
	pub fn new() -> Self
	{
		Args
		{
			input: None,
			out_dir: None,
			counts: Vec::new(),
			max_counts: 16,
			block_size: 4,
			sequential: false,
			optimize: false,
			version: env!("CARGO_PKG_VERSION").to_string(),
			author: env!("CARGO_PKG_AUTHORS").to_string(),
			about: env!("CARGO_PKG_DESCRIPTION").to_string(),
		}
	}

	/// Parse command line arguments and return an Args struct.
	pub fn parse() -> Result<Self>
	{
		// Skip the program name (first argument).
		let cli_args: Vec<String> = env::args().skip(1).collect();
		Self::parse_from(&cli_args)
	}

	/// Parse the given arguments, not including the program name.
	pub fn parse_from(cli_args: &[String]) -> Result<Self>
	{
		let mut args: Args = Args::new();
		let mut positional: Vec<&String> = Vec::new();

		// Process arguments.
		let mut i: usize = 0;
		while i < cli_args.len()
		{
			let arg: &String = &cli_args[i];

			match arg.as_str()
			{
				// 1. Input/Output Parameters.
				"--out-dir" | "-o" =>
				{
					args.out_dir = Some(PathBuf::from(next_value(cli_args, &mut i)?));
				}

				// 2. Reduction Parameters.
				"--max-counts" | "-m" =>
				{
					let value: &String = next_value(cli_args, &mut i)?;
					args.max_counts = value.parse::<usize>().map_err(|_| anyhow!("Invalid max counts value: must be a positive integer"))?;
				}
				"--block-size" | "-b" =>
				{
					let value: &String = next_value(cli_args, &mut i)?;
					args.block_size = value.parse::<u32>().map_err(|_| anyhow!("Invalid block size value: must be an integer between 1 and 64"))?;
				}

				// 3. Output Parameters.
				"--sequential" | "-S" =>
				{
					args.sequential = true;
				}
				"--optimize" | "-O" =>
				{
					args.optimize = true;
				}

				// 4. Program Information.
				"--help" | "-h" =>
				{
					print_help(&args);
					std::process::exit(0);
				}
				"--version" | "-V" =>
				{
					println!("{} {}", env!("CARGO_PKG_NAME"), args.version);
					std::process::exit(0);
				}

				// Anything else is positional if it doesn't start with "-".
				_ =>
				{
					if !arg.starts_with('-')
					{
						positional.push(arg);
					}
					else
					{
						return Err(anyhow!("Unknown option: {}", arg));
					}
				}
			}

			i += 1;
		}

		// Positional arguments: <IMAGE> <COUNTS>.
		match positional.as_slice()
		{
			[] => {},
			[image] =>
			{
				args.input = Some(PathBuf::from(image));
			},
			[image, counts] =>
			{
				args.input = Some(PathBuf::from(image));
				args.counts = parse_counts(counts)?;
			},
			_ => return Err(anyhow!("Wrong number of arguments: expected <IMAGE> <COUNTS>, got {}", positional.len())),
		}

		Ok(args)
	}

	/// Validate parameter values and relationships.
	/// Returns Ok(()) if all parameters are valid, otherwise returns an error.
	pub fn validate(&self) -> Result<()>
	{
		// Validate the input image.
		let input: &PathBuf = self.input.as_ref().ok_or_else(|| anyhow!("Missing input image, see --help"))?;
		if !is_supported_image(input)
		{
			return Err(anyhow!("Invalid input '{}': file type can not be decoded, must be one of: png, jpeg, jpg", input.display()));
		}
		if !input.is_file()
		{
			return Err(anyhow!("Invalid input '{}': file not found", input.display()));
		}

		// Validate colour counts.
		if self.counts.is_empty()
		{
			return Err(anyhow!("Missing colour counts, e.g. 4,16,64"));
		}
		if self.max_counts == 0
		{
			return Err(anyhow!("Max counts must be at least 1"));
		}
		if self.counts.len() > self.max_counts
		{
			return Err(anyhow!("Can only contain a maximum of {} different reductions at once", self.max_counts));
		}

		// Validate block size.
		if self.block_size == 0 || self.block_size > 64
		{
			return Err(anyhow!("Block size must be between 1 and 64"));
		}

		// Validate output directory.
		if let Some(dir) = &self.out_dir
		{
			if !dir.is_dir()
			{
				return Err(anyhow!("Output directory '{}' does not exist", dir.display()));
			}
		}

		// All validations passed.
		Ok(())
	}
}

/// Take the value following the option at `i`.
fn next_value<'a>(cli_args: &'a [String], i: &mut usize) -> Result<&'a String>
{
	if *i + 1 < cli_args.len()
	{
		*i += 1;
		Ok(&cli_args[*i])
	}
	else
	{
		Err(anyhow!("Missing value for {} argument", cli_args[*i]))
	}
}

/// Split a comma separated list of colour counts, e.g. "4,16,64".
pub fn parse_counts(value: &str) -> Result<Vec<usize>>
{
	let mut counts: Vec<usize> = Vec::new();

	for token in value.split(',').map(str::trim).filter(|token| !token.is_empty())
	{
		match token.parse::<usize>()
		{
			Ok(count) if count > 0 => counts.push(count),
			_ => return Err(anyhow!("Invalid colour count: must be integer greater than 0, got: '{}'", token)),
		}
	}

	Ok(counts)
}

fn print_help(args: &Args)
{
	println!("{} - {}", args.about, args.version);
	println!("By {}", args.author);
	println!("\nUSAGE:");
	println!("    octoquant [OPTIONS] <IMAGE> <COUNTS>");
	println!("\nARGUMENTS:");
	println!("    <IMAGE>                      PNG or JPEG image to reduce");
	println!("    <COUNTS>                     Comma separated colour counts, e.g. 4,16,64");
	println!("\nOPTIONS:");
	// Input/Output Parameters.
	println!("  INPUT/OUTPUT:");
	println!("    -o, --out-dir <DIR>          Directory for the generated files");
	println!("");
	// Reduction Parameters.
	println!("  REDUCTION:");
	println!("    -m, --max-counts <N>         Maximum colour counts per run (default: 16)");
	println!("    -b, --block-size <PIXELS>    Palette tile size (1-64, default: 4)");
	println!("");
	// Output Parameters.
	println!("  OUTPUT:");
	println!("    -S, --sequential             Write files one after another");
	println!("    -O, --optimize               Losslessly optimize written PNG files");
	println!("");
	// General Options.
	println!("  GENERAL:");
	println!("    -h, --help                   Show help information");
	println!("    -V, --version                Display version information");
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn strings(values: &[&str]) -> Vec<String>
	{
		values.iter().map(|value| value.to_string()).collect()
	}

	#[test]
	fn parses_positionals_and_options()
	{
		let args: Args = Args::parse_from(&strings(&["-b", "8", "photo.jpg", "16, 4,64", "--sequential", "-O"])).unwrap();

		assert_eq!(args.input, Some(PathBuf::from("photo.jpg")));
		assert_eq!(args.counts, vec![16, 4, 64]);
		assert_eq!(args.block_size, 8);
		assert!(args.sequential);
		assert!(args.optimize);
		assert_eq!(args.out_dir, None);
	}

	#[test]
	fn rejects_bad_arguments()
	{
		assert!(Args::parse_from(&strings(&["a.png", "4", "extra"])).is_err());
		assert!(Args::parse_from(&strings(&["--unknown"])).is_err());
		assert!(Args::parse_from(&strings(&["a.png", "-b"])).is_err());
		assert!(parse_counts("4,0").is_err());
		assert!(parse_counts("4,x").is_err());
		assert_eq!(parse_counts("8,,2").unwrap(), vec![8, 2]);
	}
}
