use anyhow::{anyhow, Result};
use image::{ImageFormat, RgbaImage};
use oxipng::{optimize_from_memory, Deflater, Options as OxiOptions};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use octoquant::{Bitmap, OutputSink, Reduction};

/// Checks if a file is a decodable image by its extension.
pub fn is_supported_image(path: &Path) -> bool
{
	path.extension()
		.map(|ext| matches!(ext.to_string_lossy().to_lowercase().as_str(), "png" | "jpg" | "jpeg"))
		.unwrap_or(false)
}

/// Decode an image file into an opaque RGBA bitmap.
pub fn load_bitmap(path: &Path) -> Result<Bitmap>
{
	let img = image::open(path)
		.map_err(|e| anyhow!("Failed to decode {}: {}", path.display(), e))?;
	let mut rgba: RgbaImage = img.to_rgba8();

	// Alpha is not used for quantization.
	for pixel in rgba.pixels_mut()
	{
		pixel[3] = u8::MAX;
	}

	let (width, height) = rgba.dimensions();
	Bitmap::from_rgba(width, height, rgba.into_raw())
		.map_err(|e| anyhow!("Invalid image {}: {}", path.display(), e))
}

/// Path of a generated file: `<stem>_<kind>_<count>.png`, next to the input unless a directory is given.
pub fn output_path(input: &Path, out_dir: Option<&Path>, kind: &str, count: usize) -> PathBuf
{
	let stem: String = input.file_stem()
		.map(|stem| stem.to_string_lossy().to_string())
		.unwrap_or_else(|| "image".to_string());
	let file_name: String = format!("{}_{}_{}.png", stem, kind, count);

	match out_dir
	{
		Some(dir) => dir.join(file_name),
		None => input.with_file_name(file_name),
	}
}

/// Encode a bitmap as PNG.
pub fn encode_png(bitmap: &Bitmap) -> Result<Vec<u8>>
{
	let (width, height) = bitmap.dimensions();
	let rgba = RgbaImage::from_raw(width, height, bitmap.as_bytes().to_vec())
		.ok_or_else(|| anyhow!("Bitmap buffer does not match {}x{}", width, height))?;

	let mut buffer = Vec::new();
	{
		let mut cursor = Cursor::new(&mut buffer);
		image::DynamicImage::ImageRgba8(rgba).write_to(&mut cursor, ImageFormat::Png)
			.map_err(|e| anyhow!("Failed to encode image: {}", e))?;
	}

	Ok(buffer)
}

/// Losslessly recompress PNG data.
pub fn optimize_png(png_data: &[u8]) -> Result<Vec<u8>>
{
	let mut options = OxiOptions::default();
	options.strip = oxipng::StripChunks::Safe;
	options.optimize_alpha = true;
	options.interlace = None;
	options.bit_depth_reduction = true;
	options.color_type_reduction = true;
	options.palette_reduction = true;
	options.deflater = Deflater::Zopfli(Default::default());

	optimize_from_memory(png_data, &options)
		.map_err(|e| anyhow!("Failed to optimize PNG: {}", e))
}

/// Writes each reduction as `<stem>_reduced_<n>.png` and `<stem>_palette_<n>.png`.
pub struct PngFileSink
{
	pub input: PathBuf,
	pub out_dir: Option<PathBuf>,
	pub optimize: bool,
}

impl PngFileSink
{
	fn write_png(&self, bitmap: &Bitmap, path: &Path) -> Result<()>
	{
		let mut data: Vec<u8> = encode_png(bitmap)?;
		if self.optimize
		{
			data = optimize_png(&data)?;
		}

		fs::write(path, &data)
			.map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;
		println!("Wrote {}", path.display());
		Ok(())
	}
}

impl OutputSink for PngFileSink
{
	type Error = anyhow::Error;

	fn write(&self, reduction: &Reduction) -> Result<()>
	{
		// The requested count names the files even when fewer colours exist.
		let image_path: PathBuf = output_path(&self.input, self.out_dir.as_deref(), "reduced", reduction.requested);
		self.write_png(&reduction.image, &image_path)?;

		let palette_path: PathBuf = output_path(&self.input, self.out_dir.as_deref(), "palette", reduction.requested);
		self.write_png(&reduction.palette, &palette_path)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn recognises_image_extensions()
	{
		assert!(is_supported_image(Path::new("a/b.PNG")));
		assert!(is_supported_image(Path::new("photo.jpeg")));
		assert!(is_supported_image(Path::new("photo.jpg")));
		assert!(!is_supported_image(Path::new("photo.gif")));
		assert!(!is_supported_image(Path::new("photo")));
	}

	#[test]
	fn output_paths_follow_input()
	{
		let input: &Path = Path::new("shots/cat.jpg");
		assert_eq!(output_path(input, None, "reduced", 16), PathBuf::from("shots/cat_reduced_16.png"));
		assert_eq!(output_path(input, Some(Path::new("out")), "palette", 4), PathBuf::from("out/cat_palette_4.png"));
	}

	#[test]
	fn encodes_png_signature()
	{
		let bitmap: Bitmap = Bitmap::new(3, 2);
		let data: Vec<u8> = encode_png(&bitmap).unwrap();
		assert_eq!(&data[..8], b"\x89PNG\r\n\x1a\n");
	}
}
