use crate::error::{QuantizeError, Result};

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// Decoded image, row-major RGBA with 8 bits per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap
{
	width: u32,
	height: u32,
	buffer: Vec<u8>,
}

impl Bitmap
{
	/// Create a bitmap of the given size, every pixel opaque black.
	pub fn new(width: u32, height: u32) -> Self
	{
		let mut bitmap: Bitmap = Self { width: 0, height: 0, buffer: Vec::new() };
		bitmap.resize(width, height);
		bitmap
	}

	/// Wrap an existing RGBA buffer, rejecting empty images and mismatched lengths.
	pub fn from_rgba(width: u32, height: u32, buffer: Vec<u8>) -> Result<Self>
	{
		if width == 0 || height == 0
		{
			return Err(QuantizeError::EmptyImage { width, height });
		}

		if buffer.len() != width as usize * height as usize * CHANNELS
		{
			return Err(QuantizeError::BufferMismatch { len: buffer.len(), width, height });
		}

		Ok(Self { width, height, buffer })
	}

	pub fn width(&self) -> u32
	{
		self.width
	}

	pub fn height(&self) -> u32
	{
		self.height
	}

	pub fn dimensions(&self) -> (u32, u32)
	{
		(self.width, self.height)
	}

	pub fn pixel_count(&self) -> usize
	{
		self.width as usize * self.height as usize
	}

	pub fn as_bytes(&self) -> &[u8]
	{
		&self.buffer
	}

	pub fn as_bytes_mut(&mut self) -> &mut [u8]
	{
		&mut self.buffer
	}

	/// RGBA value of the pixel at (x, y).
	pub fn pixel(&self, x: u32, y: u32) -> [u8; 4]
	{
		let i: usize = (y as usize * self.width as usize + x as usize) * CHANNELS;
		[self.buffer[i], self.buffer[i + 1], self.buffer[i + 2], self.buffer[i + 3]]
	}

	/// Change the dimensions and reset every pixel to opaque black.
	/// The allocation is reused and only ever grows.
	pub fn resize(&mut self, width: u32, height: u32)
	{
		self.width = width;
		self.height = height;
		self.buffer.clear();
		self.buffer.resize(width as usize * height as usize * CHANNELS, 0);

		for pixel in self.buffer.chunks_exact_mut(CHANNELS)
		{
			pixel[3] = u8::MAX;
		}
	}
}
