use std::ops::{Add, AddAssign, Div, Mul};

/// RGB color representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color
{
	pub r: u8,
	pub g: u8,
	pub b: u8,
}

impl Color
{
	pub const fn new(r: u8, g: u8, b: u8) -> Self
	{
		Self { r, g, b }
	}

	/// Unique 24-bit key of this color.
	pub const fn key(&self) -> u32
	{
		((self.r as u32) << 16) + ((self.g as u32) << 8) + self.b as u32
	}

	/// Inverse of `key`, the upper byte is ignored.
	pub const fn from_key(key: u32) -> Self
	{
		Self::new((key >> 16) as u8, (key >> 8) as u8, key as u8)
	}

	/// Promote the color to a position in RGB space.
	pub const fn to_vector(&self) -> Vector3
	{
		Vector3::new(self.r as i64, self.g as i64, self.b as i64)
	}

	/// Convert a position back to a color, wrapping each component into 0..=255.
	pub fn from_vector(v: Vector3) -> Self
	{
		Self::new(v.x.rem_euclid(256) as u8, v.y.rem_euclid(256) as u8, v.z.rem_euclid(256) as u8)
	}

	/// Read the color of the pixel starting at byte `i` of an RGBA buffer.
	pub fn from_buffer(buffer: &[u8], i: usize) -> Self
	{
		Self::new(buffer[i], buffer[i + 1], buffer[i + 2])
	}

	/// Write this color as an opaque pixel at byte `i` of an RGBA buffer.
	pub fn write_opaque(&self, buffer: &mut [u8], i: usize)
	{
		buffer[i] = self.r;
		buffer[i + 1] = self.g;
		buffer[i + 2] = self.b;
		buffer[i + 3] = u8::MAX;
	}
}

/// Three signed integer components, used for positions in color space and for weighted sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Vector3
{
	pub x: i64,
	pub y: i64,
	pub z: i64,
}

impl Vector3
{
	pub const fn new(x: i64, y: i64, z: i64) -> Self
	{
		Self { x, y, z }
	}

	/// Add a multiple of another vector to this one.
	pub fn add_scaled(&mut self, other: Vector3, s: i64)
	{
		self.x += other.x * s;
		self.y += other.y * s;
		self.z += other.z * s;
	}

	/// Squared euclidean distance, no square root needed for comparisons.
	pub fn sq_distance(&self, other: &Vector3) -> i64
	{
		let dx: i64 = self.x - other.x;
		let dy: i64 = self.y - other.y;
		let dz: i64 = self.z - other.z;
		dx * dx + dy * dy + dz * dz
	}
}

impl Add for Vector3
{
	type Output = Vector3;

	fn add(self, o: Vector3) -> Vector3
	{
		Vector3::new(self.x + o.x, self.y + o.y, self.z + o.z)
	}
}

impl AddAssign for Vector3
{
	fn add_assign(&mut self, o: Vector3)
	{
		self.x += o.x;
		self.y += o.y;
		self.z += o.z;
	}
}

impl Mul<i64> for Vector3
{
	type Output = Vector3;

	fn mul(self, s: i64) -> Vector3
	{
		Vector3::new(self.x * s, self.y * s, self.z * s)
	}
}

/// Integer division, truncating toward zero.
impl Div<i64> for Vector3
{
	type Output = Vector3;

	fn div(self, s: i64) -> Vector3
	{
		Vector3::new(self.x / s, self.y / s, self.z / s)
	}
}
