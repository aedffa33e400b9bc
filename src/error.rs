use thiserror::Error;

/// Errors produced by the quantization core.
#[derive(Debug, Error)]
pub enum QuantizeError
{
	/// The bitmap has no pixels (undecodable input is surfaced this way).
	#[error("image is empty: {width}x{height}")]
	EmptyImage { width: u32, height: u32 },

	/// The RGBA buffer does not match the declared dimensions.
	#[error("pixel buffer length {len} does not match dimensions {width}x{height}")]
	BufferMismatch { len: usize, width: u32, height: u32 },

	/// No colour counts were requested.
	#[error("at least one colour count is required")]
	NoTargets,

	/// A colour count of zero was requested.
	#[error("colour counts must be greater than 0, got {0}")]
	InvalidTarget(usize),

	/// More simultaneous colour counts than the configured limit.
	#[error("can only reduce to a maximum of {max} different colour counts at once, got {count}")]
	TooManyTargets { count: usize, max: usize },

	/// Colour counts must be reduced in ascending order.
	#[error("colour count {requested} requested after {previous}, counts must ascend")]
	OutOfOrder { previous: usize, requested: usize },

	/// A configuration value is outside its allowed range.
	#[error("invalid configuration: {0}")]
	InvalidConfig(&'static str),

	/// The hash map ran out of configured prime sizes.
	#[error("hash map exceeded maximum allowed size. Desired: {desired} Max: {max}")]
	CapacityExceeded { desired: usize, max: usize },

	/// An internal structure was found in an impossible state.
	#[error("internal invariant violated: {0}")]
	Invariant(&'static str),
}

/// Result type alias for quantization operations.
pub type Result<T> = std::result::Result<T, QuantizeError>;
