use crate::error::{QuantizeError, Result};

/// Tuning knobs of the quantizer pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizerConfig
{
	/// Edge length in pixels of each colour tile in the palette image.
	pub block_size: u32,

	/// Expected number of pixels per distinct colour, used to pre-size the colour index.
	pub duplication_factor: usize,

	/// Maximum number of colour counts accepted in one run.
	pub max_targets: usize,

	/// Write outputs on worker threads while the next colour count is processed.
	pub parallel_output: bool,
}

impl Default for QuantizerConfig
{
	fn default() -> Self
	{
		Self
		{
			block_size: 4,
			duplication_factor: 9,
			max_targets: 16,
			parallel_output: true,
		}
	}
}

impl QuantizerConfig
{
	pub fn new() -> Self
	{
		Self::default()
	}

	pub fn block_size(mut self, block_size: u32) -> Self
	{
		self.block_size = block_size.max(1);
		self
	}

	pub fn duplication_factor(mut self, factor: usize) -> Self
	{
		self.duplication_factor = factor.max(1);
		self
	}

	pub fn max_targets(mut self, max_targets: usize) -> Self
	{
		self.max_targets = max_targets;
		self
	}

	pub fn parallel_output(mut self, parallel: bool) -> Self
	{
		self.parallel_output = parallel;
		self
	}

	/// Check values that may have been set directly on the public fields.
	pub fn validate(&self) -> Result<()>
	{
		if self.block_size == 0
		{
			return Err(QuantizeError::InvalidConfig("block size must be at least 1"));
		}

		if self.duplication_factor == 0
		{
			return Err(QuantizeError::InvalidConfig("duplication factor must be at least 1"));
		}

		Ok(())
	}

	/// Validate requested colour counts and return them sorted ascending without duplicates.
	pub fn normalize_targets(&self, targets: &[usize]) -> Result<Vec<usize>>
	{
		if targets.is_empty()
		{
			return Err(QuantizeError::NoTargets);
		}

		if targets.len() > self.max_targets
		{
			return Err(QuantizeError::TooManyTargets { count: targets.len(), max: self.max_targets });
		}

		if let Some(&invalid) = targets.iter().find(|&&target| target == 0)
		{
			return Err(QuantizeError::InvalidTarget(invalid));
		}

		let mut sorted: Vec<usize> = targets.to_vec();
		sorted.sort_unstable();
		sorted.dedup();
		Ok(sorted)
	}
}
