use std::fmt::Display;
use std::sync::Mutex;

use tracing::{info, warn};

use crate::bitmap::Bitmap;
use crate::config::QuantizerConfig;
use crate::error::Result;
use crate::quantizer::{Quantizer, Reduction};

/// Destination of finished reductions, e.g. PNG files on disk.
///
/// `write` may be called from several worker threads at once.
pub trait OutputSink: Sync
{
	type Error: Display;

	fn write(&self, reduction: &Reduction) -> std::result::Result<(), Self::Error>;
}

/// Outcome of writing every requested colour count.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport
{
	/// Distinct colours of the source image.
	pub distinct_colors: usize,

	/// Requested colour counts written successfully, ascending.
	pub written: Vec<usize>,

	/// Requested colour counts whose write failed, with the error message.
	pub failures: Vec<(usize, String)>,
}

impl DispatchReport
{
	pub fn is_success(&self) -> bool
	{
		self.failures.is_empty()
	}
}

/// Reduce the quantizer's image to every colour count in `targets` and hand each
/// result to `sink`.
///
/// `targets` must be sorted ascending. With `parallel` set, each reduction is
/// written on a rayon worker while the next one is computed; the call returns
/// once every write has finished. A failed write is recorded in the report and
/// does not stop the others.
pub fn dispatch<S: OutputSink>(quantizer: &mut Quantizer, targets: &[usize], sink: &S, parallel: bool) -> Result<DispatchReport>
{
	let written: Mutex<Vec<usize>> = Mutex::new(Vec::new());
	let failures: Mutex<Vec<(usize, String)>> = Mutex::new(Vec::new());

	if parallel
	{
		rayon::scope(|scope| -> Result<()>
		{
			for &target in targets
			{
				// Each worker owns its copy of the bitmaps.
				let reduction: Reduction = quantizer.reduce(target)?;
				let written: &Mutex<Vec<usize>> = &written;
				let failures: &Mutex<Vec<(usize, String)>> = &failures;
				scope.spawn(move |_| write_reduction(sink, &reduction, written, failures));
			}
			Ok(())
		})?;
	}
	else
	{
		for &target in targets
		{
			let reduction: Reduction = quantizer.reduce(target)?;
			write_reduction(sink, &reduction, &written, &failures);
		}
	}

	let mut written: Vec<usize> = written.into_inner().expect("Written mutex poisoned");
	let mut failures: Vec<(usize, String)> = failures.into_inner().expect("Failures mutex poisoned");
	written.sort_unstable();
	failures.sort_unstable_by_key(|(target, _)| *target);

	Ok(DispatchReport
	{
		distinct_colors: quantizer.distinct_colors(),
		written,
		failures,
	})
}

/// Validate `targets`, scan `source` and write every reduction to `sink`.
pub fn quantize_to_sink<S: OutputSink>(source: &Bitmap, targets: &[usize], config: &QuantizerConfig, sink: &S) -> Result<DispatchReport>
{
	let targets: Vec<usize> = config.normalize_targets(targets)?;
	let mut quantizer: Quantizer = Quantizer::scan(source, config.clone())?;
	dispatch(&mut quantizer, &targets, sink, config.parallel_output)
}

fn write_reduction<S: OutputSink>(sink: &S, reduction: &Reduction, written: &Mutex<Vec<usize>>, failures: &Mutex<Vec<(usize, String)>>)
{
	match sink.write(reduction)
	{
		Ok(()) =>
		{
			info!(requested = reduction.requested, colours = reduction.colors, "wrote reduction");
			written.lock().expect("Written mutex poisoned").push(reduction.requested);
		},
		Err(err) =>
		{
			warn!(requested = reduction.requested, error = %err, "failed to write reduction");
			failures.lock().expect("Failures mutex poisoned").push((reduction.requested, err.to_string()));
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::color::Color;

	struct FailingSink;

	impl OutputSink for FailingSink
	{
		type Error = String;

		fn write(&self, reduction: &Reduction) -> std::result::Result<(), String>
		{
			if reduction.requested == 2
			{
				return Err("disk full".to_string());
			}
			Ok(())
		}
	}

	#[test]
	fn failed_write_does_not_stop_siblings()
	{
		let mut buffer: Vec<u8> = vec![0; 16 * 4];
		for i in 0..16
		{
			Color::new(i as u8 * 16, 255 - i as u8 * 16, 7).write_opaque(&mut buffer, i * 4);
		}
		let source: Bitmap = Bitmap::from_rgba(4, 4, buffer).unwrap();

		for parallel in [false, true]
		{
			let config: QuantizerConfig = QuantizerConfig::new().parallel_output(parallel);
			let report: DispatchReport = quantize_to_sink(&source, &[8, 2, 1, 8], &config, &FailingSink).unwrap();

			assert_eq!(report.distinct_colors, 16);
			assert_eq!(report.written, vec![1, 8]);
			assert_eq!(report.failures, vec![(2, "disk full".to_string())]);
			assert!(!report.is_success());
		}
	}
}
