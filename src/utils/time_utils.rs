use std::time::Duration;

/// Format an elapsed duration for the summary, e.g. "850 ms", "12.34 s" or "2m 05s".
pub fn format_duration(elapsed: Duration) -> String
{
	let millis: u128 = elapsed.as_millis();
	if millis < 1000
	{
		return format!("{} ms", millis);
	}

	let secs: u64 = elapsed.as_secs();
	if secs < 60
	{
		return format!("{:.2} s", elapsed.as_secs_f64());
	}

	let minutes: u64 = secs / 60;
	let seconds: u64 = secs % 60;
	format!("{}m {:02}s", minutes, seconds)
}
