//! List control parameters.

use beatstream_config::param_ranges;
use beatstream_core::{DEFAULT_SAMPLE_RATE, Waveform};
use clap::Args;

/// Parameter listing options.
#[derive(Args)]
pub struct ParamsArgs {
    /// Sample rate used for the filter cutoff bound
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,
}

/// Run the params command.
pub fn run(args: ParamsArgs) -> anyhow::Result<()> {
    println!("Control Parameters");
    println!("==================\n");

    for range in param_ranges(f64::from(args.sample_rate)) {
        let default = range
            .default
            .map_or_else(|| "none".to_string(), |d| d.to_string());
        println!(
            "  {:<14} {:>6} - {:<8} {:<3} default {}",
            range.name, range.min, range.max, range.unit, default
        );
    }

    let waveforms: Vec<&str> = Waveform::ALL.iter().map(Waveform::name).collect();
    println!("  {:<14} binaural | monaural   default binaural", "mode");
    println!(
        "  {:<14} {}   default sine",
        "waveform",
        waveforms.join(" | ")
    );
    println!("  {:<14} see `beatstream presets`", "focus_level");

    Ok(())
}
