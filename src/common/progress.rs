use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::ui::{OutputFormat, get_output_format};

fn hidden_in_json(pb: ProgressBar) -> ProgressBar {
    // Progress bars would interleave with JSON events on the terminal
    if get_output_format() == OutputFormat::Json {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb
}

/// Progress bar over a known number of work items, e.g. clips or frames
pub fn create_counter(total: u64, message: impl Into<String>) -> ProgressBar {
    let pb = hidden_in_json(ProgressBar::new(total));
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
