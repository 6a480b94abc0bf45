use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar for a run of `length` sequential requests.
pub fn single_pb(length: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(length);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [ {bar:50} ] {pos}/{len} {msg} {spinner}")?
            .progress_chars("#|-"),
    );
    Ok(pb)
}
