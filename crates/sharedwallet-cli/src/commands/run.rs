//! Run command - execute a JSON script

use std::path::Path;

use crate::display;
use crate::script;

pub async fn run_script(path: &Path, json: bool) -> anyhow::Result<()> {
    tracing::info!(script = %path.display(), "Running script");
    let report = script::run_file(path).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report.snapshot)?);
    } else {
        display::report(&report);
    }
    Ok(())
}
