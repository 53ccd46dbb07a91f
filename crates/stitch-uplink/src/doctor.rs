use anyhow::Result;
use std::path::Path;

pub fn check_endpoint(base_url: &str) -> Result<()> {
    anyhow::ensure!(
        base_url.starts_with("http://") || base_url.starts_with("https://"),
        "uplink.base_url must start with http:// or https://: {}",
        base_url
    );
    Ok(())
}

pub fn check_snapshot_dir(dir: &str) -> Result<()> {
    let p = Path::new(dir);
    if p.exists() {
        anyhow::ensure!(p.is_dir(), "uplink.snapshot_dir is not a dir: {}", dir);
    }
    Ok(())
}
