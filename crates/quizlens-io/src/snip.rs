use anyhow::Result;

/// Open the Windows snipping overlay, the result lands on the clipboard
#[cfg(windows)]
pub fn launch_snipping_tool() -> Result<()> {
    use anyhow::Context;

    std::process::Command::new("explorer.exe")
        .arg("ms-screenclip:")
        .spawn()
        .context("Failed to launch the snipping tool")?;

    tracing::info!("Snipping tool launched");
    Ok(())
}

#[cfg(not(windows))]
pub fn launch_snipping_tool() -> Result<()> {
    Err(quizlens_core::error::Unsupported(
        "The snipping tool is only available on Windows".to_string(),
    )
    .into())
}
