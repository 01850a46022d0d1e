//! List focus presets.

use beatstream_core::FocusLevel;

/// Run the presets command.
pub fn run() -> anyhow::Result<()> {
    println!("Focus Presets");
    println!("=============\n");
    for level in FocusLevel::ALL {
        println!("  {:<4} {:<8} {}", level.tag(), level.name(), level.description());
    }
    println!("\nSend {{\"focus_level\": \"<tag>\"}} to enable, {{\"focus_level\": \"\"}} to clear.");
    Ok(())
}
