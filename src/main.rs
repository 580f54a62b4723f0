use anyhow::Result;
use sahayak::config::AppConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut config = AppConfig::from_env()?;
    // The first argument plays the part of the route parameter.
    if let Some(mode) = std::env::args().nth(1) {
        config.mode = Some(mode);
    }

    sahayak::ui::launch(config);
    Ok(())
}
