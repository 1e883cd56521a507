use anyhow::Result;
use tracing_subscriber::EnvFilter;

use airflow_user::{run, Console, Settings};

fn main() -> Result<()> {
    init_logging();

    let settings = Settings::from_env()?;
    let mut console = Console::new();
    let user = run(&mut console, || settings.open_session())?;

    println!(
        "\n✓ Created airflow user `{}` <{}> in {}",
        user.username,
        user.email,
        settings.database_path.display()
    );

    Ok(())
}

// Diagnostics go to stderr so they never interleave with the prompts
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
