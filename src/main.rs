use assure360::{AppConfig, RuntimePlatform};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> assure360::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.platform);

    assure360::run(config).await
}

fn init_tracing(platform: &RuntimePlatform) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // CloudWatch stamps each line itself
    if platform.is_lambda() {
        builder.json().without_time().init();
    } else {
        builder.init();
    }
}
