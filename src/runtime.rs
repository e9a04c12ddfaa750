use assure360_event::InvocationEvent;
use axum::Router;
use lambda_runtime::{LambdaEvent, service_fn};
use tokio::net::TcpListener;

use crate::adapter::LambdaAdapter;
use crate::config::AppConfig;
use crate::error::{Assure360Error, Result};
use crate::platform::RuntimePlatform;
use crate::routes::{AppState, router};

/// Builds the app router from the configuration and serves it on the detected platform.
pub async fn run(config: AppConfig) -> Result<()> {
    let app = router(AppState::from(&config));

    match &config.platform {
        RuntimePlatform::Lambda(lambda) => {
            tracing::info!(
                function = lambda.function_name.as_deref().unwrap_or("unknown"),
                version = lambda.function_version.as_deref().unwrap_or("unknown"),
                memory_size_mb = lambda.memory_size_mb,
                runtime_api = %lambda.runtime_api,
                environment = %config.app_info.environment,
                "starting lambda adapter"
            );
            run_lambda(app).await
        }
        RuntimePlatform::Standalone => serve(app, &config).await,
    }
}

/// Serves the router over HTTP until Ctrl-C or SIGTERM.
pub async fn serve(router: Router, config: &AppConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        environment = %config.app_info.environment,
        "assure360 listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Answers Lambda invocations with the router until the runtime stops.
pub async fn run_lambda(router: Router) -> Result<()> {
    let adapter = LambdaAdapter::new(router);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<InvocationEvent>| {
        let adapter = adapter.clone();
        async move { adapter.handle(event).await }
    }))
    .await
    .map_err(|err| Assure360Error::Lambda(err.to_string()))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("shutdown signal received");
}
