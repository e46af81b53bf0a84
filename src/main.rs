use faas_supervisor::exceptions::guard;
use faas_supervisor::supervisor::{LambdaInstance, Udocker, UnconfiguredBatch};
use faas_supervisor::{Supervisor, SupervisorConfig, SupervisorError};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .without_time()
        .init();

    if !cfg!(target_os = "linux") {
        guard("main", async { Err::<(), _>(SupervisorError::InvalidPlatform) }).await;
    }

    info!("Starting FaaS supervisor");
    run(service_fn(handle)).await
}

async fn handle(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let LambdaEvent { payload, context } = event;

    let response = guard("lambda_handler", async move {
        let config = SupervisorConfig::from_env()?;
        let instance = LambdaInstance::from_context(payload, &context);
        let runtime = Udocker::new(
            config.udocker.clone(),
            vec![config.input_dir.clone(), config.output_dir.clone()],
        );
        let supervisor = Supervisor::new(
            config,
            Some(instance),
            Box::new(runtime),
            Box::new(UnconfiguredBatch),
        )?;
        Ok(supervisor.run().await)
    })
    .await;

    Ok(match response {
        Some(response) => serde_json::to_value(response)?,
        None => Value::Null,
    })
}
