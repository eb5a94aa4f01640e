use std::error::Error;
use std::sync::Arc;

use customers::executable_utils::{initialize_executable, initialize_tracing, run_backend};
use customers::storage::ProdCustomerStorage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("Starting backend...");
    let config = initialize_executable()?;
    initialize_tracing(&config.backend.log_level);
    tracing::info!(project = %config.common.project_name, "Configuration loaded");

    let storage = ProdCustomerStorage::new(&config.common.database_url);
    if let Err(e) = storage.check_connection().await {
        tracing::warn!(error = %e, "Database is not reachable at startup");
    }

    run_backend(config.backend, Arc::new(storage)).await
}
