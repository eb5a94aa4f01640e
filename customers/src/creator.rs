use std::sync::Arc;

use metrics::counter;

use crate::{
    model::{CreateCustomerResponse, Customer},
    storage::{CustomerStorage, StorageError},
};

#[derive(Clone)]
pub struct CustomerCreator {
    storage: Arc<dyn CustomerStorage>,
}

impl CustomerCreator {
    pub fn new(storage: Arc<dyn CustomerStorage>) -> Self {
        tracing::info!("Initializing new CustomerCreator");
        Self { storage }
    }

    pub async fn create(
        &self,
        customer: &Customer,
    ) -> Result<CreateCustomerResponse, StorageError> {
        tracing::info!(customer = ?customer, "Received customer");

        match self.storage.create_customer(customer).await {
            Ok(id) => {
                counter!("customers_created_total").increment(1);
                Ok(CreateCustomerResponse { id })
            }
            Err(e) => {
                counter!("customers_failed_total").increment(1);
                Err(e)
            }
        }
    }
}
