use mongodb::{
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client,
};
use std::sync::Arc;
use std::time::Duration;

/// Connect and ping once at startup. A failed ping is logged but not fatal:
/// the server may come up before Mongo does, and the driver reconnects.
pub async fn create_mongo_client(uri: &str) -> Arc<Client> {
    let mut options = ClientOptions::parse(uri)
        .await
        .expect("MONGODB_URI is not a valid connection string");

    options.connect_timeout = Some(Duration::from_secs(10));
    options.server_selection_timeout = Some(Duration::from_secs(10));
    options.max_pool_size = Some(10);
    options.min_pool_size = Some(1);
    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());

    let client = Client::with_options(options).expect("failed to build MongoDB client");

    match client
        .database("Bookings")
        .run_command(mongodb::bson::doc! { "ping": 1 })
        .await
    {
        Ok(_) => log::info!("Connected to MongoDB"),
        Err(e) => log::warn!("MongoDB ping failed, continuing anyway: {}", e),
    }

    Arc::new(client)
}
