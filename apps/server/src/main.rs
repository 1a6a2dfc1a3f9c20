use clap::Parser;
use dotenvy::dotenv;

use lunasentri_server::prelude::*;
use lunasentri_shared_telemetry::init_tracing;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing("lunasentri_server");

    let config = Config::parse();
    let kernel = Kernel::ignite(config).await;
    kernel.serve().await;
}
