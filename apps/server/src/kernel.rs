//! Composition root: wires configuration, store, and router together and
//! owns the listening socket.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tracing::{error, info, instrument};

use lunasentri_infra_store::StoreClient;

use crate::bootstrap::bootstrap_admin;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

pub struct Kernel {
    port: u16,
    state: AppState,
}

impl Kernel {
    #[instrument(skip(config))]
    pub async fn ignite(config: Config) -> Self {
        let store = StoreClient::connect(&config.database_url, config.database_auth_token.clone())
            .await
            .expect("FATAL: store connection failed, aborting startup");

        let port = config.port;
        let state = AppState::new(store, config);

        bootstrap_admin(&state).await;

        Self { port, state }
    }

    pub async fn serve(self) {
        let router = build_router(self.state);
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port);

        info!(%addr, "lunasentri-server listening");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("FATAL: failed to bind listening port");

        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "server exited with error");
            std::process::exit(1);
        }
    }
}
