use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Extension, Query, State, WebSocketUpgrade};
use axum::response::Response;
use tracing::warn;

use crate::error::ApiError;
use crate::handlers::metrics::{local_host_sample, MachineQuery};
use crate::middleware::OperatorIdentity;
use crate::state::AppState;

const STREAM_INTERVAL: Duration = Duration::from_secs(3);

/// Upgrades to a websocket that pushes one sample every [`STREAM_INTERVAL`].
/// Ownership is checked up front, exactly like [`crate::handlers::metrics::latest_metrics`];
/// the loop itself trusts the machine id captured at upgrade time.
pub async fn stream_metrics(
    Extension(identity): Extension<OperatorIdentity>,
    State(state): State<AppState>,
    Query(query): Query<MachineQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    match query.machine_id {
        Some(machine_id) => {
            let machine = state.machines.find_by_id(machine_id).await?.ok_or(ApiError::NotFound)?;
            if machine.owner_operator_id != identity.operator_id {
                return Err(ApiError::Forbidden);
            }
            Ok(ws.on_upgrade(move |socket| stream_loop(socket, state, Some(machine_id))))
        }
        None if state.config.local_host_metrics => Ok(ws.on_upgrade(move |socket| stream_loop(socket, state, None))),
        None => Err(ApiError::Unprocessable("machine_id is required".into())),
    }
}

async fn stream_loop(mut socket: WebSocket, state: AppState, machine_id: Option<i64>) {
    let mut ticks = tokio::time::interval(STREAM_INTERVAL);

    loop {
        ticks.tick().await;

        let sample = match machine_id {
            Some(id) => match state.samples.latest_for_machine(id).await {
                Ok(Some(sample)) => sample,
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "metrics stream read failed");
                    break;
                }
            },
            None => local_host_sample().await,
        };

        let text = match serde_json::to_string(&sample) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "metrics stream serialization failed");
                break;
            }
        };

        if socket.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
}
