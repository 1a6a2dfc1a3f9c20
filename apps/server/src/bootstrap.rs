//! Admin creation at startup, driven entirely by configuration. Replaces
//! any shard- or manifest-style integrity pass the prior bootstrap ran —
//! this control plane has no binary artifacts to verify before serving.

use tracing::{info, warn};

use lunasentri_core_identity::hash_password;

use crate::state::AppState;

/// Creates the configured admin operator if it doesn't exist yet, or
/// refreshes its password if it does. No-op when the bootstrap
/// email/password pair isn't configured.
///
/// Relies on running before any self-serve registration: the store's
/// "first operator is admin" rule only promotes this account if it is,
/// in fact, first.
pub async fn bootstrap_admin(state: &AppState) {
    let (Some(email), Some(password)) = (
        state.config.admin_bootstrap_email.clone(),
        state.config.admin_bootstrap_password.clone(),
    ) else {
        return;
    };

    let verifier = match hash_password(&password) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "admin bootstrap: password hashing failed");
            return;
        }
    };

    match state.operators.find_by_email(&email).await {
        Ok(Some(operator)) => {
            if let Err(e) = state
                .operators
                .update_password_verifier(operator.id, &verifier)
                .await
            {
                warn!(error = %e, "admin bootstrap: could not refresh admin password");
            } else {
                info!(email = %email, "admin bootstrap: existing admin password refreshed");
            }
        }
        Ok(None) => match state.operators.register(&email, &verifier).await {
            Ok(operator) => {
                if !operator.is_admin {
                    warn!(
                        email = %email,
                        "admin bootstrap: account created but was not first, so it is not an admin"
                    );
                } else {
                    info!(email = %email, "admin bootstrap: admin operator created");
                }
            }
            Err(e) => warn!(error = %e, "admin bootstrap: could not create admin"),
        },
        Err(e) => warn!(error = %e, "admin bootstrap: lookup failed"),
    }
}
