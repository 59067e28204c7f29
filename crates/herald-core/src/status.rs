//! Deployment-status updates on the extracted tickets.

use crate::environment::EnvironmentTable;
use crate::error::Result;
use crate::systems::TicketSystem;
use crate::ticket::TicketInfo;

/// Sets the deployment-status field of every ticket to `environment`, in
/// extraction order.
///
/// The status value is re-validated against the environment table before the
/// first remote call; an invalid value means the config and CLI disagree
/// and is fatal for the whole run. Per-ticket update failures are isolated:
/// a warning is logged and the batch continues. No retry.
pub fn update_all(
    tickets: &dyn TicketSystem,
    infos: &[TicketInfo],
    environment: &str,
    environments: &EnvironmentTable,
) -> Result<()> {
    let status = environments.resolve_or_err(environment)?;

    for info in infos {
        match tickets.set_deployment_status(&info.id, Some(&status)) {
            Ok(()) => println!("Deployment status for {} was set to {status}", info.id),
            Err(error) => tracing::warn!(
                ticket = %info.id,
                %error,
                "could not update the deployment status, skipping ticket"
            ),
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
