use crate::auth::AuthState;
use crate::cli::actions::context;
use crate::cli::globals::GlobalArgs;
use crate::session::RetentionTier;
use anyhow::Result;

/// Handle the status action: restore the session the way application
/// start does, then probe the gateway.
pub async fn handle(globals: &GlobalArgs) -> Result<()> {
    let (controller, gateway, store) = context(globals)?;

    match controller.bootstrap().await {
        AuthState::Authenticated(user) => {
            println!("Signed in as {} <{}>.", user.name, user.email);
            if let Some(record) = store.load() {
                let tier = match record.retention_tier {
                    RetentionTier::Persistent => "persistent",
                    RetentionTier::Ephemeral => "ephemeral",
                };
                println!("Session tier: {tier}");
            }
        }
        _ => println!("Not signed in."),
    }

    match gateway.health().await {
        Ok(health) => println!("Gateway: {} ({})", health.status, health.message),
        Err(err) => println!("Gateway unreachable: {err}"),
    }

    Ok(())
}
