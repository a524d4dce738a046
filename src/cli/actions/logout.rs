use crate::cli::actions::context;
use crate::cli::globals::GlobalArgs;
use anyhow::Result;

/// Handle the logout action. The local session is cleared whether or not
/// the server-side invalidation succeeds.
pub async fn handle(globals: &GlobalArgs) -> Result<()> {
    let (controller, _gateway, _store) = context(globals)?;
    controller.bootstrap().await;

    match controller.logout().await {
        Ok(()) => println!("Logged out."),
        Err(err) => println!("Server logout failed ({err}); local session cleared."),
    }

    Ok(())
}
