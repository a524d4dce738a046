use crate::cli::actions::context;
use crate::cli::globals::GlobalArgs;
use crate::google::decode_credential;
use anyhow::Result;
use tracing::warn;

/// Handle the google action: exchange a pre-obtained provider credential
/// for a session. Decoding is informational; a malformed payload never
/// blocks the exchange.
pub async fn handle(globals: &GlobalArgs, credential: &str) -> Result<()> {
    let (controller, _gateway, _store) = context(globals)?;
    controller.bootstrap().await;

    match decode_credential(credential) {
        Ok(claims) => {
            if let Some(email) = claims.email.as_deref() {
                println!("Google credential for {email}.");
            }
        }
        Err(err) => warn!("credential payload not decodable: {err}"),
    }

    let user = controller.federated_sign_in(credential).await?;
    println!("Signed in with Google as {} <{}>.", user.name, user.email);

    Ok(())
}
