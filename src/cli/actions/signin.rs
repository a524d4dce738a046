use crate::cli::actions::{context, read_line};
use crate::cli::globals::GlobalArgs;
use anyhow::Result;

/// Handle the signin action. An empty passcode entry requests a fresh
/// challenge (resend), superseding the outstanding one.
pub async fn handle(globals: &GlobalArgs, email: &str, remember: bool) -> Result<()> {
    let (controller, _gateway, _store) = context(globals)?;
    controller.bootstrap().await;

    let mut receipt = controller.request_signin_otp(email).await?;
    loop {
        println!("OTP sent to {}.", receipt.email);
        println!("Your one-time passcode: {}", receipt.otp);

        let code = read_line("Enter the passcode (blank to resend): ")?;
        if code.is_empty() {
            receipt = controller.request_signin_otp(email).await?;
            continue;
        }

        let user = controller.confirm_signin_otp(&code, remember).await?;
        println!("Signed in as {} <{}>.", user.name, user.email);
        return Ok(());
    }
}
