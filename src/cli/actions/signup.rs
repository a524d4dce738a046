use crate::cli::actions::{context, read_line};
use crate::cli::globals::GlobalArgs;
use anyhow::Result;

/// Handle the signup action: request a challenge, show the echoed
/// passcode, confirm it.
pub async fn handle(globals: &GlobalArgs, email: &str, name: &str, dob: &str) -> Result<()> {
    let (controller, _gateway, _store) = context(globals)?;
    controller.bootstrap().await;

    let receipt = controller.request_signup_otp(email, name, dob).await?;
    println!("OTP sent to {}.", receipt.email);
    println!("Your one-time passcode: {}", receipt.otp);
    println!("It expires at {}.", receipt.expires_at);

    let code = read_line("Enter the passcode to create your account: ")?;
    let user = controller.confirm_signup_otp(&code).await?;
    println!("Account created for {} <{}>.", user.name, user.email);

    Ok(())
}
