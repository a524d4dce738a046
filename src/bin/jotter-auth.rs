use anyhow::Result;
use jotter_auth::cli::{actions, actions::Action, start};

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    // Start the program
    let (action, globals) = start()?;

    // Handle the action
    match action {
        Action::SignUp { email, name, dob } => {
            actions::signup::handle(&globals, &email, &name, &dob).await?;
        }
        Action::SignIn { email, remember } => {
            actions::signin::handle(&globals, &email, remember).await?;
        }
        Action::Google { credential } => {
            actions::google::handle(&globals, &credential).await?;
        }
        Action::Logout => actions::logout::handle(&globals).await?,
        Action::Status => actions::status::handle(&globals).await?,
    }

    Ok(())
}
