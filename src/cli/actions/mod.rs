pub mod google;
pub mod logout;
pub mod signin;
pub mod signup;
pub mod status;

use std::sync::Arc;

use anyhow::Result;

use crate::auth::AuthController;
use crate::cli::globals::GlobalArgs;
use crate::gateway::ApiGateway;
use crate::session::SessionStore;

#[derive(Debug)]
pub enum Action {
    SignUp {
        email: String,
        name: String,
        dob: String,
    },
    SignIn {
        email: String,
        remember: bool,
    },
    Google {
        credential: String,
    },
    Logout,
    Status,
}

/// Build the engine once per invocation: store, gateway, controller.
pub(crate) fn context(
    globals: &GlobalArgs,
) -> Result<(Arc<AuthController>, ApiGateway, SessionStore)> {
    let store = SessionStore::new(globals.state_dir.clone());
    let gateway = ApiGateway::new(&globals.api_url, store.clone())?;
    let controller = Arc::new(AuthController::new(gateway.clone(), store.clone()));
    Ok((controller, gateway, store))
}

pub(crate) fn read_line(prompt: &str) -> Result<String> {
    use std::io::Write;

    print!("{prompt}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
