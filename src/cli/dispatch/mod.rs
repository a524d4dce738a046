use crate::cli::actions::Action;
use crate::cli::globals::GlobalArgs;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let api_url = matches
        .get_one::<String>("api-url")
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("missing required argument: --api-url"))?;

    let state_dir = match matches.get_one::<PathBuf>("state-dir") {
        Some(dir) => dir.clone(),
        None => default_state_dir(),
    };

    let globals = GlobalArgs::new(api_url, state_dir);

    let action = match matches.subcommand() {
        Some(("signup", sub)) => Action::SignUp {
            email: required(sub, "email")?,
            name: required(sub, "name")?,
            dob: required(sub, "dob")?,
        },
        Some(("signin", sub)) => Action::SignIn {
            email: required(sub, "email")?,
            remember: sub.get_flag("remember"),
        },
        Some(("google", sub)) => Action::Google {
            credential: required(sub, "credential")?,
        },
        Some(("logout", _)) => Action::Logout,
        Some(("status", _)) => Action::Status,
        _ => return Err(anyhow!("missing subcommand")),
    };

    Ok((action, globals))
}

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .map(|s| s.to_string())
        .with_context(|| format!("missing required argument: --{name}"))
}

fn default_state_dir() -> PathBuf {
    directories::ProjectDirs::from("dev", "jotter", "jotter")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".jotter"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn test_handler_signup() {
        let matches = commands::new().get_matches_from(vec![
            "jotter-auth",
            "--state-dir",
            "/tmp/jotter-test",
            "signup",
            "--email",
            "new@x.com",
            "--name",
            "A B",
            "--dob",
            "2000-01-01",
        ]);

        let (action, globals) = handler(&matches).unwrap();
        assert_eq!(globals.api_url, "http://localhost:3000");
        assert_eq!(globals.state_dir, PathBuf::from("/tmp/jotter-test"));
        match action {
            Action::SignUp { email, name, dob } => {
                assert_eq!(email, "new@x.com");
                assert_eq!(name, "A B");
                assert_eq!(dob, "2000-01-01");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_handler_signin_remember_defaults_off() {
        let matches = commands::new().get_matches_from(vec![
            "jotter-auth",
            "signin",
            "--email",
            "a@x.com",
        ]);

        let (action, _globals) = handler(&matches).unwrap();
        match action {
            Action::SignIn { email, remember } => {
                assert_eq!(email, "a@x.com");
                assert!(!remember);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }
}
