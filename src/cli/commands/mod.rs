use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};
use std::path::PathBuf;

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("jotter-auth")
        .about("Client authentication and session engine for the Jotter notes app")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Base URL of the notes API gateway")
                .default_value("http://localhost:3000")
                .env("JOTTER_API_URL")
                .global(true),
        )
        .arg(
            Arg::new("state-dir")
                .long("state-dir")
                .help("Directory holding the session tier documents")
                .env("JOTTER_STATE_DIR")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("JOTTER_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("signup")
                .about("Create an account with an emailed one-time passcode")
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Email address to create the account for")
                        .required(true),
                )
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Display name")
                        .required(true),
                )
                .arg(
                    Arg::new("dob")
                        .long("dob")
                        .help("Date of birth, YYYY-MM-DD")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("signin")
                .about("Sign in with an emailed one-time passcode")
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Email address of the account")
                        .required(true),
                )
                .arg(
                    Arg::new("remember")
                        .long("remember")
                        .help("Keep me signed in (persistent session)")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("google")
                .about("Sign in with a Google-issued credential")
                .arg(
                    Arg::new("credential")
                        .long("credential")
                        .help("Raw credential obtained from Google Identity Services")
                        .env("JOTTER_GOOGLE_CREDENTIAL")
                        .required(true),
                ),
        )
        .subcommand(Command::new("logout").about("Sign out and clear the stored session"))
        .subcommand(Command::new("status").about("Show session state and gateway health"))
}
