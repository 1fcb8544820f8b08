use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

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

pub fn validator_attribute() -> ValueParser {
    ValueParser::from(
        move |attribute: &str| -> std::result::Result<(String, String), String> {
            match attribute.split_once('=') {
                Some((name, value)) if !name.is_empty() => {
                    Ok((name.to_string(), value.to_string()))
                }
                _ => Err("expected name=value".to_string()),
            }
        },
    )
}

fn username() -> Arg {
    Arg::new("username")
        .short('u')
        .long("username")
        .help("Account username")
        .required(true)
}

fn password() -> Arg {
    Arg::new("password")
        .short('p')
        .long("password")
        .help("Account password")
        .env("IDENTITA_PASSWORD")
        .required(true)
}

fn attribute() -> Arg {
    Arg::new("attribute")
        .short('a')
        .long("attribute")
        .help("Profile attribute as name=value, repeatable")
        .action(ArgAction::Append)
        .value_parser(validator_attribute())
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("identita")
        .about("Directory login and credential federation")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("directory-url")
                .long("directory-url")
                .help("Identity directory base URL, example: https://directory.eu-1.identita.dev")
                .env("IDENTITA_DIRECTORY_URL")
                .required(true),
        )
        .arg(
            Arg::new("exchange-url")
                .long("exchange-url")
                .help("Credential exchange base URL, example: https://exchange.eu-1.identita.dev")
                .env("IDENTITA_EXCHANGE_URL")
                .required(true),
        )
        .arg(
            Arg::new("region")
                .long("region")
                .help("Directory region")
                .env("IDENTITA_REGION")
                .required(true),
        )
        .arg(
            Arg::new("user-pool-id")
                .long("user-pool-id")
                .help("User pool holding the accounts")
                .env("IDENTITA_USER_POOL_ID")
                .required(true),
        )
        .arg(
            Arg::new("identity-pool-id")
                .long("identity-pool-id")
                .help("Identity pool the credentials are scoped to")
                .env("IDENTITA_IDENTITY_POOL_ID")
                .required(true),
        )
        .arg(
            Arg::new("optional-email-verification")
                .long("optional-email-verification")
                .help("Allow a login to complete without a verified email")
                .env("IDENTITA_OPTIONAL_EMAIL_VERIFICATION")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("IDENTITA_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("login")
                .about("Authenticate and federate credentials")
                .arg(username())
                .arg(password()),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account and log it in")
                .arg(username())
                .arg(password())
                .arg(attribute()),
        )
        .subcommand(
            Command::new("update-attributes")
                .about("Update profile attributes after a login")
                .arg(username())
                .arg(password())
                .arg(attribute()),
        )
        .subcommand(
            Command::new("change-password")
                .about("Change the account password")
                .arg(username())
                .arg(
                    Arg::new("current")
                        .long("current")
                        .help("Current password")
                        .env("IDENTITA_PASSWORD")
                        .required(true),
                )
                .arg(
                    Arg::new("new")
                        .long("new")
                        .help("New password")
                        .env("IDENTITA_NEW_PASSWORD")
                        .required(true),
                ),
        )
}
