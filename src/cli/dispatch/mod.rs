use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::directory::attributes::AttributeMap;
use crate::federation::FederationConfig;
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;

fn required_string(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .map(ToString::to_string)
        .ok_or_else(|| anyhow!("missing required argument: --{name}"))
}

fn required_secret(matches: &clap::ArgMatches, name: &str) -> Result<SecretString> {
    required_string(matches, name).map(SecretString::from)
}

fn attribute_map(matches: &clap::ArgMatches) -> AttributeMap {
    matches
        .get_many::<(String, String)>("attribute")
        .into_iter()
        .flatten()
        .cloned()
        .collect()
}

pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let mut config = FederationConfig::new(
        required_string(matches, "region")?,
        required_string(matches, "user-pool-id")?,
        required_string(matches, "identity-pool-id")?,
    );

    if matches.get_flag("optional-email-verification") {
        config = config.with_mandatory_email_verification(false);
    }

    let globals = GlobalArgs::new(
        required_string(matches, "directory-url")?,
        required_string(matches, "exchange-url")?,
        config,
    );

    let (name, sub_matches) = matches.subcommand().context("missing subcommand")?;

    let action = match name {
        "login" => Action::Login {
            username: required_string(sub_matches, "username")?,
            password: required_secret(sub_matches, "password")?,
        },
        "register" => Action::Register {
            username: required_string(sub_matches, "username")?,
            password: required_secret(sub_matches, "password")?,
            attributes: attribute_map(sub_matches),
        },
        "update-attributes" => Action::UpdateAttributes {
            username: required_string(sub_matches, "username")?,
            password: required_secret(sub_matches, "password")?,
            attributes: attribute_map(sub_matches),
        },
        "change-password" => Action::ChangePassword {
            username: required_string(sub_matches, "username")?,
            current: required_secret(sub_matches, "current")?,
            replacement: required_secret(sub_matches, "new")?,
        },
        other => return Err(anyhow!("unknown subcommand: {other}")),
    };

    Ok((action, globals))
}
