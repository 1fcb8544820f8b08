use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::directory::http::HttpDirectoryPool;
use crate::directory::{AuthenticationAck, DirectoryPool};
use crate::federation::http::HttpCredentialExchange;
use crate::flow::{login, register, update, Outcome};
use anyhow::{bail, Result};
use tracing::info;

/// Run the parsed action against the configured services.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    let pool = HttpDirectoryPool::new(
        globals.directory_url.as_str(),
        globals.config.user_pool_id(),
    );
    let exchange = HttpCredentialExchange::new(globals.exchange_url.as_str());

    match action {
        Action::Login { username, password } => {
            let outcome =
                login::authenticate(&pool, &exchange, &username, &password, &globals.config)
                    .await?;
            report(&outcome);
        }
        Action::Register {
            username,
            password,
            attributes,
        } => {
            let outcome = register::register(
                &pool,
                &exchange,
                &globals.config,
                &username,
                &password,
                attributes,
            )
            .await?;
            report(&outcome);
        }
        Action::UpdateAttributes {
            username,
            password,
            attributes,
        } => {
            // Attribute updates need an authenticated handle first; anything
            // short of a completed login is reported as-is.
            let outcome =
                match login::authenticate(&pool, &exchange, &username, &password, &globals.config)
                    .await?
                {
                    Outcome::LoggedIn { user, .. } => {
                        update::update_attributes(&user, attributes, Some(&globals.config)).await?
                    }
                    blocked => blocked,
                };
            report(&outcome);
        }
        Action::ChangePassword {
            username,
            current,
            replacement,
        } => {
            let user = pool.user(&username);
            let ack = user.authenticate(&current).await?;
            if ack != AuthenticationAck::Authenticated {
                bail!("directory requires further interaction before the password can change");
            }
            user.change_password(&current, &replacement).await?;

            info!("password changed for {username}");
            println!("password updated");
        }
    }

    Ok(())
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::LoggedIn { attributes, .. } => {
            println!("logged in ({} attributes)", attributes.len());
        }
        Outcome::LoginFailure { reason, .. } => println!("login failed: {reason}"),
        Outcome::MfaRequired { .. } => println!("multi-factor code required"),
        Outcome::NewPasswordRequired { .. } => println!("new password required"),
        Outcome::ConfirmationRequired { .. } => println!("account confirmation required"),
        Outcome::EmailVerificationRequired {
            delivery_medium, ..
        } => println!("verification code sent via {delivery_medium}"),
        Outcome::EmailVerificationFailed { reason, .. } => {
            println!("verification code request failed: {reason}");
        }
        Outcome::AttributesUpdated { attributes } => {
            println!("updated {} attributes", attributes.len());
        }
    }
}
