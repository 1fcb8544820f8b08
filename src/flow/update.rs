//! Attribute updates.

use anyhow::Result;
use std::sync::Arc;
use tracing::instrument;

use crate::directory::attributes::{self, AttributeMap};
use crate::directory::DirectoryUser;
use crate::federation::{email_verification_is_mandatory, FederationConfig};
use crate::flow::{verification, Outcome};

/// Apply an attribute change and re-check the verification gate when the
/// policy demands it.
///
/// # Errors
/// Returns an error when the directory rejects the update, carrying its
/// message; the gate's attribute fetch can also reject.
#[instrument(skip(user, attributes))]
pub async fn update_attributes(
    user: &Arc<dyn DirectoryUser>,
    attributes: AttributeMap,
    config: Option<&FederationConfig>,
) -> Result<Outcome> {
    let encoded = attributes::encode(&attributes);
    user.update_attributes(encoded).await?;

    if email_verification_is_mandatory(config) {
        // The update may have replaced the email address, invalidating any
        // earlier verification.
        return verification::decide(user, config).await;
    }

    Ok(Outcome::AttributesUpdated { attributes })
}
