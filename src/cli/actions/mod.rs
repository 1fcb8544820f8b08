pub mod run;

use crate::directory::attributes::AttributeMap;
use secrecy::SecretString;

/// Action to run after parsing the command line.
#[derive(Debug)]
pub enum Action {
    Login {
        username: String,
        password: SecretString,
    },
    Register {
        username: String,
        password: SecretString,
        attributes: AttributeMap,
    },
    UpdateAttributes {
        username: String,
        password: SecretString,
        attributes: AttributeMap,
    },
    ChangePassword {
        username: String,
        current: SecretString,
        replacement: SecretString,
    },
}
