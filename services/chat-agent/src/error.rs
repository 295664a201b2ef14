//! Command-line input errors

use thiserror::Error;

/// Problems with a line typed at the prompt. Printed and the prompt returns.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("unknown command '{0}', type 'help' for the list")]
    UnknownCommand(String),

    #[error("'{command}' needs a {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
}

/// Result alias using the command Error
pub type Result<T> = std::result::Result<T, Error>;
