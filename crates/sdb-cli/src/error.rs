use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid engine configuration: {0}")]
    Config(String),
}
