use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid module path: {0}")]
    InvalidModulePath(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),
}
