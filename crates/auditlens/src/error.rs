#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Model request failed: {0}")]
    Model(String),

    #[error("Report store error: {0}")]
    Store(String),
}
