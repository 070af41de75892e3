use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Malformed JSON body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn status(&self) -> u16 {
        match self {
            CatalogError::MalformedBody(_) => 500,
        }
    }
}
