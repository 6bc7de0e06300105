use crate::model::{LoadError, SalesRecord};

#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    async fn load(&self) -> Result<Vec<SalesRecord>, LoadError>;
}
