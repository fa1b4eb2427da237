use crate::Result;
use async_trait::async_trait;

/// An opaque "complete this instruction" capability.
///
/// `model` is a hint; `None` means the implementation's default text model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str, model: Option<&str>) -> Result<String>;
}
