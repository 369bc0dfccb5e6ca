// src/services/backend.rs
// Seam between the controllers and the REST backend.
use crate::errors::ClientError;
use crate::models::*;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait TransformerApi: Send + Sync {
    async fn list_transformers(&self) -> Result<Vec<Transformer>, ClientError>;
    async fn get_transformer(&self, id: TransformerId) -> Result<Transformer, ClientError>;
    async fn create_transformer(&self, draft: &TransformerDraft) -> Result<(), ClientError>;
    async fn update_transformer(
        &self,
        id: TransformerId,
        draft: &TransformerDraft,
    ) -> Result<(), ClientError>;
    async fn delete_transformer(&self, id: TransformerId) -> Result<(), ClientError>;

    async fn list_inspections(&self, transformer_id: TransformerId) -> Result<Vec<Inspection>, ClientError>;
    async fn create_inspection(
        &self,
        transformer_id: TransformerId,
        draft: &InspectionDraft,
    ) -> Result<(), ClientError>;

    async fn list_images(&self, transformer_id: TransformerId) -> Result<Vec<Image>, ClientError>;
    async fn upload_image(
        &self,
        transformer_id: TransformerId,
        meta: &UploadMeta,
        file: &SelectedFile,
    ) -> Result<(), ClientError>;
    async fn baseline_images(&self, transformer_id: TransformerId) -> Result<Vec<Image>, ClientError>;
    async fn maintenance_images(&self, transformer_id: TransformerId) -> Result<Vec<Image>, ClientError>;
    async fn fetch_raw_image(&self, image_id: ImageId) -> Result<Bytes, ClientError>;

    /// URL a viewer can load directly for the raw bytes of `image_id`.
    fn raw_image_url(&self, image_id: ImageId) -> String;
}

pub fn raw_image_url(base_url: &str, image_id: ImageId) -> String {
    format!("{}/images/{}/raw", base_url.trim_end_matches('/'), image_id)
}
