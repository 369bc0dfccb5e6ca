// src/services/api_client.rs
use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::models::*;
use crate::services::backend::{self, TransformerApi};
use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// HTTP Client Adapter: every request goes to `base_url` and every failure is
/// logged the same way before it is handed back to the caller.
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<Response, ClientError> {
        debug!("{} {}", method, path);

        let response = builder.send().await.map_err(|e| {
            error!("API error: {} {} failed: {}", method, path, e);
            ClientError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = backend_message(&body);
            error!(
                "API error: {} {} -> {} {}",
                method,
                path,
                status.as_u16(),
                message.as_deref().unwrap_or(&body)
            );
            return Err(ClientError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .send(Method::GET, path, self.request(Method::GET, path))
            .await?;
        response.json::<T>().await.map_err(|e| {
            error!("API error: GET {} returned an unreadable body: {}", path, e);
            ClientError::Serialization(e.to_string())
        })
    }
}

/// Pulls `error` (or `message`) out of a JSON error body; plain-text bodies
/// are used as-is.
fn backend_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => ["error", "message"]
            .iter()
            .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
            .map(str::to_string),
        Err(_) => Some(body.to_string()),
    }
}

#[async_trait]
impl TransformerApi for ApiClient {
    async fn list_transformers(&self) -> Result<Vec<Transformer>, ClientError> {
        self.get_json("/transformers").await
    }

    async fn get_transformer(&self, id: TransformerId) -> Result<Transformer, ClientError> {
        self.get_json(&format!("/transformers/{}", id)).await
    }

    async fn create_transformer(&self, draft: &TransformerDraft) -> Result<(), ClientError> {
        let path = "/transformers";
        self.send(Method::POST, path, self.request(Method::POST, path).json(draft))
            .await?;
        Ok(())
    }

    async fn update_transformer(&self, id: TransformerId, draft: &TransformerDraft) -> Result<(), ClientError> {
        let path = format!("/transformers/{}", id);
        self.send(Method::PUT, &path, self.request(Method::PUT, &path).json(draft))
            .await?;
        Ok(())
    }

    async fn delete_transformer(&self, id: TransformerId) -> Result<(), ClientError> {
        let path = format!("/transformers/{}", id);
        self.send(Method::DELETE, &path, self.request(Method::DELETE, &path))
            .await?;
        Ok(())
    }

    async fn list_inspections(&self, transformer_id: TransformerId) -> Result<Vec<Inspection>, ClientError> {
        self.get_json(&format!("/transformers/{}/inspections", transformer_id))
            .await
    }

    async fn create_inspection(
        &self,
        transformer_id: TransformerId,
        draft: &InspectionDraft,
    ) -> Result<(), ClientError> {
        let path = format!("/transformers/{}/inspections", transformer_id);
        self.send(Method::POST, &path, self.request(Method::POST, &path).json(draft))
            .await?;
        Ok(())
    }

    async fn list_images(&self, transformer_id: TransformerId) -> Result<Vec<Image>, ClientError> {
        self.get_json(&format!("/transformers/{}/images", transformer_id))
            .await
    }

    async fn upload_image(
        &self,
        transformer_id: TransformerId,
        meta: &UploadMeta,
        file: &SelectedFile,
    ) -> Result<(), ClientError> {
        let path = format!("/transformers/{}/images", transformer_id);

        let meta_part = Part::bytes(serde_json::to_vec(meta)?)
            .mime_str("application/json")
            .map_err(ClientError::from)?;
        let file_part = Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)
            .map_err(ClientError::from)?;
        let form = Form::new().part("meta", meta_part).part("file", file_part);

        self.send(Method::POST, &path, self.request(Method::POST, &path).multipart(form))
            .await?;
        Ok(())
    }

    async fn baseline_images(&self, transformer_id: TransformerId) -> Result<Vec<Image>, ClientError> {
        self.get_json(&format!("/transformers/{}/baseline/base64", transformer_id))
            .await
    }

    async fn maintenance_images(&self, transformer_id: TransformerId) -> Result<Vec<Image>, ClientError> {
        self.get_json(&format!("/transformers/{}/maintenance/base64", transformer_id))
            .await
    }

    async fn fetch_raw_image(&self, image_id: ImageId) -> Result<Bytes, ClientError> {
        let path = format!("/images/{}/raw", image_id);
        let response = self
            .send(Method::GET, &path, self.request(Method::GET, &path))
            .await?;
        Ok(response.bytes().await?)
    }

    fn raw_image_url(&self, image_id: ImageId) -> String {
        backend::raw_image_url(&self.base_url, image_id)
    }
}
