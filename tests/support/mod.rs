// tests/support/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};

use transformer_client::errors::ClientError;
use transformer_client::models::*;
use transformer_client::services::TransformerApi;
use transformer_client::services::backend::raw_image_url;

/// In-memory backend. Counts every call, can be told to fail a given
/// endpoint, and can hold a transformer's image fetches until released.
pub struct FakeBackend {
    pub transformers: Mutex<Vec<Transformer>>,
    pub inspections: Mutex<HashMap<TransformerId, Vec<Inspection>>>,
    pub images: Mutex<Vec<Image>>,
    pub uploads: Mutex<Vec<(TransformerId, UploadMeta, SelectedFile)>>,
    pub calls: AtomicU64,
    failing: std::sync::Mutex<HashSet<&'static str>>,
    gates: std::sync::Mutex<HashMap<TransformerId, watch::Receiver<bool>>>,
    next_id: AtomicU64,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            transformers: Mutex::new(Vec::new()),
            inspections: Mutex::new(HashMap::new()),
            images: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            calls: AtomicU64::new(0),
            failing: std::sync::Mutex::new(HashSet::new()),
            gates: std::sync::Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(100),
        }
    }
}

impl FakeBackend {
    pub fn with_transformers(transformers: Vec<Transformer>) -> Self {
        Self {
            transformers: Mutex::new(transformers),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Every later call to `endpoint` answers with a 500.
    pub fn fail_on(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().remove(endpoint);
    }

    /// Holds baseline/maintenance fetches for `transformer_id` until the
    /// returned sender publishes `true`.
    pub fn hold(&self, transformer_id: TransformerId) -> watch::Sender<bool> {
        let (tx, rx) = watch::channel(false);
        self.gates.lock().unwrap().insert(transformer_id, rx);
        tx
    }

    fn enter(&self, endpoint: &'static str) -> Result<(), ClientError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.failing.lock().unwrap().contains(endpoint) {
            return Err(ClientError::Backend {
                status: 500,
                message: None,
            });
        }
        Ok(())
    }

    async fn wait_gate(&self, transformer_id: TransformerId) {
        let gate = self.gates.lock().unwrap().get(&transformer_id).cloned();
        if let Some(mut rx) = gate {
            let _ = rx.wait_for(|open| *open).await;
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) as i64
    }

    async fn images_of(&self, transformer_id: TransformerId, kind: ImageType) -> Vec<Image> {
        self.images
            .lock()
            .await
            .iter()
            .filter(|i| i.transformer_id == Some(transformer_id) && i.image_type == kind)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TransformerApi for FakeBackend {
    async fn list_transformers(&self) -> Result<Vec<Transformer>, ClientError> {
        self.enter("list_transformers")?;
        Ok(self.transformers.lock().await.clone())
    }

    async fn get_transformer(&self, id: TransformerId) -> Result<Transformer, ClientError> {
        self.enter("get_transformer")?;
        self.transformers
            .lock()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(ClientError::Backend {
                status: 404,
                message: Some("Transformer not found".to_string()),
            })
    }

    async fn create_transformer(&self, draft: &TransformerDraft) -> Result<(), ClientError> {
        self.enter("create_transformer")?;
        let mut transformers = self.transformers.lock().await;
        if transformers.iter().any(|t| t.transformer_no == draft.transformer_no) {
            return Err(ClientError::Backend {
                status: 409,
                message: Some("Transformer number already exists".to_string()),
            });
        }
        transformers.push(Transformer {
            id: self.next_id(),
            transformer_no: draft.transformer_no.clone(),
            pole_no: Some(draft.pole_no.clone()),
            region: Some(draft.region.clone()),
            transformer_type: Some(draft.transformer_type),
        });
        Ok(())
    }

    async fn update_transformer(&self, id: TransformerId, draft: &TransformerDraft) -> Result<(), ClientError> {
        self.enter("update_transformer")?;
        let mut transformers = self.transformers.lock().await;
        let t = transformers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(ClientError::Backend {
                status: 404,
                message: None,
            })?;
        t.transformer_no = draft.transformer_no.clone();
        t.pole_no = Some(draft.pole_no.clone());
        t.region = Some(draft.region.clone());
        t.transformer_type = Some(draft.transformer_type);
        Ok(())
    }

    async fn delete_transformer(&self, id: TransformerId) -> Result<(), ClientError> {
        self.enter("delete_transformer")?;
        self.transformers.lock().await.retain(|t| t.id != id);
        Ok(())
    }

    async fn list_inspections(&self, transformer_id: TransformerId) -> Result<Vec<Inspection>, ClientError> {
        self.enter("list_inspections")?;
        Ok(self
            .inspections
            .lock()
            .await
            .get(&transformer_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_inspection(&self, transformer_id: TransformerId, draft: &InspectionDraft) -> Result<(), ClientError> {
        self.enter("create_inspection")?;
        let inspection = Inspection {
            id: self.next_id(),
            transformer_id: Some(transformer_id),
            title: draft.title.clone(),
            inspector: Some(draft.inspector.clone()),
            notes: draft.notes.clone(),
            status: draft.status,
            created_at: Some("2024-05-01T09:00:00Z".to_string()),
        };
        self.inspections
            .lock()
            .await
            .entry(transformer_id)
            .or_default()
            .push(inspection);
        Ok(())
    }

    async fn list_images(&self, transformer_id: TransformerId) -> Result<Vec<Image>, ClientError> {
        self.enter("list_images")?;
        Ok(self
            .images
            .lock()
            .await
            .iter()
            .filter(|i| i.transformer_id == Some(transformer_id))
            .cloned()
            .collect())
    }

    async fn upload_image(
        &self,
        transformer_id: TransformerId,
        meta: &UploadMeta,
        file: &SelectedFile,
    ) -> Result<(), ClientError> {
        self.enter("upload_image")?;
        self.uploads
            .lock()
            .await
            .push((transformer_id, meta.clone(), file.clone()));
        self.images.lock().await.push(Image {
            id: self.next_id(),
            transformer_id: Some(transformer_id),
            inspection_id: meta.inspection_id,
            image_type: meta.image_type,
            env_condition: meta.env_condition.clone(),
            uploader: Some(meta.uploader.clone()),
            filename: Some(file.name.clone()),
            content_type: Some(file.media_type.clone()),
            size_bytes: Some(file.bytes.len() as u64),
            created_at: None,
            base64_data: None,
        });
        Ok(())
    }

    async fn baseline_images(&self, transformer_id: TransformerId) -> Result<Vec<Image>, ClientError> {
        self.wait_gate(transformer_id).await;
        self.enter("baseline_images")?;
        Ok(self.images_of(transformer_id, ImageType::Baseline).await)
    }

    async fn maintenance_images(&self, transformer_id: TransformerId) -> Result<Vec<Image>, ClientError> {
        self.wait_gate(transformer_id).await;
        self.enter("maintenance_images")?;
        Ok(self.images_of(transformer_id, ImageType::Maintenance).await)
    }

    async fn fetch_raw_image(&self, image_id: ImageId) -> Result<Bytes, ClientError> {
        self.enter("fetch_raw_image")?;
        Ok(Bytes::from(image_id.to_be_bytes().to_vec()))
    }

    fn raw_image_url(&self, image_id: ImageId) -> String {
        raw_image_url("http://fake", image_id)
    }
}

pub fn transformer(id: TransformerId, no: &str, region: &str, kind: TransformerType) -> Transformer {
    Transformer {
        id,
        transformer_no: no.to_string(),
        pole_no: Some(format!("P-{}", id)),
        region: Some(region.to_string()),
        transformer_type: Some(kind),
    }
}

pub fn inspection(id: InspectionId, transformer_id: TransformerId, title: &str) -> Inspection {
    Inspection {
        id,
        transformer_id: Some(transformer_id),
        title: title.to_string(),
        inspector: Some("Nimal".to_string()),
        notes: None,
        status: InspectionStatus::Open,
        created_at: None,
    }
}

pub fn image(
    id: ImageId,
    transformer_id: TransformerId,
    kind: ImageType,
    inspection_id: Option<InspectionId>,
    created_at: Option<&str>,
) -> Image {
    Image {
        id,
        transformer_id: Some(transformer_id),
        inspection_id,
        image_type: kind,
        env_condition: None,
        uploader: Some("Saman".to_string()),
        filename: Some(format!("thermal-{}.jpg", id)),
        content_type: Some("image/jpeg".to_string()),
        size_bytes: Some(2048),
        created_at: created_at.map(str::to_string),
        base64_data: None,
    }
}

pub fn png(name: &str) -> SelectedFile {
    SelectedFile::new(name, "image/png", vec![0x89u8, b'P', b'N', b'G'])
}
