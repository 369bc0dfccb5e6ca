// src/models.rs
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ClientError;
use crate::services::backend::raw_image_url;

pub type TransformerId = i64;
pub type InspectionId = i64;
pub type ImageId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformerType {
    Bulk,
    Distribution,
}

impl TransformerType {
    pub fn all() -> &'static [TransformerType] {
        &[TransformerType::Bulk, TransformerType::Distribution]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformerType::Bulk => "BULK",
            TransformerType::Distribution => "DISTRIBUTION",
        }
    }
}

impl fmt::Display for TransformerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformer {
    pub id: TransformerId,
    pub transformer_no: String,
    #[serde(default)]
    pub pole_no: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub transformer_type: Option<TransformerType>,
}

/// Body for `POST /transformers` and `PUT /transformers/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformerDraft {
    pub transformer_no: String,
    pub pole_no: String,
    pub region: String,
    pub transformer_type: TransformerType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionStatus {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl InspectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            InspectionStatus::Open => "Open",
            InspectionStatus::InProgress => "In Progress",
            InspectionStatus::Closed => "Closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub id: InspectionId,
    #[serde(default)]
    pub transformer_id: Option<TransformerId>,
    pub title: String,
    #[serde(default)]
    pub inspector: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: InspectionStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Inspection {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }
}

/// Body for `POST /transformers/{id}/inspections`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionDraft {
    pub title: String,
    pub inspector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: InspectionStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImageType {
    #[default]
    Baseline,
    Maintenance,
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageType::Baseline => f.write_str("BASELINE"),
            ImageType::Maintenance => f.write_str("MAINTENANCE"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Weather {
    #[default]
    Sunny,
    Cloudy,
    Rainy,
}

impl Weather {
    pub fn label(&self) -> &'static str {
        match self {
            Weather::Sunny => "Sunny",
            Weather::Cloudy => "Cloudy",
            Weather::Rainy => "Rainy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvCondition {
    pub weather: Weather,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_note: Option<String>,
}

/// An image record as returned by the listing and base64 endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: ImageId,
    #[serde(default)]
    pub transformer_id: Option<TransformerId>,
    #[serde(default)]
    pub inspection_id: Option<InspectionId>,
    pub image_type: ImageType,
    #[serde(default)]
    pub env_condition: Option<EnvCondition>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Only populated by the `/baseline/base64` and `/maintenance/base64` endpoints.
    #[serde(default, alias = "base64", alias = "data")]
    pub base64_data: Option<String>,
}

impl Image {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    /// "1.50 MB" style label, "-" when the size is unknown.
    pub fn size_label(&self) -> String {
        match self.size_bytes {
            Some(bytes) => format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0),
            None => "-".to_string(),
        }
    }

    /// Chips shown under the preview: type, weather, temperature, humidity, uploader.
    pub fn chips(&self) -> Vec<String> {
        let mut chips = vec![self.image_type.to_string()];
        if let Some(env) = &self.env_condition {
            chips.push(env.weather.label().to_string());
            if let Some(t) = env.temperature_c {
                chips.push(format!("{} °C", t));
            }
            if let Some(h) = env.humidity {
                chips.push(format!("{} %", h));
            }
        }
        if let Some(uploader) = &self.uploader {
            chips.push(format!("by: {}", uploader));
        }
        if let Some(ct) = &self.content_type {
            chips.push(ct.clone());
        }
        if self.size_bytes.is_some() {
            chips.push(self.size_label());
        }
        chips
    }

    pub fn decode_payload(&self) -> Result<Option<Vec<u8>>, ClientError> {
        self.base64_data
            .as_deref()
            .map(|encoded| {
                general_purpose::STANDARD
                    .decode(strip_data_url_prefix(encoded))
                    .map_err(|e| ClientError::Serialization(format!("Invalid image payload: {}", e)))
            })
            .transpose()
    }

    /// `data:` URL for an inlined payload, if this record carries one.
    pub fn data_url(&self) -> Option<String> {
        let encoded = self.base64_data.as_deref()?;
        if encoded.starts_with("data:") {
            return Some(encoded.to_string());
        }
        let content_type = self.content_type.as_deref().unwrap_or("image/jpeg");
        Some(format!("data:{};base64,{}", content_type, encoded))
    }

    /// Where a viewer should load this image from: the inlined payload when the
    /// record carries one, the raw endpoint otherwise.
    pub fn source(&self, base_url: &str) -> ImageSource {
        match self.data_url() {
            Some(url) => ImageSource::Inline(url),
            None => ImageSource::Remote(raw_image_url(base_url, self.id)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// `data:` URL built from a base64 payload.
    Inline(String),
    Remote(String),
}

/// Structured half of the multipart upload (`meta` part).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMeta {
    pub image_type: ImageType,
    pub uploader: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_id: Option<InspectionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_condition: Option<EnvCondition>,
}

/// A file chosen for upload, already read into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: bytes::Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<bytes::Bytes>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    pub fn size_label(&self) -> String {
        format!("{:.2} MB", self.bytes.len() as f64 / 1024.0 / 1024.0)
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

fn strip_data_url_prefix(encoded: &str) -> &str {
    match encoded.find(";base64,") {
        Some(pos) if encoded.starts_with("data:") => &encoded[pos + ";base64,".len()..],
        _ => encoded,
    }
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Accepts RFC 3339 (seconds optional), offset-less `LocalDateTime` with or
/// without seconds and plain dates. Offset-less values are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    let naive = raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')).unwrap_or(raw);
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}
