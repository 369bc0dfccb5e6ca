// src/controllers/upload.rs
use log::{debug, info};
use std::path::Path;

use crate::errors::{ClientError, FieldErrors};
use crate::models::*;
use crate::notify::Notifier;
use crate::services::TransformerApi;

/// Reads a file from disk for upload. The media type comes from the extension;
/// anything unrecognised is `application/octet-stream` and will be rejected
/// by `UploadForm::select_file`.
pub async fn read_file(path: &Path) -> Result<SelectedFile, ClientError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ClientError::InvalidFile(format!("{}: {}", path.display(), e)))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(SelectedFile::new(name, media_type_for(path), bytes))
}

pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Everything needed to send one upload, detached from the form so the form
/// can stay borrowable while the request is in flight.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub transformer_id: TransformerId,
    pub meta: UploadMeta,
    pub file: SelectedFile,
}

impl PendingUpload {
    pub async fn send(&self, api: &dyn TransformerApi) -> Result<(), ClientError> {
        api.upload_image(self.transformer_id, &self.meta, &self.file)
            .await
    }
}

/// Upload Form Controller for baseline and maintenance images.
#[derive(Debug)]
pub struct UploadForm {
    pub transformer_id: Option<TransformerId>,
    pub inspection_id: Option<InspectionId>,
    pub image_type: ImageType,
    pub weather: Option<Weather>,
    pub temperature_c: String,
    pub humidity: String,
    pub location_note: String,
    pub uploader: String,
    file: Option<SelectedFile>,
    preview: Option<String>,
    uploading: bool,
    errors: FieldErrors,
    pub notifier: Notifier,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self {
            transformer_id: None,
            inspection_id: None,
            image_type: ImageType::Baseline,
            weather: Some(Weather::default()),
            temperature_c: String::new(),
            humidity: String::new(),
            location_note: String::new(),
            uploader: String::new(),
            file: None,
            preview: None,
            uploading: false,
            errors: FieldErrors::new(),
            notifier: Notifier::default(),
        }
    }
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form bound to one transformer (and optionally one inspection).
    pub fn for_target(transformer_id: TransformerId, inspection_id: Option<InspectionId>) -> Self {
        Self {
            transformer_id: Some(transformer_id),
            inspection_id,
            image_type: if inspection_id.is_some() {
                ImageType::Maintenance
            } else {
                ImageType::Baseline
            },
            ..Self::default()
        }
    }

    /// Accepts `image/*` files only; a rejected file leaves the current
    /// selection untouched and raises a toast.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), ClientError> {
        if !file.is_image() {
            self.notifier.error("Please select a valid image file");
            return Err(ClientError::InvalidFile(format!(
                "{} is {}, not an image",
                file.name, file.media_type
            )));
        }
        debug!("selected {} ({})", file.name, file.size_label());
        self.preview = Some(file.to_data_url());
        self.file = Some(file);
        Ok(())
    }

    pub fn remove_file(&mut self) {
        self.file = None;
        self.preview = None;
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Whether the submit button is enabled.
    pub fn can_submit(&self) -> bool {
        !self.uploading
            && self.transformer_id.is_some()
            && self.file.is_some()
            && !self.uploader.trim().is_empty()
    }

    /// Checks the form and builds the request, without side effects.
    pub fn validate(&self) -> Result<PendingUpload, ClientError> {
        let mut errors = FieldErrors::new();

        if self.transformer_id.is_none() {
            errors.add("transformer", "Select a transformer");
        }
        if self.file.is_none() {
            errors.add("file", "An image file is required");
        }
        if self.uploader.trim().is_empty() {
            errors.add("uploader", "Uploader name is required");
        }

        let env_condition = match self.image_type {
            ImageType::Baseline => {
                if self.weather.is_none() {
                    errors.add("weather", "Baseline requires an environment weather");
                }
                let temperature_c = optional_number(&self.temperature_c, "temperatureC", "Temperature", &mut errors);
                let humidity = optional_number(&self.humidity, "humidity", "Humidity", &mut errors);
                let location_note = Some(self.location_note.trim())
                    .filter(|note| !note.is_empty())
                    .map(str::to_string);
                self.weather.map(|weather| EnvCondition {
                    weather,
                    temperature_c,
                    humidity,
                    location_note,
                })
            }
            ImageType::Maintenance => None,
        };

        errors.into_result()?;

        match (self.transformer_id, &self.file) {
            (Some(transformer_id), Some(file)) => Ok(PendingUpload {
                transformer_id,
                meta: UploadMeta {
                    image_type: self.image_type,
                    uploader: self.uploader.trim().to_string(),
                    inspection_id: self.inspection_id,
                    env_condition,
                },
                file: file.clone(),
            }),
            _ => Err(ClientError::field("file", "An image file is required")),
        }
    }

    /// First half of a submit: validates and marks the form busy.
    pub fn begin_submit(&mut self) -> Result<PendingUpload, ClientError> {
        if self.uploading {
            return Err(ClientError::Busy);
        }
        match self.validate() {
            Ok(pending) => {
                self.errors = FieldErrors::new();
                self.uploading = true;
                Ok(pending)
            }
            Err(e) => {
                if let Some(errors) = e.field_errors() {
                    self.errors = errors.clone();
                }
                self.notifier.error("Please fill in all required fields");
                Err(e)
            }
        }
    }

    /// Second half of a submit: clears the busy flag, resets on success,
    /// keeps every input on failure.
    pub fn finish_submit(&mut self, result: Result<(), ClientError>) -> Result<(), ClientError> {
        self.uploading = false;
        match result {
            Ok(()) => {
                info!("image uploaded for transformer {:?}", self.transformer_id);
                self.notifier.success("Image uploaded successfully!");
                self.reset();
                Ok(())
            }
            Err(e) => {
                self.notifier.failure(&e, "Failed to upload image");
                Err(e)
            }
        }
    }

    /// Validates, uploads and settles the form. Returns the transformer whose
    /// image list should now be refreshed.
    pub async fn submit(&mut self, api: &dyn TransformerApi) -> Result<TransformerId, ClientError> {
        let pending = self.begin_submit()?;
        let result = pending.send(api).await;
        self.finish_submit(result)?;
        Ok(pending.transformer_id)
    }

    /// Clears what the user typed or picked after a successful upload. Unlike
    /// a full page reset, the transformer/inspection binding and image type
    /// are kept so the next upload goes to the same place; use `reset_all`
    /// to return to an unbound BASELINE form.
    pub fn reset(&mut self) {
        self.remove_file();
        self.uploader.clear();
        self.weather = Some(Weather::default());
        self.temperature_c.clear();
        self.humidity.clear();
        self.location_note.clear();
        self.errors = FieldErrors::new();
    }

    /// Back to the unbound default: no transformer, no inspection, BASELINE.
    /// Pending notifications are kept.
    pub fn reset_all(&mut self) {
        let notifier = std::mem::take(&mut self.notifier);
        *self = Self {
            notifier,
            ..Self::default()
        };
    }
}

fn optional_number(raw: &str, field: &'static str, label: &str, errors: &mut FieldErrors) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            errors.add(field, format!("{} must be a number", label));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn png() -> SelectedFile {
        SelectedFile::new("thermal.png", "image/png", vec![0x89u8, 0x50, 0x4e, 0x47])
    }

    fn filled(image_type: ImageType) -> UploadForm {
        let mut form = UploadForm::new();
        form.transformer_id = Some(5);
        form.image_type = image_type;
        form.uploader = "  Saman  ".to_string();
        form.select_file(png()).unwrap();
        form
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let mut form = UploadForm::new();
        form.uploader = "   ".to_string();
        let err = form.begin_submit().unwrap_err();
        let errors = err.field_errors().unwrap();
        assert!(errors.contains("transformer"));
        assert!(errors.contains("file"));
        assert!(errors.contains("uploader"));
        assert!(!form.is_uploading());
        assert_eq!(form.errors(), errors);
    }

    #[test]
    fn baseline_without_weather_is_rejected() {
        let mut form = filled(ImageType::Baseline);
        form.weather = None;
        let err = form.validate().unwrap_err();
        assert!(err.field_errors().unwrap().contains("weather"));
    }

    #[test]
    fn baseline_blank_optionals_are_omitted() {
        let mut form = filled(ImageType::Baseline);
        form.weather = Some(Weather::Rainy);
        form.temperature_c = "31.5".to_string();
        form.humidity = " ".to_string();
        form.location_note = "  ".to_string();

        let pending = form.validate().unwrap();
        assert_eq!(
            serde_json::to_value(&pending.meta).unwrap(),
            json!({
                "imageType": "BASELINE",
                "uploader": "Saman",
                "envCondition": { "weather": "RAINY", "temperatureC": 31.5 }
            })
        );
    }

    #[test]
    fn maintenance_meta_has_no_env_keys() {
        let mut form = filled(ImageType::Maintenance);
        form.inspection_id = Some(12);
        form.weather = None;
        let pending = form.validate().unwrap();
        let value = serde_json::to_value(&pending.meta).unwrap();
        assert_eq!(
            value,
            json!({ "imageType": "MAINTENANCE", "uploader": "Saman", "inspectionId": 12 })
        );
    }

    #[test]
    fn non_numeric_temperature_is_a_field_error() {
        let mut form = filled(ImageType::Baseline);
        form.temperature_c = "hot".to_string();
        let err = form.validate().unwrap_err();
        assert!(err.field_errors().unwrap().contains("temperatureC"));
    }

    #[test]
    fn non_image_file_keeps_previous_selection() {
        let mut form = filled(ImageType::Baseline);
        let err = form
            .select_file(SelectedFile::new("report.pdf", "application/pdf", vec![1u8]))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidFile(_)));
        assert_eq!(form.file().unwrap().name, "thermal.png");
        assert!(form.preview().unwrap().starts_with("data:image/png;base64,"));
        assert_eq!(form.notifier.latest().unwrap().message, "Please select a valid image file");
    }

    #[test]
    fn second_submit_while_pending_is_refused() {
        let mut form = filled(ImageType::Baseline);
        form.begin_submit().unwrap();
        assert!(form.is_uploading());
        assert!(!form.can_submit());
        assert!(matches!(form.begin_submit(), Err(ClientError::Busy)));
    }

    #[test]
    fn failure_preserves_inputs_and_success_resets() {
        let mut form = filled(ImageType::Baseline);
        form.temperature_c = "29".to_string();
        form.begin_submit().unwrap();
        let err = ClientError::Backend {
            status: 500,
            message: None,
        };
        assert!(form.finish_submit(Err(err)).is_err());
        assert!(!form.is_uploading());
        assert_eq!(form.uploader, "  Saman  ");
        assert!(form.file().is_some());
        assert_eq!(form.notifier.latest().unwrap().message, "Failed to upload image");

        form.weather = Some(Weather::Cloudy);
        form.begin_submit().unwrap();
        form.finish_submit(Ok(())).unwrap();
        assert!(form.file().is_none());
        assert!(form.preview().is_none());
        assert!(form.uploader.is_empty());
        assert!(form.temperature_c.is_empty());
        assert_eq!(form.weather, Some(Weather::Sunny));
        assert_eq!(form.transformer_id, Some(5));
    }

    #[test]
    fn reset_all_unbinds_the_form() {
        let mut form = UploadForm::for_target(5, Some(12));
        form.uploader = "Saman".to_string();
        form.select_file(png()).unwrap();
        form.weather = Some(Weather::Rainy);

        form.reset();
        assert_eq!(form.transformer_id, Some(5));
        assert_eq!(form.image_type, ImageType::Maintenance);

        form.notifier.success("Image uploaded successfully!");
        form.reset_all();
        assert_eq!(form.transformer_id, None);
        assert_eq!(form.inspection_id, None);
        assert_eq!(form.image_type, ImageType::Baseline);
        assert_eq!(form.weather, Some(Weather::Sunny));
        assert!(form.file().is_none());
        assert!(!form.notifier.is_empty());
    }

    #[test]
    fn media_types_from_extensions() {
        assert_eq!(media_type_for(Path::new("a/B.JPG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("scan.png")), "image/png");
        assert_eq!(media_type_for(Path::new("notes.txt")), "application/octet-stream");
    }

    #[tokio::test]
    async fn read_file_loads_bytes_and_type() {
        let path = std::env::temp_dir().join(format!("upload-read-{}.png", std::process::id()));
        tokio::fs::write(&path, [1u8, 2, 3]).await.unwrap();
        let file = read_file(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(file.media_type, "image/png");
        assert_eq!(file.bytes.as_ref(), &[1u8, 2, 3]);
    }
}
