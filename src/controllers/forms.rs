// src/controllers/forms.rs
// Create/edit forms for transformers and inspections. Fields validate on
// blur once touched, and all at once on submit.
use std::collections::BTreeSet;

use crate::errors::{ClientError, FieldErrors};
use crate::models::*;

const MIN_CODE_LEN: usize = 3;

#[derive(Debug, Default)]
pub struct TransformerForm {
    pub transformer_no: String,
    pub pole_no: String,
    pub region: String,
    pub transformer_type: Option<TransformerType>,
    editing: Option<TransformerId>,
    touched: BTreeSet<&'static str>,
    errors: FieldErrors,
}

impl TransformerForm {
    pub const FIELDS: [&'static str; 4] = ["transformerNo", "poleNo", "region", "transformerType"];

    fn check(&self, field: &str) -> Option<&'static str> {
        match field {
            "transformerNo" => {
                let value = self.transformer_no.trim();
                if value.is_empty() {
                    Some("Transformer number is required")
                } else if value.chars().count() < MIN_CODE_LEN {
                    Some("Transformer number must be at least 3 characters")
                } else {
                    None
                }
            }
            "poleNo" if self.pole_no.trim().is_empty() => Some("Pole number is required"),
            "region" if self.region.trim().is_empty() => Some("Region is required"),
            "transformerType" if self.transformer_type.is_none() => Some("Transformer type is required"),
            _ => None,
        }
    }

    /// Marks `field` touched and refreshes its message.
    pub fn blur(&mut self, field: &'static str) {
        self.touched.insert(field);
        self.recheck(field);
    }

    /// Re-validates a touched field after its value changed.
    pub fn changed(&mut self, field: &'static str) {
        if self.touched.contains(field) {
            self.recheck(field);
        }
    }

    fn recheck(&mut self, field: &'static str) {
        self.errors.remove(field);
        if let Some(msg) = self.check(field) {
            self.errors.add(field, msg);
        }
    }

    pub fn validate(&mut self) -> Result<TransformerDraft, ClientError> {
        let mut errors = FieldErrors::new();
        for field in Self::FIELDS {
            if let Some(msg) = self.check(field) {
                errors.add(field, msg);
            }
        }
        self.touched.extend(Self::FIELDS);
        self.errors = errors.clone();
        errors.into_result()?;

        let transformer_type = self
            .transformer_type
            .ok_or_else(|| ClientError::field("transformerType", "Transformer type is required"))?;
        Ok(TransformerDraft {
            transformer_no: self.transformer_no.trim().to_string(),
            pole_no: self.pole_no.trim().to_string(),
            region: self.region.trim().to_string(),
            transformer_type,
        })
    }

    pub fn start_edit(&mut self, transformer: &Transformer) {
        self.transformer_no = transformer.transformer_no.clone();
        self.pole_no = transformer.pole_no.clone().unwrap_or_default();
        self.region = transformer.region.clone().unwrap_or_default();
        self.transformer_type = transformer.transformer_type;
        self.editing = Some(transformer.id);
        self.touched.clear();
        self.errors = FieldErrors::new();
    }

    pub fn editing(&self) -> Option<TransformerId> {
        self.editing
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }
}

#[derive(Debug, Default)]
pub struct InspectionForm {
    pub title: String,
    pub inspector: String,
    pub notes: String,
    pub status: InspectionStatus,
    submitting: bool,
    touched: BTreeSet<&'static str>,
    errors: FieldErrors,
}

impl InspectionForm {
    pub const FIELDS: [&'static str; 2] = ["title", "inspector"];

    fn check(&self, field: &str) -> Option<&'static str> {
        match field {
            "title" => {
                let value = self.title.trim();
                if value.is_empty() {
                    Some("Title is required")
                } else if value.chars().count() < MIN_CODE_LEN {
                    Some("Title must be at least 3 characters")
                } else {
                    None
                }
            }
            "inspector" if self.inspector.trim().is_empty() => Some("Inspector name is required"),
            _ => None,
        }
    }

    pub fn blur(&mut self, field: &'static str) {
        self.touched.insert(field);
        self.errors.remove(field);
        if let Some(msg) = self.check(field) {
            self.errors.add(field, msg);
        }
    }

    pub fn validate(&mut self) -> Result<InspectionDraft, ClientError> {
        let mut errors = FieldErrors::new();
        for field in Self::FIELDS {
            if let Some(msg) = self.check(field) {
                errors.add(field, msg);
            }
        }
        self.touched.extend(Self::FIELDS);
        self.errors = errors.clone();
        errors.into_result()?;

        let notes = Some(self.notes.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        Ok(InspectionDraft {
            title: self.title.trim().to_string(),
            inspector: self.inspector.trim().to_string(),
            notes,
            status: self.status,
        })
    }

    pub fn begin_submit(&mut self) -> Result<InspectionDraft, ClientError> {
        if self.submitting {
            return Err(ClientError::Busy);
        }
        let draft = self.validate()?;
        self.submitting = true;
        Ok(draft)
    }

    pub fn finish_submit(&mut self) {
        self.submitting = false;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }
}
