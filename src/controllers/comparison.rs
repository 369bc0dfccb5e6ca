// src/controllers/comparison.rs
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};
use log::{debug, warn};

use crate::controllers::carousel::Carousel;
use crate::errors::ClientError;
use crate::models::*;
use crate::services::TransformerApi;

/// What to do with maintenance images that carry no inspection reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnlinkedMaintenance {
    /// Treat them as belonging to every inspection of the transformer.
    #[default]
    Include,
    Exclude,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BaselineView {
    Idle,
    Loading,
    Unavailable,
    Ready(Image),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceView {
    Idle,
    Loading,
    Empty,
    Ready,
}

/// Identifies one `open` call. Responses are applied only while their
/// generation is still the controller's current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonRequest {
    pub generation: u64,
    pub transformer_id: TransformerId,
    pub inspection_id: InspectionId,
}

#[derive(Debug)]
pub enum ComparisonUpdate {
    Baseline {
        generation: u64,
        result: Result<Vec<Image>, ClientError>,
    },
    Maintenance {
        generation: u64,
        result: Result<Vec<Image>, ClientError>,
    },
}

impl ComparisonUpdate {
    pub fn generation(&self) -> u64 {
        match self {
            ComparisonUpdate::Baseline { generation, .. } | ComparisonUpdate::Maintenance { generation, .. } => {
                *generation
            }
        }
    }
}

impl ComparisonRequest {
    pub async fn fetch_baseline(self, api: &dyn TransformerApi) -> ComparisonUpdate {
        ComparisonUpdate::Baseline {
            generation: self.generation,
            result: api.baseline_images(self.transformer_id).await,
        }
    }

    pub async fn fetch_maintenance(self, api: &dyn TransformerApi) -> ComparisonUpdate {
        ComparisonUpdate::Maintenance {
            generation: self.generation,
            result: api.maintenance_images(self.transformer_id).await,
        }
    }

    /// Both fetches, yielded in whichever order they complete.
    pub fn fetch_all<'a>(self, api: &'a dyn TransformerApi) -> FuturesUnordered<BoxFuture<'a, ComparisonUpdate>> {
        let pending = FuturesUnordered::new();
        pending.push(self.fetch_baseline(api).boxed());
        pending.push(self.fetch_maintenance(api).boxed());
        pending
    }
}

/// The newest baseline by creation time; records without a readable
/// timestamp rank as oldest.
pub fn latest_baseline(images: &[Image]) -> Option<&Image> {
    images.iter().max_by_key(|image| image.created_at())
}

pub fn maintenance_for_inspection(
    images: Vec<Image>,
    inspection_id: InspectionId,
    policy: UnlinkedMaintenance,
) -> Vec<Image> {
    images
        .into_iter()
        .filter(|image| match image.inspection_id {
            Some(id) => id == inspection_id,
            None => policy == UnlinkedMaintenance::Include,
        })
        .collect()
}

/// Comparison Controller: one baseline against the maintenance images of one
/// inspection.
#[derive(Debug)]
pub struct ComparisonController {
    policy: UnlinkedMaintenance,
    generation: u64,
    active: Option<ComparisonRequest>,
    baseline: BaselineView,
    maintenance_view: MaintenanceView,
    maintenance: Carousel<Image>,
    baseline_failed: bool,
    maintenance_failed: bool,
}

impl Default for ComparisonController {
    fn default() -> Self {
        Self::new(UnlinkedMaintenance::default())
    }
}

impl ComparisonController {
    pub fn new(policy: UnlinkedMaintenance) -> Self {
        Self {
            policy,
            generation: 0,
            active: None,
            baseline: BaselineView::Idle,
            maintenance_view: MaintenanceView::Idle,
            maintenance: Carousel::default(),
            baseline_failed: false,
            maintenance_failed: false,
        }
    }

    /// Starts a comparison. Prior state is dropped before anything is
    /// fetched, so the previous inspection's images never show during loading.
    pub fn open(&mut self, transformer_id: TransformerId, inspection: &Inspection) -> ComparisonRequest {
        self.generation += 1;
        self.reset_sides();
        self.baseline = BaselineView::Loading;
        self.maintenance_view = MaintenanceView::Loading;
        let request = ComparisonRequest {
            generation: self.generation,
            transformer_id,
            inspection_id: inspection.id,
        };
        self.active = Some(request);
        debug!(
            "comparison #{} opened for transformer {} inspection {}",
            request.generation, transformer_id, inspection.id
        );
        request
    }

    /// Closing also retires the current generation; late responses are ignored.
    pub fn close(&mut self) {
        self.generation += 1;
        self.active = None;
        self.reset_sides();
    }

    fn reset_sides(&mut self) {
        self.baseline = BaselineView::Idle;
        self.maintenance_view = MaintenanceView::Idle;
        self.maintenance.clear();
        self.baseline_failed = false;
        self.maintenance_failed = false;
    }

    /// Applies one fetch result. Returns `false` when it belonged to a
    /// superseded request and was discarded.
    pub fn apply(&mut self, update: ComparisonUpdate) -> bool {
        let Some(active) = self.active.filter(|a| a.generation == update.generation()) else {
            debug!(
                "discarding stale comparison response #{} (current #{})",
                update.generation(),
                self.generation
            );
            return false;
        };

        match update {
            ComparisonUpdate::Baseline { result, .. } => match result {
                Ok(images) => {
                    self.baseline = match latest_baseline(&images) {
                        Some(image) => BaselineView::Ready(image.clone()),
                        None => BaselineView::Unavailable,
                    };
                }
                Err(e) => {
                    warn!("baseline images for transformer {} unavailable: {}", active.transformer_id, e);
                    self.baseline_failed = true;
                    self.baseline = BaselineView::Unavailable;
                }
            },
            ComparisonUpdate::Maintenance { result, .. } => match result {
                Ok(images) => {
                    let images = maintenance_for_inspection(images, active.inspection_id, self.policy);
                    self.maintenance_view = if images.is_empty() {
                        MaintenanceView::Empty
                    } else {
                        MaintenanceView::Ready
                    };
                    self.maintenance = Carousel::new(images);
                }
                Err(e) => {
                    warn!(
                        "maintenance images for transformer {} unavailable: {}",
                        active.transformer_id, e
                    );
                    self.maintenance_failed = true;
                    self.maintenance_view = MaintenanceView::Empty;
                    self.maintenance.clear();
                }
            },
        }
        true
    }

    /// `open` followed by both fetches, applying each as it lands.
    pub async fn load(&mut self, api: &dyn TransformerApi, transformer_id: TransformerId, inspection: &Inspection) {
        let request = self.open(transformer_id, inspection);
        let mut pending = request.fetch_all(api);
        while let Some(update) = pending.next().await {
            self.apply(update);
        }
    }

    pub fn next_maintenance(&mut self) {
        self.maintenance.next();
    }

    pub fn previous_maintenance(&mut self) {
        self.maintenance.previous();
    }

    pub fn jump_maintenance(&mut self, index: usize) -> Result<(), ClientError> {
        self.maintenance.jump_to(index)
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.baseline == BaselineView::Loading || self.maintenance_view == MaintenanceView::Loading
    }

    pub fn active(&self) -> Option<ComparisonRequest> {
        self.active
    }

    pub fn baseline(&self) -> &BaselineView {
        &self.baseline
    }

    pub fn maintenance_view(&self) -> MaintenanceView {
        self.maintenance_view
    }

    pub fn maintenance_images(&self) -> &[Image] {
        self.maintenance.items()
    }

    pub fn current_maintenance(&self) -> Option<&Image> {
        self.maintenance.current()
    }

    pub fn maintenance_index(&self) -> usize {
        self.maintenance.index()
    }

    pub fn maintenance_position(&self) -> Option<String> {
        self.maintenance.position_label()
    }

    /// Placeholder text per side, `None` while a side has content or is loading.
    pub fn baseline_message(&self) -> Option<&'static str> {
        match self.baseline {
            BaselineView::Unavailable if self.baseline_failed => Some("Baseline image could not be loaded"),
            BaselineView::Unavailable => Some("No baseline available"),
            _ => None,
        }
    }

    pub fn maintenance_message(&self) -> Option<&'static str> {
        match self.maintenance_view {
            MaintenanceView::Empty if self.maintenance_failed => Some("Maintenance images could not be loaded"),
            MaintenanceView::Empty => Some("No maintenance images for this inspection"),
            _ => None,
        }
    }

    /// Set when both sides came back with nothing to show.
    pub fn empty_state(&self) -> Option<&'static str> {
        let nothing = self.baseline == BaselineView::Unavailable && self.maintenance_view == MaintenanceView::Empty;
        nothing.then_some("No images available for comparison")
    }
}
