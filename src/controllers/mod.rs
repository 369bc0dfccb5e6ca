// src/controllers/mod.rs
pub mod carousel;
pub mod comparison;
pub mod export;
pub mod forms;
pub mod listing;
pub mod preview;
pub mod upload;

pub use carousel::Carousel;
pub use comparison::{BaselineView, ComparisonController, MaintenanceView, UnlinkedMaintenance};
pub use export::save_image;
pub use forms::{InspectionForm, TransformerForm};
pub use listing::{
    EntryFilter, FilteredList, InspectionBoard, InspectionFilter, Selection, TransformerDirectory,
    TransformerFilter,
};
pub use preview::{ImageGallery, PreviewController};
pub use upload::UploadForm;
