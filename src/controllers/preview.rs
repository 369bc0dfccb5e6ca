// src/controllers/preview.rs
use log::debug;

use crate::controllers::carousel::Carousel;
use crate::errors::ClientError;
use crate::input::{InputBus, InputEvent, Key, Subscription, SwipeDirection, SwipeTracker};
use crate::models::{Image, TransformerId};
use crate::notify::Notifier;
use crate::services::TransformerApi;
use crate::services::backend::raw_image_url;

/// Image Preview/Navigation Controller.
///
/// Open state is the presence of an input subscription: keyboard and swipe
/// events reach this controller only between `open` and `close`.
pub struct PreviewController {
    base_url: String,
    images: Carousel<Image>,
    current_url: Option<String>,
    subscription: Option<Subscription>,
    swipe: SwipeTracker,
}

impl PreviewController {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            images: Carousel::default(),
            current_url: None,
            subscription: None,
            swipe: SwipeTracker::default(),
        }
    }

    pub fn open(&mut self, bus: &InputBus, images: Vec<Image>, index: usize) -> Result<(), ClientError> {
        let images = Carousel::starting_at(images, index)?;
        self.images = images;
        self.swipe.reset();
        if self.subscription.is_none() {
            self.subscription = Some(bus.subscribe());
        }
        self.refresh_url();
        Ok(())
    }

    pub fn close(&mut self) {
        if self.subscription.take().is_some() {
            debug!("preview closed");
        }
        self.images.clear();
        self.swipe.reset();
        self.current_url = None;
    }

    pub fn is_open(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn next(&mut self) {
        self.images.next();
        self.refresh_url();
    }

    pub fn previous(&mut self) {
        self.images.previous();
        self.refresh_url();
    }

    pub fn jump_to(&mut self, index: usize) -> Result<(), ClientError> {
        self.images.jump_to(index)?;
        self.refresh_url();
        Ok(())
    }

    /// Swaps the image list under an open preview, e.g. after a reload.
    /// An empty list closes the preview.
    pub fn replace_images(&mut self, images: Vec<Image>) {
        if images.is_empty() {
            self.close();
            return;
        }
        self.images.replace(images);
        self.refresh_url();
    }

    /// Applies one input event. Returns whether it was consumed.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        if !self.is_open() {
            return false;
        }
        match event {
            InputEvent::Key(Key::ArrowLeft) => self.previous(),
            InputEvent::Key(Key::ArrowRight) => self.next(),
            InputEvent::Key(Key::Escape) => self.close(),
            InputEvent::Key(Key::Other) => return false,
            InputEvent::TouchStart { x, .. } => self.swipe.start(x),
            InputEvent::TouchEnd { x, .. } => match self.swipe.end(x) {
                Some(SwipeDirection::Right) => self.previous(),
                Some(SwipeDirection::Left) => self.next(),
                None => return false,
            },
        }
        true
    }

    /// Drains pending events from the subscription. Returns how many were consumed.
    pub fn pump(&mut self) -> usize {
        let mut consumed = 0;
        while let Some(event) = self.subscription.as_mut().and_then(Subscription::try_next) {
            if self.handle_event(event) {
                consumed += 1;
            }
        }
        consumed
    }

    pub fn current(&self) -> Option<&Image> {
        self.images.current()
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn index(&self) -> usize {
        self.images.index()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn position_label(&self) -> Option<String> {
        self.images.position_label()
    }

    fn refresh_url(&mut self) {
        self.current_url = self
            .images
            .current()
            .map(|image| raw_image_url(&self.base_url, image.id));
        if self.images.is_empty() && self.is_open() {
            self.close();
            return;
        }
        debug!(
            "preview at {}/{}: {}",
            self.images.index() + 1,
            self.images.len(),
            self.current_url.as_deref().unwrap_or("-")
        );
    }
}

/// The image list of one transformer, as shown in its images dialog.
pub struct ImageGallery {
    transformer_id: Option<TransformerId>,
    images: Vec<Image>,
    loading: bool,
    pub notifier: Notifier,
}

impl Default for ImageGallery {
    fn default() -> Self {
        Self {
            transformer_id: None,
            images: Vec::new(),
            loading: false,
            notifier: Notifier::default(),
        }
    }
}

impl ImageGallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the previous transformer's images before fetching the new ones.
    pub async fn open(&mut self, api: &dyn TransformerApi, transformer_id: TransformerId) {
        self.transformer_id = Some(transformer_id);
        self.images.clear();
        self.refresh(api).await;
    }

    pub async fn refresh(&mut self, api: &dyn TransformerApi) {
        let Some(transformer_id) = self.transformer_id else {
            return;
        };
        self.loading = true;
        match api.list_images(transformer_id).await {
            Ok(images) => self.images = images,
            Err(e) => {
                self.notifier.failure(&e, "Failed to load images");
            }
        }
        self.loading = false;
    }

    pub fn open_preview(
        &self,
        preview: &mut PreviewController,
        bus: &InputBus,
        index: usize,
    ) -> Result<(), ClientError> {
        preview.open(bus, self.images.clone(), index)
    }

    pub fn transformer_id(&self) -> Option<TransformerId> {
        self.transformer_id
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}
