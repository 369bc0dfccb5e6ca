// src/input.rs
// Scoped keyboard/touch subscriptions. A listener exists exactly as long as
// its `Subscription` value; dropping it detaches from the bus.
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::config::SWIPE_THRESHOLD_PX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key(Key),
    TouchStart { x: f32, y: f32 },
    TouchEnd { x: f32, y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Finger moved right: go to the previous image.
    Right,
    /// Finger moved left: go to the next image.
    Left,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<(u64, UnboundedSender<InputEvent>)>,
}

#[derive(Clone, Default)]
pub struct InputBus {
    inner: Arc<Mutex<BusInner>>,
}

fn lock(inner: &Mutex<BusInner>) -> MutexGuard<'_, BusInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InputBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = lock(&self.inner);
        inner.next_id += 1;
        let id = inner.next_id;
        inner.listeners.push((id, tx));
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
            rx,
        }
    }

    /// Delivers `event` to every live listener, returns how many received it.
    pub fn dispatch(&self, event: InputEvent) -> usize {
        let mut inner = lock(&self.inner);
        inner.listeners.retain(|(_, tx)| tx.send(event).is_ok());
        inner.listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }
}

pub struct Subscription {
    id: u64,
    bus: Weak<Mutex<BusInner>>,
    rx: UnboundedReceiver<InputEvent>,
}

impl Subscription {
    pub fn try_next(&mut self) -> Option<InputEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            lock(&inner).listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Turns a touch start/end pair into a swipe. Only horizontal travel counts.
#[derive(Debug, Default)]
pub struct SwipeTracker {
    start_x: Option<f32>,
}

impl SwipeTracker {
    pub fn start(&mut self, x: f32) {
        self.start_x = Some(x);
    }

    pub fn end(&mut self, x: f32) -> Option<SwipeDirection> {
        let dx = x - self.start_x.take()?;
        if dx.abs() <= SWIPE_THRESHOLD_PX {
            return None;
        }
        Some(if dx > 0.0 {
            SwipeDirection::Right
        } else {
            SwipeDirection::Left
        })
    }

    pub fn reset(&mut self) {
        self.start_x = None;
    }
}
