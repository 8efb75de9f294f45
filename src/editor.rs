//! The editing session: one photo, one evolving style, one container.
//!
//! [`Editor`] is the single owner of session state. Callers never mutate it
//! directly; they queue [`EditorEvent`]s and call [`Editor::run`] from their
//! event loop. Recomputation is synchronous and happens only inside `run`.
//!
//! | Event | Discipline | Side effect |
//! |---|---|---|
//! | `StyleChanged` | throttle | snapshot replaced immediately, layout at most once per interval |
//! | `ContainerResized` | debounce | image hidden immediately, layout + show after resizing stops |
//!
//! A recompute with an unmeasured container is skipped without error; the
//! next resize that supplies a real size picks it up.

use crate::geometry::{ContainerSize, DerivedLayout, ImageDimensions, compute_layout};
use crate::schedule::{Debounce, ScheduleConfig, Throttle};
use crate::style::StyleOptions;
use std::collections::VecDeque;
use std::time::Instant;

#[derive(Debug, Clone)]
pub enum EditorEvent {
    StyleChanged(StyleOptions),
    ContainerResized(ContainerSize),
}

#[derive(Debug)]
pub struct Editor {
    image: ImageDimensions,
    style: StyleOptions,
    container: Option<ContainerSize>,
    layout: DerivedLayout,
    image_visible: bool,
    queue: VecDeque<EditorEvent>,
    style_throttle: Throttle<StyleOptions>,
    resize_debounce: Debounce<()>,
}

impl Editor {
    pub fn new(image: ImageDimensions, style: StyleOptions, schedule: &ScheduleConfig) -> Self {
        Self {
            image,
            style,
            container: None,
            layout: DerivedLayout::degenerate(),
            image_visible: true,
            queue: VecDeque::new(),
            style_throttle: Throttle::new(schedule.throttle()),
            resize_debounce: Debounce::new(schedule.debounce()),
        }
    }

    /// First measurement of the container: lay out immediately, no debounce.
    pub fn mount(&mut self, container: ContainerSize) -> &DerivedLayout {
        self.container = Some(container);
        let style = self.style.clone();
        self.recompute(&style);
        &self.layout
    }

    pub fn push(&mut self, event: EditorEvent) {
        self.queue.push_back(event);
    }

    /// Drain queued events and fire any due timers. Returns true if the
    /// layout was recomputed.
    pub fn run(&mut self, now: Instant) -> bool {
        let mut changed = false;

        while let Some(event) = self.queue.pop_front() {
            match event {
                EditorEvent::StyleChanged(style) => {
                    self.style = style.clone();
                    if let Some(style) = self.style_throttle.call(style, now) {
                        changed |= self.recompute(&style);
                    }
                }
                EditorEvent::ContainerResized(container) => {
                    self.container = Some(container);
                    self.image_visible = false;
                    self.resize_debounce.call((), now);
                }
            }
        }

        if let Some(style) = self.style_throttle.poll(now) {
            changed |= self.recompute(&style);
        }

        if self.resize_debounce.poll(now).is_some() {
            let style = self.style.clone();
            changed |= self.recompute(&style);
            self.image_visible = true;
        }

        changed
    }

    /// The earliest instant at which [`run`](Self::run) has timer work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.style_throttle.deadline(), self.resize_debounce.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn recompute(&mut self, style: &StyleOptions) -> bool {
        let Some(container) = self.container.filter(ContainerSize::is_measured) else {
            tracing::debug!("recompute deferred: container not measured");
            return false;
        };
        if self.image.is_empty() {
            tracing::warn!("recompute skipped: image has no pixel size");
            return false;
        }
        self.layout = compute_layout(container, self.image, style);
        true
    }

    pub fn style(&self) -> &StyleOptions {
        &self.style
    }

    pub fn layout(&self) -> &DerivedLayout {
        &self.layout
    }

    pub fn image(&self) -> ImageDimensions {
        self.image
    }

    pub fn container(&self) -> Option<ContainerSize> {
        self.container
    }

    /// False while a resize is in flight; the photo is hidden so transient
    /// sizes never flash on screen.
    pub fn image_visible(&self) -> bool {
        self.image_visible
    }
}
