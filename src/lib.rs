//! Cicerone - guided tours for terminal interfaces
//!
//! Sequential highlighted callouts ("steps") over regions of a host UI,
//! plus ephemeral one-off badges. The core is the step-sequencing and
//! positioning engine: two step sources merged into one ordered sequence, a
//! linear state machine driving it, and tooltip placement solved against
//! viewport constraints. Rendering sits behind the [`render::Renderer`]
//! trait; a ratatui backend and a demo host ship in [`ui`] and [`app`].

pub mod app;
pub mod badge;
pub mod config;
pub mod document;
pub mod events;
pub mod geometry;
pub mod logging;
pub mod merge;
pub mod position;
pub mod render;
pub mod step;
pub mod tour;
pub mod ui;

pub use badge::BadgeController;
pub use config::{Config, TourOptions};
pub use document::{Document, StepAnnotation, Target};
pub use events::{TourButton, TourEvent, TourKey};
pub use geometry::{Rect, Size, Viewport};
pub use merge::MergeError;
pub use render::{BadgeLayers, LayerId, Renderer, StepLayers};
pub use step::{PositionHint, ProgrammaticStep, Step, StepKind, TargetRef};
pub use tour::{Phase, Tour};
