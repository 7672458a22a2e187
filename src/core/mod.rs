//! Platform-agnostic core module - shared between the browser atlas and CLI

pub mod calendar;
pub mod config;
pub mod error;
pub mod hike;
pub mod hover;
pub mod index;
pub mod layout;
pub mod media;
pub mod navigation;
pub mod parser;
pub mod trail;
pub mod trips;
pub mod viewport;

pub use config::TimelineConfig;
pub use error::{AtlasError, Placeholder};
pub use hike::{HikeEntry, HikeId, HikeRecord, HikeType, LatLng, TripTag};
pub use hover::{CapsuleHover, CapsuleId, HoverBoard, HoverEffect, HoverState, TimerHandle, Timers, VirtualTimers};
pub use index::{TimeIndex, TimelineGeometry};
pub use layout::{expanded_positions, EdgeClass, MarkerPosition, Timeline, TimelineLayout, TripCapsule};
pub use navigation::{AtlasSession, HistoryAction, PageState};
pub use parser::parse_dataset;
pub use trail::{
    compose_trail_group, group_by_trail, render_trail_group, settle, MapRenderer, RenderOptions, TrackBounds,
    TrackRef, TrackSource, TrailComposite, TrailLook, TrailVisitGroup,
};
pub use trips::{TripGroup, TripPartition};
pub use viewport::{ScrollMode, ScrollRequest, ScrollThrottle, ViewportController};
