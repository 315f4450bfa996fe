//! GUI module for floorplan-scale.
//!
//! Provides a graphical user interface using Iced.

pub mod app;
pub mod canvas;
pub mod logger;

pub use app::FloorplanApp;
pub use logger::{LogEntry, LogLevel, Logger};
