//! Detection service integration.
//!
//! The five backends differ only in endpoint, required form fields and
//! response shape, which [`DetectionKind`] and [`DetectionResponse`] capture.

mod client;
pub mod data_url;
mod kind;
mod slots;
pub mod types;

pub use client::{
    DetectionClient, DetectionConfig, DetectionError, DetectionRequest, SourceImage,
    DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS,
};
pub use data_url::{decode_data_url, decode_png_data_url};
pub use kind::DetectionKind;
pub use slots::{RequestTicket, ResultSlots, SlotState};
pub use types::DetectionResponse;
