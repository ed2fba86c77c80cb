//! # Photo Picker
//!
//! The native half of a photo-picker plugin for hybrid (web-view) apps. The
//! web layer asks for images; this crate gets the user to choose some, then
//! turns each choice into a normalized, upright, size-bounded JPEG, handed
//! back either as a `file://` reference into a private cache or inline as
//! base64, optionally with a nested thumbnail.
//!
//! # Architecture: Three Components
//!
//! ```text
//! caller ──▶ Picker ──▶ SelectionSource ──▶ (user, async) ──▶ transform per reference ──▶ caller
//!            orchestrator   modern | legacy                    imaging::operations
//! ```
//!
//! - **Selection sources** ([`source`]) hide two pickers behind one decision.
//!   The platform's system picker is preferred when the platform supports it
//!   and its result callback could be registered in time; otherwise the
//!   plugin's legacy multi-select screen is used, behind storage permission.
//! - **The transform engine** ([`imaging`]) does one bounded decode, one
//!   orientation fix, one scale and one re-encode per image. A failing image
//!   is dropped; the rest of the selection still comes back, in order.
//! - **The orchestrator** ([`orchestrator`]) owns the
//!   `Idle → AwaitingSelection → Processing → Idle` state machine, persists
//!   the pending pick across process death, runs the transform pass on the
//!   rayon pool and delivers exactly one result or one failure string.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`request`] | `getPictures` option parsing into an immutable [`request::PickRequest`] |
//! | [`config`] | `photo-picker.toml` loading, validation and merging |
//! | [`media`] | Opaque media references and the resolver that reads them |
//! | [`imaging`] | Sizing math, the `image`-crate backend, the transform steps |
//! | [`cache`] | Private artifact directory with unique names |
//! | [`artifact`] | Artifacts, result sets and the two response shapes |
//! | [`source`] | System and legacy pickers, fallback policy, result codes |
//! | [`permission`] | Storage-read permission seam |
//! | [`state`] | Durable pending-pick record |
//! | [`orchestrator`] | The [`orchestrator::Picker`] itself |
//! | [`commands`] | Bridge action dispatch (`getPictures`, permission commands) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Read Once, Work From Memory
//!
//! Media references may be revoked by the platform once the picker closes.
//! Every [`imaging::ImageBackend`] operation therefore takes bytes, and the
//! engine reads each reference exactly once before doing anything else.
//!
//! ## Bounded Decode Before Precise Scale
//!
//! A 48 MP photo for a 200 px thumbnail should never be decoded at full size.
//! [`imaging::calculate_sample_size`] picks the largest power-of-two reduction
//! that still leaves at least the requested box, and only then is the
//! raster scaled precisely with [`imaging::calculate_fit_dimensions`]. JPEGs
//! are reduced in the DCT domain while decoding; the pixel ceiling is
//! checked against the raster that will actually be materialized.
//!
//! ## Positional Drops, Not Error Slots
//!
//! The caller gets a plain sequence. A reference that cannot be read, decoded
//! or encoded is absent from it; the reason goes to the log (see
//! [`config::FailurePolicy`]), not into the response.

pub mod artifact;
pub mod cache;
pub mod commands;
pub mod config;
pub mod imaging;
pub mod media;
pub mod orchestrator;
pub mod output;
pub mod permission;
pub mod request;
pub mod source;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;
