//! Layer composition, interactive editing and flatten engine for photo compositions.
//!
//! A composition is a background photo, an optional extracted-foreground
//! cutout, and an ordered stack of text, shape and image layers. This crate
//! owns the full lifecycle of that composition: the serializable document,
//! the intents that mutate it, the gesture engine that turns pointer input
//! into intents, and the rasterizer that flattens the result into a single
//! image at the background's native resolution. The host is responsible only
//! for wiring input events to the engine and for resolving image references.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Interactive editor: [`engine::EngineCore`] and host [`engine::Action`]s |
//! | [`store`] | Closed [`store::Intent`] union and the [`store::DocStore`] reducer |
//! | [`doc`] | Serializable document, layer types and sparse patches |
//! | [`geometry`] | Percentage pose to pixel transforms, rects and the tilt shear |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing: point hits, marquee intersection, cutout alpha mask |
//! | [`text`] | Multi-line text layout with letter spacing and justify |
//! | [`fonts`] | Loaded font faces, glyph metrics and outlines |
//! | [`effects`] | Shadow/glow pass planning and alpha blur |
//! | [`color`] | CSS color parsing |
//! | [`render`] | Rasterizes one layer onto a pixmap |
//! | [`export`] | Flatten pipeline, image sources and the single-flight exporter |
//! | [`consts`] | Shared numeric constants |

pub mod color;
pub mod consts;
pub mod doc;
pub mod effects;
pub mod engine;
pub mod export;
pub mod fonts;
pub mod geometry;
pub mod hit;
pub mod input;
pub mod render;
pub mod store;
pub mod text;
