//! postforge renders personalized social posts from authored templates.
//!
//! A template fixes a frame size, a main image or video, and optional slots for a profile photo,
//! name, phone number and address. A render resolves a template and a user by id, composites
//! the user's details over the main media on the CPU, and stores the result through an upload
//! collaborator:
//!
//! - Build a [`Renderer`] from a [`ForgeConfig`] and a set of [`Collaborators`]
//! - Call [`Renderer::render_personal`] or [`Renderer::render_business`]
//! - Run many requests at once through a [`JobPool`]
//!
//! Image templates produce a PNG. Video templates produce an H.264/AAC MP4 and need `ffmpeg`
//! and `ffprobe` on `PATH`.
#![forbid(unsafe_code)]

mod assets;
mod encode;
mod foundation;
mod layout;
mod model;
mod render;
mod service;
mod text;

pub use crate::foundation::config::{
    ConcurrencyConfig, FetchConfig, FontConfig, ForgeConfig, MediaConfig, OutputConfig,
};
pub use crate::foundation::core::{FrameRGBA, FrameSize, Point, Rgba8};
pub use crate::foundation::error::{ForgeError, ForgeResult, RecordKind};

pub use crate::model::color::parse_color;
pub use crate::model::template::{
    MainMedia, MediaKind, ProfileShape, ProfileSlot, Template, TextSlot, infer_media_kind,
};
pub use crate::model::user::{UsageType, UserRecord};

pub use crate::assets::AssetFetcher;
pub use crate::assets::decode::decode_image;
pub use crate::assets::fetch::{BlobSource, HttpBlobSource, MemoryBlobSource};
pub use crate::assets::media::{VideoSourceInfo, is_tool_available, probe_video};

pub use crate::layout::geometry::{
    CoverCrop, FitPlacement, address_max_width, address_origin, anchor, centered_top_left,
    cover_square, fit_within, max_profile_side, text_origin,
};
pub use crate::render::mask::{apply_mask, circle_mask};
pub use crate::text::font::{FontFace, FontOrigin, FontResolver, ResolvedFont};
pub use crate::text::layout::{
    BuiltinMeasure, FaceMeasure, PlacedLine, TextExtent, TextMeasure, TextShaper, line_height,
    stack_lines, wrap_words,
};

pub use crate::render::canvas::Canvas;
pub use crate::render::compositor::{
    Backdrop, Composite, CompositeReport, Compositor, LayerKind,
};

pub use crate::encode::ffmpeg::{FfmpegOpts, OverlayEncode};
pub use crate::encode::output::{
    ArtifactNamer, MP4_CONTENT_TYPE, OutputEncoder, PNG_CONTENT_TYPE, StoredArtifact,
};
pub use crate::encode::png::{encode_image_png, encode_png, frame_to_image, write_png};
pub use crate::encode::video::{OverlayState, VideoOverlayAdapter, VideoOverlayOutput};

pub use crate::service::collab::{
    BackgroundRemover, DirUploadSink, JsonDirStore, MemoryStore, MemoryUploadSink, StoredObject,
    TemplateStore, UploadSink, UserStore,
};
pub use crate::service::job::{CompositeJob, OverlayType, UserDataUsed};
pub use crate::service::pool::{JobPool, RenderRequest};
pub use crate::service::renderer::{Collaborators, OmittedLayer, RenderOutcome, Renderer};
