//! Media vocabulary shared by every stage: containers, codecs, quality
//! tokens and the probe descriptor.

mod codec;
mod container;
mod types;

pub use codec::{AudioCodec, AudioQuality, Preset, TokenError, VideoCodec, VideoQuality};
pub use container::{kind_for_extension, AudioPolicy, Container, VideoPolicy};
pub use types::{extension_of, format_duration, format_size, MediaDescriptor, MediaKind};
