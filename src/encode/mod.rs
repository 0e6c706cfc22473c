pub(crate) mod ffmpeg;
pub(crate) mod output;
pub(crate) mod png;
pub(crate) mod video;
