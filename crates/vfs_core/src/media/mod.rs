//! Narrow contracts to the media layer.
//!
//! Decoding and probing go through the [`FrameSource`] / [`MediaProber`]
//! traits so the pipeline never touches a video bitstream directly; the
//! shipped implementations shell out to ffmpeg/ffprobe (see [`ffmpeg`]).
//! Raster persistence and vertical composition are backed by the `image`
//! crate.

mod compose;
mod ffmpeg;

pub use compose::compose_vertical;
pub use ffmpeg::{FfmpegOpener, FfprobeProber};

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the media layer.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to open {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },

    #[error("Failed to probe {path}: {message}")]
    ProbeFailed { path: PathBuf, message: String },

    #[error("Failed to decode frame from {path}: {source}")]
    DecodeFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to persist frame to {path}: {message}")]
    PersistFailed { path: PathBuf, message: String },
}

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Output image format for persisted frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Png,
    Jpg,
}

impl ImageKind {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpg => "jpg",
        }
    }
}

impl FromStr for ImageKind {
    type Err = String;

    /// Case-insensitive; `jpeg` is a documented alias for `jpg`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageKind::Png),
            "jpg" | "jpeg" => Ok(ImageKind::Jpg),
            other => Err(format!(
                "image kind must be 'png', 'jpg' or 'jpeg', got '{other}'"
            )),
        }
    }
}

impl std::fmt::Display for ImageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Frame-count probe over a video file's metadata.
pub trait MediaProber: Send + Sync {
    /// Authoritative total frame count for the file, 0 if undeterminable.
    fn frame_count(&self, path: &Path) -> MediaResult<u64>;
}

/// Sequential decoder over one segment's frames.
pub trait FrameSource: Send {
    /// Decode the next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> MediaResult<Option<RgbImage>>;
}

/// Factory opening a [`FrameSource`] for a segment file.
pub trait FrameSourceOpener: Send + Sync {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>>;
}

/// Persist a raster as `frame_NNNN.<ext>` under `dir` and return the path.
///
/// JPEG output uses quality 95; PNG uses the encoder defaults.
pub fn persist_frame(
    frame: &RgbImage,
    dir: &Path,
    global_frame_number: u64,
    kind: ImageKind,
) -> MediaResult<PathBuf> {
    let path = dir.join(format!(
        "frame_{:04}.{}",
        global_frame_number,
        kind.extension()
    ));

    let persist = |path: &Path| -> Result<(), String> {
        match kind {
            ImageKind::Png => frame.save(path).map_err(|e| e.to_string()),
            ImageKind::Jpg => {
                let file = File::create(path).map_err(|e| e.to_string())?;
                let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), 95);
                encoder.encode_image(frame).map_err(|e| e.to_string())
            }
        }
    };

    persist(&path).map_err(|message| MediaError::PersistFailed {
        path: path.clone(),
        message,
    })?;
    Ok(path)
}

/// Load a persisted frame back as an RGB raster.
pub fn load_frame(path: &Path) -> MediaResult<RgbImage> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|e| MediaError::OpenFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_kind_parses_with_jpeg_alias() {
        assert_eq!("png".parse::<ImageKind>().unwrap(), ImageKind::Png);
        assert_eq!("JPG".parse::<ImageKind>().unwrap(), ImageKind::Jpg);
        assert_eq!("Jpeg".parse::<ImageKind>().unwrap(), ImageKind::Jpg);
        assert!("gif".parse::<ImageKind>().is_err());
    }

    #[test]
    fn persist_frame_writes_zero_padded_filename() {
        let dir = tempfile::tempdir().unwrap();
        let frame = RgbImage::new(4, 2);

        let path = persist_frame(&frame, dir.path(), 101, ImageKind::Png).unwrap();
        assert_eq!(path.file_name().unwrap(), "frame_0101.png");
        assert!(path.exists());

        let loaded = load_frame(&path).unwrap();
        assert_eq!(loaded.dimensions(), (4, 2));
    }

    #[test]
    fn persist_frame_jpg_roundtrips_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let frame = RgbImage::new(8, 6);

        let path = persist_frame(&frame, dir.path(), 1, ImageKind::Jpg).unwrap();
        assert_eq!(path.file_name().unwrap(), "frame_0001.jpg");
        assert_eq!(load_frame(&path).unwrap().dimensions(), (8, 6));
    }

    #[test]
    fn persist_frame_fails_on_missing_directory() {
        let frame = RgbImage::new(4, 2);
        let err = persist_frame(
            &frame,
            Path::new("/nonexistent/dir"),
            1,
            ImageKind::Png,
        );
        assert!(err.is_err());
    }
}
