//! ffmpeg/ffprobe-backed media implementations.
//!
//! Probing reads stream metadata via ffprobe's JSON output; decoding spawns
//! an ffmpeg subprocess emitting raw RGB24 frames on stdout and reads them
//! sequentially. Works everywhere the ffmpeg tools are installed.

use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use image::RgbImage;

use super::{FrameSource, FrameSourceOpener, MediaError, MediaProber, MediaResult};

/// Properties read from a video stream's metadata.
#[derive(Debug, Clone, Copy)]
pub struct VideoInfo {
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Probe a video file with ffprobe.
///
/// Frame count comes from `nb_frames` when the container carries it, with a
/// duration * fps fallback. Returns `ProbeFailed` when ffprobe cannot run or
/// reports no video stream.
pub fn probe(path: &Path) -> MediaResult<VideoInfo> {
    let probe_failed = |message: String| MediaError::ProbeFailed {
        path: path.to_path_buf(),
        message,
    };

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=nb_frames,r_frame_rate,avg_frame_rate,duration,width,height",
            "-show_entries",
            "format=duration",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .map_err(|e| probe_failed(format!("ffprobe execution failed: {e}")))?;

    if !output.status.success() {
        return Err(probe_failed(format!(
            "ffprobe exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let data: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| probe_failed(format!("unparseable ffprobe output: {e}")))?;

    let stream = data
        .get("streams")
        .and_then(|s| s.get(0))
        .ok_or_else(|| probe_failed("no video stream found".to_string()))?;

    let width = stream.get("width").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
    let height = stream.get("height").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
    if width == 0 || height == 0 {
        return Err(probe_failed("stream reports zero dimensions".to_string()));
    }

    let fps = ["avg_frame_rate", "r_frame_rate"]
        .iter()
        .filter_map(|key| stream.get(*key).and_then(|v| v.as_str()))
        .filter_map(parse_fps_fraction)
        .find(|f| *f > 0.0)
        .unwrap_or(0.0);

    let duration = stream
        .get("duration")
        .and_then(|v| v.as_str())
        .or_else(|| {
            data.get("format")
                .and_then(|f| f.get("duration"))
                .and_then(|v| v.as_str())
        })
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let frame_count = stream
        .get("nb_frames")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or_else(|| (duration * fps).round() as u64);

    Ok(VideoInfo {
        frame_count,
        width,
        height,
        fps,
    })
}

/// Parse an ffprobe rate fraction like `"30000/1001"`.
fn parse_fps_fraction(raw: &str) -> Option<f64> {
    let (num, den) = raw.split_once('/')?;
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}

/// [`MediaProber`] backed by ffprobe.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfprobeProber;

impl MediaProber for FfprobeProber {
    fn frame_count(&self, path: &Path) -> MediaResult<u64> {
        probe(path).map(|info| info.frame_count)
    }
}

/// [`FrameSourceOpener`] spawning one ffmpeg decode process per segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegOpener;

impl FrameSourceOpener for FfmpegOpener {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>> {
        let info = probe(path)?;

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MediaError::OpenFailed {
                path: path.to_path_buf(),
                message: format!("failed to spawn ffmpeg: {e}"),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| MediaError::OpenFailed {
            path: path.to_path_buf(),
            message: "ffmpeg stdout unavailable".to_string(),
        })?;

        Ok(Box::new(FfmpegFrameSource {
            path: path.to_path_buf(),
            child,
            stdout: BufReader::new(stdout),
            width: info.width,
            height: info.height,
        }))
    }
}

/// Sequential RGB24 frame reader over an ffmpeg subprocess.
struct FfmpegFrameSource {
    path: PathBuf,
    child: Child,
    stdout: BufReader<ChildStdout>,
    width: u32,
    height: u32,
}

impl FrameSource for FfmpegFrameSource {
    fn next_frame(&mut self) -> MediaResult<Option<RgbImage>> {
        let frame_len = self.width as usize * self.height as usize * 3;
        let mut buf = vec![0u8; frame_len];

        match self.stdout.read_exact(&mut buf) {
            Ok(()) => {}
            // Clean end of stream between frame boundaries.
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => {
                return Err(MediaError::DecodeFailed {
                    path: self.path.clone(),
                    source: e,
                })
            }
        }

        let frame = RgbImage::from_raw(self.width, self.height, buf).ok_or_else(|| {
            MediaError::DecodeFailed {
                path: self.path.clone(),
                source: std::io::Error::new(ErrorKind::InvalidData, "short frame buffer"),
            }
        })?;
        Ok(Some(frame))
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        // The decoder may still be running if the consumer stopped early.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
