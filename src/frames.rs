//! Episode frame handling.
//!
//! An episode is a directory of RGB frames named so that lexical order is
//! temporal order (`00000-rgb.png`, `00001-rgb.png`, ...). A question sees a
//! fixed number of evenly spaced frames from its episode, rescaled so the
//! longest side of the first frame matches the requested size.

use crate::error::{EvalError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::FilterType;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix that marks an RGB frame inside an episode directory.
pub const FRAME_SUFFIX: &str = "-rgb.png";

/// Sorted frame paths of one episode.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    pub episode: PathBuf,
    frames: Vec<PathBuf>,
}

impl FrameSequence {
    /// List the frames of `frames_root/episode`.
    pub fn load(frames_root: &Path, episode: &str) -> Result<Self> {
        let dir = frames_root.join(episode);
        if !dir.is_dir() {
            return Err(EvalError::EpisodeNotFound(dir));
        }

        let mut frames = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir.as_path()).to_path_buf();
                EvalError::io(path, e.into())
            })?;

            let is_frame = entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.ends_with(FRAME_SUFFIX));
            if is_frame {
                frames.push(entry.into_path());
            }
        }

        Ok(Self {
            episode: dir,
            frames,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    /// Pick `num_frames` evenly spaced frames, first and last included.
    pub fn sample(&self, num_frames: usize) -> Result<Vec<PathBuf>> {
        if self.frames.is_empty() {
            return Err(EvalError::EpisodeNotFound(self.episode.clone()));
        }

        Ok(sample_indices(self.frames.len(), num_frames)
            .into_iter()
            .map(|i| self.frames[i].clone())
            .collect())
    }
}

/// `round(linspace(0, available - 1, num_frames))`, rounding half to even.
///
/// Indices are non-decreasing; they repeat only when more frames are
/// requested than exist.
pub fn sample_indices(available: usize, num_frames: usize) -> Vec<usize> {
    if available == 0 || num_frames == 0 {
        return Vec::new();
    }
    if num_frames == 1 {
        return vec![0];
    }

    let stop = (available - 1) as f64;
    let step = stop / (num_frames - 1) as f64;
    (0..num_frames)
        .map(|i| {
            let x = if i == num_frames - 1 {
                stop
            } else {
                i as f64 * step
            };
            x.round_ties_even() as usize
        })
        .collect()
}

/// Decode frames and scale them by `image_size / max(width, height)` of the
/// first frame.
pub fn load_frames(paths: &[PathBuf], image_size: u32) -> Result<Vec<RgbImage>> {
    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        let img = image::open(path).map_err(|e| EvalError::FrameDecode {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        frames.push(img.to_rgb8());
    }

    if frames.is_empty() {
        return Ok(frames);
    }
    let first = &frames[0];
    let size = first.width().max(first.height());
    if size == 0 {
        return Err(EvalError::FrameDecode {
            path: paths[0].clone(),
            reason: "frame has zero size".to_string(),
        });
    }
    let scale = image_size as f64 / size as f64;

    Ok(frames
        .iter()
        .map(|img| {
            let width = ((img.width() as f64 * scale).round() as u32).max(1);
            let height = ((img.height() as f64 * scale).round() as u32).max(1);
            image::imageops::resize(img, width, height, FilterType::Triangle)
        })
        .collect())
}

/// Encode a frame as a `data:image/png;base64,...` URL.
pub fn to_data_url(frame: &RgbImage) -> Result<String> {
    let mut bytes = Cursor::new(Vec::new());
    frame
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| EvalError::FrameDecode {
            path: PathBuf::from("<memory>"),
            reason: e.to_string(),
        })?;
    Ok(format!(
        "data:image/png;base64,{}",
        STANDARD.encode(bytes.into_inner())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_frame(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(width, height, image::Rgb([200, 10, 10]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_sample_indices_spread() {
        let indices = sample_indices(100, 15);
        assert_eq!(indices.len(), 15);
        assert_eq!(indices[0], 0);
        assert_eq!(indices[14], 99);
        assert!(indices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_sample_indices_more_than_available() {
        assert_eq!(sample_indices(3, 5), vec![0, 0, 1, 2, 2]);
    }

    #[test]
    fn test_sample_indices_edges() {
        assert_eq!(sample_indices(10, 1), vec![0]);
        assert!(sample_indices(10, 0).is_empty());
        assert!(sample_indices(0, 4).is_empty());
        assert_eq!(sample_indices(4, 4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_load_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        let episode = dir.path().join("ep");
        std::fs::create_dir(&episode).unwrap();
        write_frame(&episode, "00002-rgb.png", 4, 4);
        write_frame(&episode, "00000-rgb.png", 4, 4);
        write_frame(&episode, "00001-depth.png", 4, 4);
        write_frame(&episode, "00001-rgb.png", 4, 4);

        let sequence = FrameSequence::load(dir.path(), "ep").unwrap();
        let names: Vec<_> = sequence
            .frames()
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["00000-rgb.png", "00001-rgb.png", "00002-rgb.png"]);

        let sampled = sequence.sample(2).unwrap();
        assert_eq!(sampled, vec![sequence.frames()[0].clone(), sequence.frames()[2].clone()]);
    }

    #[test]
    fn test_missing_or_empty_episode() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            FrameSequence::load(dir.path(), "nope"),
            Err(EvalError::EpisodeNotFound(_))
        ));

        std::fs::create_dir(dir.path().join("empty")).unwrap();
        let sequence = FrameSequence::load(dir.path(), "empty").unwrap();
        assert!(sequence.is_empty());
        assert!(matches!(sequence.sample(15), Err(EvalError::EpisodeNotFound(_))));
    }

    #[test]
    fn test_load_frames_scales_by_first_frame() {
        let dir = TempDir::new().unwrap();
        let a = write_frame(dir.path(), "a-rgb.png", 40, 20);
        let b = write_frame(dir.path(), "b-rgb.png", 20, 20);

        let frames = load_frames(&[a, b], 10).unwrap();
        assert_eq!(frames[0].dimensions(), (10, 5));
        assert_eq!(frames[1].dimensions(), (5, 5));
    }

    #[test]
    fn test_undecodable_frame() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad-rgb.png");
        std::fs::write(&path, b"not a png").unwrap();

        let err = load_frames(&[path.clone()], 10).unwrap_err();
        match err {
            EvalError::FrameDecode { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_data_url() {
        let frame = RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 0]));
        let url = to_data_url(&frame).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }
}
