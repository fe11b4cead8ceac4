//! Perceptual-hash detector: normalized Hamming distance between DCT mean
//! hashes of consecutive frames, 0 for identical and 1 for fully different.

use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, RgbImage};
use image_hasher::{HashAlg, Hasher, HasherConfig, ImageHash};
use log::debug;

use super::{ContentChangeDetector, score_consecutive_frames};
use crate::error::{CoreResult, invalid};
use crate::external::FrameSource;
use crate::series::ContentChangeSeries;

/// Side length of the hash grid in bits.
const HASH_SIZE: u32 = 16;

fn build_hasher() -> Hasher {
    HasherConfig::new()
        .hash_alg(HashAlg::Mean)
        .preproc_dct()
        .hash_size(HASH_SIZE, HASH_SIZE)
        .to_hasher()
}

/// Hamming distance divided by the number of hash bits.
pub fn normalized_hash_distance(a: &ImageHash, b: &ImageHash) -> f64 {
    let bits = a.as_bytes().len() * 8;
    if bits == 0 {
        return 0.0;
    }
    f64::from(a.dist(b)) / bits as f64
}

/// Scores consecutive decoded frames by perceptual-hash distance.
#[derive(Clone)]
pub struct PerceptualHashDetector {
    source: Arc<dyn FrameSource>,
    frame_rate: f64,
}

impl PerceptualHashDetector {
    pub fn new(source: Arc<dyn FrameSource>, frame_rate: f64) -> CoreResult<Self> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(invalid(format!("frame rate must be positive, got {frame_rate}")));
        }
        Ok(Self { source, frame_rate })
    }
}

impl ContentChangeDetector for PerceptualHashDetector {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn produce(&self, video: &Path) -> CoreResult<ContentChangeSeries> {
        let hasher = build_hasher();
        let hash_of = |image: &RgbImage| hasher.hash_image(&DynamicImage::ImageRgb8(image.clone()));

        let mut previous_hash: Option<ImageHash> = None;
        let scores = score_consecutive_frames(self.source.as_ref(), video, |_, current| {
            let hash = hash_of(current);
            let score = previous_hash
                .as_ref()
                .map_or(0.0, |prev| normalized_hash_distance(prev, &hash));
            previous_hash = Some(hash);
            score
        })?;

        debug!("hash: {} frames from {}", scores.len(), video.display());
        ContentChangeSeries::from_scores(&scores, self.frame_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::mocks::MockFrameSource;
    use image::Rgb;

    fn split_frame(width: u32, height: u32, left: [u8; 3], right: [u8; 3]) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 { Rgb(left) } else { Rgb(right) }
        })
    }

    #[test]
    fn test_identical_frames_score_zero() {
        let frame = split_frame(32, 32, [0, 0, 0], [255, 255, 255]);
        let source = MockFrameSource::new(vec![frame.clone(), frame], 10.0);
        let series = PerceptualHashDetector::new(Arc::new(source), 10.0)
            .unwrap()
            .produce(Path::new("mock.mp4"))
            .unwrap();
        assert_eq!(series.scores(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_scores_are_normalized() {
        let a = split_frame(32, 32, [0, 0, 0], [255, 255, 255]);
        let b = split_frame(32, 32, [255, 255, 255], [0, 0, 0]);
        let source = MockFrameSource::new(vec![a.clone(), b, a], 10.0);
        let series = PerceptualHashDetector::new(Arc::new(source), 10.0)
            .unwrap()
            .produce(Path::new("mock.mp4"))
            .unwrap();
        let scores = series.scores();
        assert_eq!(scores[0], 0.0);
        assert!(scores[1] > 0.0 && scores[1] <= 1.0);
        assert!(scores[2] > 0.0 && scores[2] <= 1.0);
    }
}
