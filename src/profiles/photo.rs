use std::{fs, path::Path};

use image::codecs::jpeg::JpegEncoder;

pub(crate) const MAX_PHOTO_BYTES: u64 = 100_000;

// quality steps tried in order; once exhausted we give up rather than
// re-encoding forever
const QUALITY_STEPS: [u8; 4] = [50, 35, 20, 10];

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    AlreadySmall,
    Compressed { bytes: u64 },
    CannotCompress { bytes: u64 },
}

/// Re-encodes the image at `path` as JPEG at decreasing quality until it
/// fits in `max_bytes`, with a bounded number of attempts.
pub(crate) fn compress(path: &Path, max_bytes: u64) -> anyhow::Result<Outcome> {
    let mut size = fs::metadata(path)?.len();
    if size <= max_bytes {
        return Ok(Outcome::AlreadySmall);
    }

    for quality in QUALITY_STEPS {
        let img = image::open(path)?.to_rgb8();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&img)?;
        fs::write(path, &buf)?;

        size = buf.len() as u64;
        if size <= max_bytes {
            return Ok(Outcome::Compressed { bytes: size });
        }
    }

    Ok(Outcome::CannotCompress { bytes: size })
}
