//! 9-patch image validation.
//!
//! A `.9.png` carries a one pixel border: black ticks on the top and left
//! mark stretchable regions, on the bottom and right the content padding.
//! Red ticks on the bottom and right mark optical layout bounds. Every other
//! border pixel must be transparent or white.

use std::ops::Range;

use image::{ImageFormat, RgbaImage};

/// Returns `true` for file names ending in `.9.png`.
pub fn is_nine_patch(file_name: &str) -> bool {
    file_name.to_ascii_lowercase().ends_with(".9.png")
}

/// Which border a problem was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Horizontal stretch markers.
    Top,
    /// Vertical stretch markers.
    Left,
    /// Horizontal padding markers.
    Bottom,
    /// Vertical padding markers.
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Side::Top => "top",
            Side::Left => "left",
            Side::Bottom => "bottom",
            Side::Right => "right",
        })
    }
}

/// Why an image is not a valid 9-patch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NinePatchError {
    /// Missing PNG signature.
    #[error("file is not a PNG image")]
    NotPng,
    /// The PNG could not be decoded.
    #[error("PNG image data is corrupt: {0}")]
    Corrupt(String),
    /// Smaller than 3x3.
    #[error("9-patch image is {width}x{height}, must be at least 3x3")]
    TooSmall {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// A border pixel is neither transparent, white, black, nor red.
    #[error("ticks in {side} border must be black or red (pixel {index})")]
    BadBorderPixel {
        /// Border side.
        side: Side,
        /// Pixel index along the border.
        index: u32,
    },
    /// A padding border has more than one run of ticks.
    #[error("padding ticks in {0} border must be contiguous")]
    PaddingNotContiguous(Side),
}

/// Stretch and padding regions of a valid 9-patch, in content coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NinePatchInfo {
    /// Full image width including the border.
    pub width: u32,
    /// Full image height including the border.
    pub height: u32,
    /// Horizontal stretch regions.
    pub stretch_x: Vec<Range<u32>>,
    /// Vertical stretch regions.
    pub stretch_y: Vec<Range<u32>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    None,
    Tick,
    Bounds,
}

/// Validates a 9-patch PNG.
pub fn validate_nine_patch(bytes: &[u8]) -> Result<NinePatchInfo, NinePatchError> {
    let image = decode(bytes)?;
    let (w, h) = image.dimensions();
    if w < 3 || h < 3 {
        return Err(NinePatchError::TooSmall { width: w, height: h });
    }
    let pixel = |x: u32, y: u32| image.get_pixel(x, y).0;
    let top: Vec<[u8; 4]> = (1..w - 1).map(|x| pixel(x, 0)).collect();
    let bottom: Vec<[u8; 4]> = (1..w - 1).map(|x| pixel(x, h - 1)).collect();
    let left: Vec<[u8; 4]> = (1..h - 1).map(|y| pixel(0, y)).collect();
    let right: Vec<[u8; 4]> = (1..h - 1).map(|y| pixel(w - 1, y)).collect();

    let info = NinePatchInfo {
        width: w,
        height: h,
        stretch_x: ticks(&classify(&top, Side::Top, false)?),
        stretch_y: ticks(&classify(&left, Side::Left, false)?),
    };
    for (pixels, side) in [(&bottom, Side::Bottom), (&right, Side::Right)] {
        if ticks(&classify(pixels, side, true)?).len() > 1 {
            return Err(NinePatchError::PaddingNotContiguous(side));
        }
    }
    Ok(info)
}

fn decode(bytes: &[u8]) -> Result<RgbaImage, NinePatchError> {
    if !matches!(image::guess_format(bytes), Ok(ImageFormat::Png)) {
        return Err(NinePatchError::NotPng);
    }
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map(|decoded| decoded.to_rgba8())
        .map_err(|e| NinePatchError::Corrupt(e.to_string()))
}

fn classify(pixels: &[[u8; 4]], side: Side, allow_bounds: bool) -> Result<Vec<Mark>, NinePatchError> {
    pixels
        .iter()
        .enumerate()
        .map(|(i, p)| match *p {
            [_, _, _, 0] | [255, 255, 255, 255] => Ok(Mark::None),
            [0, 0, 0, 255] => Ok(Mark::Tick),
            [255, 0, 0, 255] if allow_bounds => Ok(Mark::Bounds),
            _ => Err(NinePatchError::BadBorderPixel {
                side,
                index: i as u32 + 1,
            }),
        })
        .collect()
}

fn ticks(marks: &[Mark]) -> Vec<Range<u32>> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, mark) in marks.iter().chain(std::iter::once(&Mark::None)).enumerate() {
        match (mark, start) {
            (Mark::Tick, None) => start = Some(i as u32),
            (Mark::Tick, Some(_)) => {}
            (_, Some(s)) => {
                runs.push(s..i as u32);
                start = None;
            }
            (_, None) => {}
        }
    }
    runs
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder, Rgba};

    /// Encodes an RGBA8 image.
    pub(crate) fn encode_rgba(width: u32, height: u32, pixel: impl Fn(u32, u32) -> [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_fn(width, height, |x, y| Rgba(pixel(x, y)));
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
            .unwrap();
        out
    }

    const CLEAR: [u8; 4] = [0, 0, 0, 0];
    const BLACK: [u8; 4] = [0, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];

    /// A valid 5x5 9-patch stretching the middle pixel both ways.
    pub(crate) fn valid_nine_patch() -> Vec<u8> {
        encode_rgba(5, 5, |x, y| {
            let border = x == 0 || y == 0 || x == 4 || y == 4;
            if !border {
                return [0, 0, 255, 255];
            }
            if (y == 0 || x == 0) && (x == 2 || y == 2) {
                BLACK
            } else {
                CLEAR
            }
        })
    }

    #[test]
    fn detects_nine_patch_names() {
        assert!(is_nine_patch("Image.9.png"));
        assert!(is_nine_patch("image.9.png"));
        assert!(!is_nine_patch("image.png"));
    }

    #[test]
    fn valid_image_reports_stretch_regions() {
        let info = validate_nine_patch(&valid_nine_patch()).unwrap();
        assert_eq!((info.width, info.height), (5, 5));
        assert_eq!(info.stretch_x, vec![1..2]);
        assert_eq!(info.stretch_y, vec![1..2]);
    }

    #[test]
    fn not_png() {
        assert_eq!(validate_nine_patch(b"GIF89a"), Err(NinePatchError::NotPng));
    }

    #[test]
    fn truncated_png_is_corrupt() {
        let png = valid_nine_patch();
        assert!(matches!(
            validate_nine_patch(&png[..png.len() / 2]),
            Err(NinePatchError::Corrupt(_))
        ));
    }

    #[test]
    fn too_small() {
        let png = encode_rgba(2, 2, |_, _| CLEAR);
        assert_eq!(
            validate_nine_patch(&png),
            Err(NinePatchError::TooSmall { width: 2, height: 2 })
        );
    }

    #[test]
    fn colored_border_pixel_is_rejected() {
        let png = encode_rgba(5, 5, |x, y| if y == 0 && x == 3 { GREEN } else { CLEAR });
        assert_eq!(
            validate_nine_patch(&png),
            Err(NinePatchError::BadBorderPixel {
                side: Side::Top,
                index: 3
            })
        );
    }

    #[test]
    fn split_padding_is_rejected() {
        let png = encode_rgba(7, 5, |x, y| {
            if y == 4 && (x == 1 || x == 4) {
                BLACK
            } else {
                CLEAR
            }
        });
        assert_eq!(
            validate_nine_patch(&png),
            Err(NinePatchError::PaddingNotContiguous(Side::Bottom))
        );
    }

    #[test]
    fn layout_bounds_allowed_on_bottom() {
        let png = encode_rgba(5, 5, |x, y| if y == 4 && x == 1 { [255, 0, 0, 255] } else { CLEAR });
        assert!(validate_nine_patch(&png).is_ok());
    }
}
