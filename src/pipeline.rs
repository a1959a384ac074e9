use image::{imageops::FilterType, RgbImage};
use ndarray::{Array, Ix4};
use std::io::Cursor;
use thiserror::Error;

/// Spatial resolution the model was trained on. Inputs are stretched to
/// this square regardless of aspect ratio so the input shape stays
/// constant.
pub const INPUT_SIZE: u32 = 256;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has zero width or height")]
    InvalidDimensions,
}

/// Decodes an uploaded byte buffer into an 8-bit RGB pixel grid. The
/// container format is guessed from the bytes themselves, not from any
/// declared content type.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, PipelineError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?;

    let decoded = reader.decode()?;

    // Normalizes whatever channel layout the decoder produced to RGB,
    // the ordering the model was trained on.
    Ok(decoded.to_rgb8())
}

/// Resizes to INPUT_SIZE x INPUT_SIZE with bilinear interpolation, scales
/// intensities into [0.0, 1.0] and adds a leading batch dimension,
/// yielding a (1, 256, 256, 3) NHWC tensor.
pub fn preprocess(image: &RgbImage) -> Result<Array<f32, Ix4>, PipelineError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PipelineError::InvalidDimensions);
    }

    let resized = image::imageops::resize(image, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let size = INPUT_SIZE as usize;
    let mut input = Array::zeros((1, size, size, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        input[[0, y as usize, x as usize, 0]] = (r as f32) / 255.;
        input[[0, y as usize, x as usize, 1]] = (g as f32) / 255.;
        input[[0, y as usize, x as usize, 2]] = (b as f32) / 255.;
    }

    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
        let img = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(width, height, Rgb(color));
        let mut bytes: Vec<u8> = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn decodes_valid_png() {
        let bytes = png_bytes(64, 48, [255, 200, 0]);
        let image = decode_image(&bytes).unwrap();
        assert_eq!(image.dimensions(), (64, 48));
        assert_eq!(image.get_pixel(0, 0).0, [255, 200, 0]);
    }

    #[test]
    fn rejects_garbage_bytes() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(result, Err(PipelineError::Decode(_))));
    }

    #[test]
    fn preprocess_produces_batched_nhwc_tensor() {
        let image = ImageBuffer::from_pixel(100, 40, Rgb([128, 64, 255]));
        let tensor = preprocess(&image).unwrap();

        assert_eq!(tensor.shape(), &[1, 256, 256, 3]);
        for &value in tensor.iter() {
            assert!((0.0..=1.0).contains(&value));
        }
        // Uniform source image survives resizing untouched.
        assert!((tensor[[0, 0, 0, 0]] - 128. / 255.).abs() < f32::EPSILON);
        assert!((tensor[[0, 128, 128, 2]] - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn preprocess_is_deterministic() {
        let bytes = png_bytes(173, 91, [13, 200, 77]);
        let image = decode_image(&bytes).unwrap();

        let first = preprocess(&image).unwrap();
        let second = preprocess(&image).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn preprocess_rejects_empty_image() {
        let image = RgbImage::new(0, 0);
        let result = preprocess(&image);
        assert!(matches!(result, Err(PipelineError::InvalidDimensions)));
    }
}
