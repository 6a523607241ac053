//! Equirectangular Radiance HDR environment maps

use image::ImageFormat;

use crate::assets::source::AssetSource;
use crate::error::LoadError;

/// Decoded environment map, linear RGBA floats in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentMap {
    pub locator: String,
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl EnvironmentMap {
    /// Texel at (x, y) as RGBA
    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let offset = ((y * self.width + x) * 4) as usize;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }

    /// Halves the resolution with a 2x2 box filter until both sides fit
    /// within `max_dimension`
    pub fn fit_within(mut self, max_dimension: u32) -> Self {
        while (self.width > max_dimension || self.height > max_dimension)
            && self.width > 1
            && self.height > 1
        {
            self = self.halved();
        }
        self
    }

    fn halved(&self) -> Self {
        let width = self.width / 2;
        let height = self.height / 2;
        let mut data = Vec::with_capacity((width * height * 4) as usize);

        for y in 0..height {
            for x in 0..width {
                let samples = [
                    self.texel(2 * x, 2 * y),
                    self.texel(2 * x + 1, 2 * y),
                    self.texel(2 * x, 2 * y + 1),
                    self.texel(2 * x + 1, 2 * y + 1),
                ];
                for channel in 0..4 {
                    data.push(samples.iter().map(|s| s[channel]).sum::<f32>() / 4.0);
                }
            }
        }

        Self {
            locator: self.locator.clone(),
            width,
            height,
            data,
        }
    }
}

/// Fetches and decodes the environment map at `locator`
pub fn load_environment(
    source: &dyn AssetSource,
    locator: &str,
) -> Result<EnvironmentMap, LoadError> {
    let bytes = source
        .read(locator)
        .map_err(|err| LoadError::environment(locator, err))?;
    decode_environment(locator, &bytes)
}

pub fn decode_environment(locator: &str, bytes: &[u8]) -> Result<EnvironmentMap, LoadError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Hdr)
        .map_err(|err| LoadError::environment(locator, err))?;

    let rgba = image.into_rgba32f();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(LoadError::environment(locator, "environment map is empty"));
    }

    Ok(EnvironmentMap {
        locator: locator.to_string(),
        width,
        height,
        data: rgba.into_raw(),
    })
}
