use crate::error::ImageError;
use crate::grid::{Grid, ImageSize};

/// Scale applied to raw byte samples to obtain normalized intensities.
pub const INTENSITY_SCALE: f32 = 1.0 / 256.0;

/// A colour picture made of three co-registered intensity grids.
///
/// Single channel inputs are broadcast to all three channels on construction, so
/// the processing code never needs to special-case grayscale frames.
#[derive(Clone, Debug, PartialEq)]
pub struct Picture {
    channels: [Grid; 3],
}

impl Picture {
    /// Create a picture from three channel grids.
    ///
    /// # Errors
    ///
    /// If the three grids do not share the same extents, an error is returned.
    pub fn from_channels(r: Grid, g: Grid, b: Grid) -> Result<Self, ImageError> {
        r.check_same_size(&g)?;
        r.check_same_size(&b)?;
        Ok(Self {
            channels: [r, g, b],
        })
    }

    /// Create a picture with every channel set to `val`.
    pub fn from_size_val(size: ImageSize, val: f32) -> Self {
        let grid = Grid::from_size_val(size, val);
        Self {
            channels: [grid.clone(), grid.clone(), grid],
        }
    }

    /// Create a picture from planar byte samples.
    ///
    /// The sample of channel `c` at `(x, y)` is read from
    /// `samples[x + width * y + width * height * c]` and scaled by
    /// [`INTENSITY_SCALE`]. With one or two host channels the first plane feeds all
    /// three channels; with three or more the first three planes are used.
    ///
    /// # Arguments
    ///
    /// * `samples` - The planar samples, `width * height * num_channels` of them.
    /// * `size` - The size of the picture.
    /// * `num_channels` - The number of host planes in `samples`.
    ///
    /// # Errors
    ///
    /// Fails when `num_channels` is zero or the sample count does not match.
    ///
    /// # Examples
    ///
    /// ```
    /// use proesmans_image::{ImageSize, Picture};
    ///
    /// let size = ImageSize { width: 2, height: 1 };
    /// let picture = Picture::from_planar_u8(&[0, 128], size, 1).unwrap();
    ///
    /// assert_eq!(picture.r()[(1, 0)], 0.5);
    /// assert_eq!(picture.b()[(1, 0)], 0.5);
    /// ```
    pub fn from_planar_u8(
        samples: &[u8],
        size: ImageSize,
        num_channels: usize,
    ) -> Result<Self, ImageError> {
        check_samples(samples, size, num_channels)?;

        let plane = |c: usize| -> Result<Grid, ImageError> {
            let offset = size.area() * source_channel(c, num_channels);
            let data = samples[offset..offset + size.area()]
                .iter()
                .map(|&s| s as f32 * INTENSITY_SCALE)
                .collect();
            Grid::new(size, data)
        };

        Self::from_channels(plane(0)?, plane(1)?, plane(2)?)
    }

    /// Create a picture from pixel-interleaved byte samples, as produced by
    /// image decoders.
    ///
    /// The sample of channel `c` at `(x, y)` is read from
    /// `samples[(x + width * y) * num_channels + c]`. The channel broadcast rules
    /// are the same as for [`Picture::from_planar_u8`].
    pub fn from_interleaved_u8(
        samples: &[u8],
        size: ImageSize,
        num_channels: usize,
    ) -> Result<Self, ImageError> {
        check_samples(samples, size, num_channels)?;

        let plane = |c: usize| -> Result<Grid, ImageError> {
            let offset = source_channel(c, num_channels);
            let data = samples
                .chunks_exact(num_channels)
                .map(|pixel| pixel[offset] as f32 * INTENSITY_SCALE)
                .collect();
            Grid::new(size, data)
        };

        Self::from_channels(plane(0)?, plane(1)?, plane(2)?)
    }

    /// Convert the picture back to three planar byte planes.
    ///
    /// This is the inverse of [`Picture::from_planar_u8`] with three channels;
    /// intensities are rescaled, rounded and clamped to `0..=255`.
    pub fn to_planar_u8(&self) -> Vec<u8> {
        self.channels
            .iter()
            .flat_map(|grid| grid.as_slice().iter())
            .map(|&v| (v / INTENSITY_SCALE).round().clamp(0.0, 255.0) as u8)
            .collect()
    }

    /// Get the size of the picture.
    pub fn size(&self) -> ImageSize {
        self.channels[0].size()
    }

    /// Get the width of the picture.
    pub fn width(&self) -> usize {
        self.channels[0].width()
    }

    /// Get the height of the picture.
    pub fn height(&self) -> usize {
        self.channels[0].height()
    }

    /// Get the red channel.
    pub fn r(&self) -> &Grid {
        &self.channels[0]
    }

    /// Get the green channel.
    pub fn g(&self) -> &Grid {
        &self.channels[1]
    }

    /// Get the blue channel.
    pub fn b(&self) -> &Grid {
        &self.channels[2]
    }

    /// Get the three channels in `[r, g, b]` order.
    pub fn channels(&self) -> &[Grid; 3] {
        &self.channels
    }

    /// Check that `other` has the same extents as `self`.
    pub fn check_same_size(&self, other: &Picture) -> Result<(), ImageError> {
        self.channels[0].check_same_size(&other.channels[0])
    }
}

fn check_samples(samples: &[u8], size: ImageSize, num_channels: usize) -> Result<(), ImageError> {
    if num_channels == 0 {
        return Err(ImageError::InvalidChannelCount(num_channels));
    }

    let expected = size.area() * num_channels;
    if samples.len() != expected {
        return Err(ImageError::InvalidChannelShape(samples.len(), expected));
    }

    Ok(())
}

// grayscale and grayscale + alpha inputs read every channel from the first plane
fn source_channel(c: usize, num_channels: usize) -> usize {
    if num_channels > 2 {
        c
    } else {
        0
    }
}
