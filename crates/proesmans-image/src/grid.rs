use std::ops;

use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the extents of a grid, a picture or a flow field.
///
/// # Examples
///
/// ```
/// use proesmans_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// The number of pixels covered by the size.
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// The size of the next coarser pyramid level (each extent halved, rounding down).
    pub fn half(&self) -> ImageSize {
        ImageSize {
            width: self.width / 2,
            height: self.height / 2,
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// A dense two dimensional field of `f32` samples.
///
/// The samples are stored row-major in a single contiguous buffer, so the value
/// at column `x` and row `y` lives at `x + width * y`. Grids are indexed with
/// `(x, y)` tuples.
///
/// # Examples
///
/// ```
/// use proesmans_image::{Grid, ImageSize};
///
/// let mut grid = Grid::from_size_val(ImageSize { width: 3, height: 2 }, 0.0);
/// grid[(2, 1)] = 5.0;
///
/// assert_eq!(grid.as_slice()[5], 5.0);
/// assert_eq!(grid.get(2, 1), Some(&5.0));
/// assert_eq!(grid.get(3, 1), None);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    size: ImageSize,
    data: Vec<f32>,
}

impl Grid {
    /// Create a new grid from row-major sample data.
    ///
    /// # Arguments
    ///
    /// * `size` - The extents of the grid.
    /// * `data` - The samples, `size.width * size.height` of them.
    ///
    /// # Errors
    ///
    /// If the length of the data does not match the grid size, an error is returned.
    pub fn new(size: ImageSize, data: Vec<f32>) -> Result<Self, ImageError> {
        if data.len() != size.area() {
            return Err(ImageError::InvalidChannelShape(data.len(), size.area()));
        }

        Ok(Self { size, data })
    }

    /// Create a new grid with every sample set to `val`.
    pub fn from_size_val(size: ImageSize, val: f32) -> Self {
        Self {
            size,
            data: vec![val; size.area()],
        }
    }

    /// Create a new grid by evaluating `f(x, y)` at every position.
    ///
    /// ```
    /// use proesmans_image::{Grid, ImageSize};
    ///
    /// let ramp = Grid::from_fn(ImageSize { width: 4, height: 2 }, |x, _| x as f32);
    /// assert_eq!(ramp.as_slice(), &[0.0, 1.0, 2.0, 3.0, 0.0, 1.0, 2.0, 3.0]);
    /// ```
    pub fn from_fn(size: ImageSize, f: impl Fn(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(size.area());
        for y in 0..size.height {
            for x in 0..size.width {
                data.push(f(x, y));
            }
        }
        Self { size, data }
    }

    /// Get the size of the grid.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the grid.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the grid.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the sample at `(x, y)` or `None` if the position is outside the grid.
    pub fn get(&self, x: usize, y: usize) -> Option<&f32> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.data.get(x + self.size.width * y)
    }

    /// Get a mutable reference to the sample at `(x, y)` or `None` if the
    /// position is outside the grid.
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut f32> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        self.data.get_mut(x + self.size.width * y)
    }

    /// Get the samples as a row-major slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Get the samples as a mutable row-major slice.
    pub fn as_slice_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Check that `other` has the same extents as `self`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidImageSize`] naming both extents on mismatch.
    pub fn check_same_size(&self, other: &Grid) -> Result<(), ImageError> {
        if self.size != other.size {
            return Err(ImageError::InvalidImageSize(
                self.width(),
                self.height(),
                other.width(),
                other.height(),
            ));
        }
        Ok(())
    }
}

impl ops::Index<(usize, usize)> for Grid {
    type Output = f32;

    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        debug_assert!(x < self.size.width && y < self.size.height);
        &self.data[x + self.size.width * y]
    }
}

impl ops::IndexMut<(usize, usize)> for Grid {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut Self::Output {
        debug_assert!(x < self.size.width && y < self.size.height);
        &mut self.data[x + self.size.width * y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_new() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let grid = Grid::new(size, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])?;

        assert_eq!(grid.size(), size);
        assert_eq!(grid[(0, 1)], 3.0);
        assert_eq!(grid[(2, 0)], 2.0);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);

        Ok(())
    }

    #[test]
    fn test_grid_invalid_length() {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let res = Grid::new(size, vec![0.0; 5]);
        assert_eq!(res, Err(ImageError::InvalidChannelShape(5, 6)));
    }

    #[test]
    fn test_grid_get_out_of_bounds() {
        let mut grid = Grid::from_size_val([4, 4].into(), 1.0);
        assert_eq!(grid.get(3, 3), Some(&1.0));
        assert_eq!(grid.get(4, 0), None);
        assert_eq!(grid.get(0, 4), None);
        assert!(grid.get_mut(4, 4).is_none());

        if let Some(v) = grid.get_mut(1, 2) {
            *v = 7.0;
        }
        assert_eq!(grid[(1, 2)], 7.0);
    }

    #[test]
    fn test_grid_check_same_size() {
        let a = Grid::from_size_val([4, 3].into(), 0.0);
        let b = Grid::from_size_val([3, 4].into(), 0.0);
        assert!(a.check_same_size(&a.clone()).is_ok());
        assert_eq!(
            a.check_same_size(&b),
            Err(ImageError::InvalidImageSize(4, 3, 3, 4))
        );
    }

    #[test]
    fn test_image_size_half() {
        let size = ImageSize {
            width: 17,
            height: 8,
        };
        assert_eq!(size.half(), ImageSize::from([8, 4]));
        assert_eq!(size.area(), 136);
    }
}
