use proesmans_image::{Grid, ImageSize};

use crate::error::FlowError;

/// A dense displacement field.
///
/// `u` holds the horizontal and `v` the vertical displacement, in pixels, of
/// every position. Both components always share the same extents.
#[derive(Clone, Debug, PartialEq)]
pub struct Flow {
    u: Grid,
    v: Grid,
}

impl Flow {
    /// Create a flow with zero displacement everywhere.
    pub fn zeros(size: ImageSize) -> Self {
        Self::from_size_val(size, 0.0, 0.0)
    }

    /// Create a flow with the constant displacement `(u, v)` everywhere.
    pub fn from_size_val(size: ImageSize, u: f32, v: f32) -> Self {
        Self {
            u: Grid::from_size_val(size, u),
            v: Grid::from_size_val(size, v),
        }
    }

    /// Create a flow from its two components.
    ///
    /// # Errors
    ///
    /// If `u` and `v` do not share the same extents, an error is returned.
    pub fn from_components(u: Grid, v: Grid) -> Result<Self, FlowError> {
        u.check_same_size(&v)?;
        Ok(Self { u, v })
    }

    /// Get the size of the flow.
    pub fn size(&self) -> ImageSize {
        self.u.size()
    }

    /// Get the width of the flow.
    pub fn width(&self) -> usize {
        self.u.width()
    }

    /// Get the height of the flow.
    pub fn height(&self) -> usize {
        self.u.height()
    }

    /// Get the horizontal component.
    pub fn u(&self) -> &Grid {
        &self.u
    }

    /// Get the vertical component.
    pub fn v(&self) -> &Grid {
        &self.v
    }

    /// Get the displacement at `(x, y)`.
    pub fn at(&self, x: usize, y: usize) -> (f32, f32) {
        (self.u[(x, y)], self.v[(x, y)])
    }

    /// Set the displacement at `(x, y)`.
    pub fn set(&mut self, x: usize, y: usize, (u, v): (f32, f32)) {
        self.u[(x, y)] = u;
        self.v[(x, y)] = v;
    }

    /// Get mutable access to both components at once.
    pub fn components_mut(&mut self) -> (&mut Grid, &mut Grid) {
        (&mut self.u, &mut self.v)
    }

    /// Split the flow into its `(u, v)` components.
    pub fn into_components(self) -> (Grid, Grid) {
        (self.u, self.v)
    }

    /// Check that the flow has the extents `size`.
    pub fn check_size(&self, size: ImageSize) -> Result<(), FlowError> {
        if self.size() != size {
            return Err(FlowError::FlowSizeMismatch {
                expected: size,
                actual: self.size(),
            });
        }
        Ok(())
    }
}

/// A forward (frame 1 to frame 2) and reverse (frame 2 to frame 1) flow pair.
#[derive(Clone, Debug, PartialEq)]
pub struct TwinFlow {
    /// The flow from the first frame to the second.
    pub forward: Flow,
    /// The flow from the second frame to the first.
    pub reverse: Flow,
}

impl TwinFlow {
    /// Pair a forward and a reverse flow.
    ///
    /// # Errors
    ///
    /// If the two flows do not share the same extents, an error is returned.
    pub fn new(forward: Flow, reverse: Flow) -> Result<Self, FlowError> {
        reverse.check_size(forward.size())?;
        Ok(Self { forward, reverse })
    }

    /// Create a pair of zero flows.
    pub fn zeros(size: ImageSize) -> Self {
        Self {
            forward: Flow::zeros(size),
            reverse: Flow::zeros(size),
        }
    }

    /// Get the size shared by both flows.
    pub fn size(&self) -> ImageSize {
        self.forward.size()
    }

    /// Check that both flows have the extents `size`.
    pub fn check_size(&self, size: ImageSize) -> Result<(), FlowError> {
        self.forward.check_size(size)?;
        self.reverse.check_size(size)
    }
}
