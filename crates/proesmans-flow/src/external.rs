use num_traits::Float;
use proesmans_image::{Grid, ImageSize};

use crate::{error::FlowError, flow::Flow};

/// Build a flow from a host array of two stacked planes.
///
/// The array holds the `u` plane followed by the `v` plane, each row-major:
/// `raw[x + width * y]` is `u` and `raw[x + width * y + width * height]` is `v`.
///
/// Flows are stored as `f32`. An `f32` host array round-trips exactly through
/// [`flow_to_external`]; wider host types such as `f64` are rounded to the
/// nearest `f32`, so their round trip only holds to within `f32` precision
/// (a relative error of at most `f32::EPSILON / 2`).
///
/// # Arguments
///
/// * `raw` - The host samples, `2 * width * height` of them.
/// * `size` - The size of the flow.
///
/// # Errors
///
/// Fails when the array length does not match the size or a value cannot be cast.
///
/// # Examples
///
/// ```
/// use proesmans_flow::external::flow_from_external;
/// use proesmans_image::ImageSize;
///
/// let size = ImageSize { width: 2, height: 1 };
/// let flow = flow_from_external(&[1.0f64, 2.0, -1.0, -2.0], size).unwrap();
///
/// assert_eq!(flow.at(1, 0), (2.0, -2.0));
/// ```
pub fn flow_from_external<T: Float>(raw: &[T], size: ImageSize) -> Result<Flow, FlowError> {
    let plane_len = size.area();
    if raw.len() != 2 * plane_len {
        return Err(FlowError::InvalidFlowShape(raw.len(), 2 * plane_len));
    }

    let to_f32 = |plane: &[T]| -> Result<Vec<f32>, FlowError> {
        plane
            .iter()
            .map(|x| {
                x.to_f32()
                    .ok_or_else(|| FlowError::CastError(std::any::type_name::<f32>().to_string()))
            })
            .collect()
    };

    let (raw_u, raw_v) = raw.split_at(plane_len);
    let u = Grid::new(size, to_f32(raw_u)?)?;
    let v = Grid::new(size, to_f32(raw_v)?)?;

    Flow::from_components(u, v)
}

/// Flatten a flow into a host array of two stacked planes.
///
/// This is the inverse of [`flow_from_external`], exact for `f32` hosts.
pub fn flow_to_external<T: Float>(flow: &Flow) -> Result<Vec<T>, FlowError> {
    flow.u()
        .as_slice()
        .iter()
        .chain(flow.v().as_slice().iter())
        .map(|&x| {
            <T as num_traits::NumCast>::from(x)
                .ok_or_else(|| FlowError::CastError(std::any::type_name::<T>().to_string()))
        })
        .collect()
}
