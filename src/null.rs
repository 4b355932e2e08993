//! Null measurement backend — measurement compiled out.

use crate::error::{MeasureError, MeasureResult};
use crate::image::Image;
use crate::log::logger::log_warn;
use crate::measure::Measure;

#[derive(Debug, Default, Clone, Copy)]
pub struct NullMeasure;

impl Measure for NullMeasure {
    const NAME: &'static str = "null";

    fn measure_image(&mut self, _image: &Image<'_>) -> MeasureResult {
        log_warn("measure", "cannot measure image; not implemented");
        Err(MeasureError::NotSupported)
    }
}
