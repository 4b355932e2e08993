//! Measurement API — backend contract and build-time selection.
//!
//! Exactly one backend answers [`measure_image`]. The choice is a Cargo
//! feature resolved into the [`ActiveMeasure`] type alias, so the call is
//! a direct, inlinable call with no vtable. Both backends are always
//! compiled; only the selected one is reachable through this entry point.
//!
//! | features        | active backend |
//! |-----------------|----------------|
//! | `measure-efi`   | [`EfiMeasure`](crate::efi::EfiMeasure) |
//! | `measure-null`  | [`NullMeasure`] |
//! | neither         | [`NullMeasure`] |

use uefi::table::boot::BootServices;

use crate::error::MeasureResult;
use crate::image::Image;
#[allow(unused_imports)]
use crate::null::NullMeasure;

/// Contract every measurement backend implements.
pub trait Measure {
    /// Backend name, for diagnostics.
    const NAME: &'static str;

    /// Record `image` in the platform trust anchor before it runs.
    fn measure_image(&mut self, image: &Image<'_>) -> MeasureResult;
}

#[cfg(all(feature = "measure-efi", feature = "measure-null"))]
compile_error!("features `measure-efi` and `measure-null` are mutually exclusive");

cfg_if::cfg_if! {
    if #[cfg(feature = "measure-efi")] {
        use crate::efi::firmware::{BootPool, FirmwareTcg, FirmwareTcg2};

        /// Backend selected at build time.
        pub type ActiveMeasure<'fw> =
            crate::efi::EfiMeasure<FirmwareTcg2<'fw>, FirmwareTcg<'fw>, BootPool<'fw>>;

        /// Resolve the active backend's firmware state once per boot.
        pub fn probe(bs: &BootServices) -> ActiveMeasure<'_> {
            crate::efi::firmware::probe(bs)
        }
    } else {
        /// Backend selected at build time.
        pub type ActiveMeasure<'fw> = NullMeasure;

        /// Resolve the active backend's firmware state once per boot.
        pub fn probe(_bs: &BootServices) -> ActiveMeasure<'_> {
            NullMeasure
        }
    }
}

/// Measure `image` with the backend selected at build time.
#[inline]
pub fn measure_image(active: &mut ActiveMeasure<'_>, image: &Image<'_>) -> MeasureResult {
    active.measure_image(image)
}
