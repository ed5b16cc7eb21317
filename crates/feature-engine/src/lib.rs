//! Feature Engineering Engine
//!
//! Turns validated telemetry into the fixed-order single-row feature frame
//! the trained models expect.

mod features;
mod frame;

pub use features::{
    brand_column, title_case, DerivedFeatures, FeatureAssembler, BRAND_PREFIX, KM_PER_YEAR,
    TEMP_DIFFERENCE,
};
pub use frame::FeatureFrame;
