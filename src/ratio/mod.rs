pub mod matcher;
pub mod probe;

pub use matcher::{closest_in, ratio_to_resolution, select_closest_ratio, Ratio, GEMINI_RATIOS, STANDARD_RATIOS};
pub use probe::{image_dimensions, ratio_from_image};
