pub mod feature;
pub mod feature_index;
pub mod picking;
pub mod selection;

pub use feature::*;
pub use feature_index::*;
pub use picking::*;
pub use selection::*;
