pub mod layer;
pub mod lines;
pub mod palette;
pub mod raster;
pub mod starfield;
pub mod symbology;
pub mod texture;

pub use layer::*;
pub use lines::*;
pub use palette::*;
pub use raster::*;
pub use starfield::*;
pub use symbology::*;
pub use texture::*;
