pub mod geo;
pub mod mat4;
pub mod quat;
pub mod sphere;
pub mod vec;

pub use geo::*;
pub use mat4::*;
pub use quat::*;
pub use sphere::*;
pub use vec::*;
