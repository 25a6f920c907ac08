pub mod camera;
pub mod config;
pub mod engine;
pub mod focus;
pub mod gesture;
pub mod idle;
pub mod loader;
pub mod surface;

pub use camera::*;
pub use config::*;
pub use engine::*;
pub use focus::*;
pub use gesture::*;
pub use idle::*;
pub use loader::*;
pub use surface::*;
