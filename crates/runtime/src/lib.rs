pub mod debounce;
pub mod event_bus;
pub mod frame;

pub use debounce::*;
pub use event_bus::*;
pub use frame::*;
