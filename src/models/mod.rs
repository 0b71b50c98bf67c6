pub mod params;
pub mod record;
pub mod size;
pub mod style;

pub use params::*;
pub use record::*;
pub use size::*;
pub use style::*;
