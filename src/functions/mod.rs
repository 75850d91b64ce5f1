pub mod gaussian;
pub mod sampling;
pub mod mosaic;

pub use self::gaussian::*;
pub use self::sampling::*;
pub use self::mosaic::*;
