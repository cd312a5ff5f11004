//! External service integrations.

pub mod transport {
    pub use crate::transport::*;
}

pub mod endpoint {
    pub use crate::endpoint::*;
}
