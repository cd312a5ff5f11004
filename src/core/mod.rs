// Domain-layer modules and shared errors
pub mod events {
    pub use crate::events::*;
}

pub mod fields {
    pub use crate::fields::*;
}

pub mod outcome {
    pub use crate::outcome::*;
}

pub mod errors {
    pub use crate::errors::*;
}
