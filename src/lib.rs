mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod migrate;
    pub mod schema;
}
mod authentication {
    pub mod cryptography;
}
mod constants;

mod media {
    pub mod store;
}

pub use authentication::*;
pub use constants::*;
pub use database::*;
pub use media::store::*;
