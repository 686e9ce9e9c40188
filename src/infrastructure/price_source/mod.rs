//! Price source implementations

pub mod tankerkoenig;

pub use tankerkoenig::TankerkoenigClient;
