//! Wire-level building blocks shared by transports, the provider server
//! loop, and the context renderers.

pub mod format;
pub mod protocol;
