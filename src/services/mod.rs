//! Business logic services.

pub mod numbering;
pub mod session;
pub mod storage;
