pub mod error;
pub mod frame;
pub mod interval;
pub mod observation;
