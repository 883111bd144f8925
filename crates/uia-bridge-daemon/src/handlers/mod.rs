pub mod common;
pub mod device;
pub mod elements;
pub mod find;
pub mod gestures;
