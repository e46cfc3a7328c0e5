pub mod operations;
pub mod v1;
