pub mod find;
pub mod partition;
