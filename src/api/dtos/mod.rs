pub mod envelope;
pub mod todo;
