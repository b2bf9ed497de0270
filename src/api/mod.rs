pub mod api;
mod dtos;
pub(crate) mod errors;
mod middlewares;
mod state;
mod system_handler;
mod todos_handler;
