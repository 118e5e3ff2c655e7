mod app;
mod cleanup;
mod health;

pub use app::app;
