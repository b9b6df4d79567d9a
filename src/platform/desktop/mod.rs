mod image_export;
mod main_loop;

pub use main_loop::start;
