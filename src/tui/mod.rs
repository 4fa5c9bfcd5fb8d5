pub mod bindings;
pub mod input;
pub mod mode;
pub mod sky;
pub mod view;
