pub mod form;
pub mod messages;
pub mod template_model;

pub use messages::*;
pub use template_model::*;
