pub mod validate;
pub mod view;

pub use validate::validate;
pub use view::view;
