pub(crate) mod color;
pub(crate) mod template;
pub(crate) mod user;
