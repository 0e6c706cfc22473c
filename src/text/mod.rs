pub(crate) mod font;
pub(crate) mod layout;
