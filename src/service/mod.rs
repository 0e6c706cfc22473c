pub(crate) mod collab;
pub(crate) mod job;
pub(crate) mod pool;
pub(crate) mod renderer;
