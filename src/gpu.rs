pub(crate) mod device;
pub(crate) mod guard;
pub(crate) mod shader;
pub(crate) mod software;
