pub(crate) mod blend;
pub(crate) mod catalog;
pub(crate) mod ease;
pub(crate) mod resolve;
