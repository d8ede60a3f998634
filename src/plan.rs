pub(crate) mod aliases;
pub(crate) mod colors;
pub(crate) mod defaults;
pub(crate) mod fonts;
pub(crate) mod planner;
pub(crate) mod timing;
