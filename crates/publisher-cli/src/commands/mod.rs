pub(crate) mod check;
pub(crate) mod connections;
pub(crate) mod ui;
