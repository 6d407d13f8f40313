pub mod display;
pub mod history;
pub mod projection;
pub mod puzzle;
pub mod render;
pub mod session;
pub mod source;
pub mod theme;
