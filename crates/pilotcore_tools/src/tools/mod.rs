pub mod click;
pub mod drag_and_drop;
pub mod key;
pub mod scroll;
pub mod type_tool;
pub mod wait;
