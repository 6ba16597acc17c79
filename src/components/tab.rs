mod tab_bar;
mod tab_item;

pub use tab_bar::TabBar;
