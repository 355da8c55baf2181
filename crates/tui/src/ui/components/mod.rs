pub mod card;
pub mod charts;
pub mod tabs;
pub mod toast;
