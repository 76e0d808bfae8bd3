pub mod gallery_item;
pub mod positioned;
pub mod track_items;

pub use gallery_item::*;
pub use positioned::*;
pub use track_items::*;
