pub mod feed;
pub mod filing;
pub mod news;
pub mod paper;
pub mod video;
pub mod web_page;
