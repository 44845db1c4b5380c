pub mod google_oauth;
pub mod images;
pub mod tags;
