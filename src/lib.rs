pub mod config;
pub mod db;
pub mod drive;
pub mod error;
pub mod google_oauth;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;
pub mod types;

pub use error::OukaError;
pub use service::catalog::ImageCatalog;
