pub mod ssrf_validation;

pub use ssrf_validation::{validate_image_url, UrlRejection};
