//! # Services Layer
//!
//! Background work used by the view models: catalog searches, image loading
//! and the image byte cache. Services own their channels so results are
//! applied on the controller's thread.

pub mod catalog;
pub mod image;
pub mod image_cache;

pub use catalog::{
    CatalogClient, CatalogResponse, CatalogService, FetchError, HttpCatalogClient,
    ProductsRequest,
};
pub use image::{ImageLoad, ImageResponse, ImageService};
pub use image_cache::{ImageCache, SharedImageCache};
