pub mod get_pending_regions;
pub mod recognize_image;
pub mod resolve_region;
