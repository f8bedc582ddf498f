pub mod image;
pub mod store;

pub use image::{ImageFormat, PreparedImage, decode_image, prepare_image, sniff_mime_type, to_data_url};
pub use store::{UploadStore, generate_filename, is_local_upload};
