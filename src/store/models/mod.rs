mod image;
mod user;
mod video;

pub use image::{Image, ImageDto, NewImage};
pub use user::User;
pub use video::{NewVideo, Video, VideoDto};
