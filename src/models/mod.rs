pub mod membership;
pub mod picture;
pub mod space;
