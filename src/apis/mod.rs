pub mod cover;
pub mod knv;
