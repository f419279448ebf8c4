pub mod avatar;
pub mod session;

pub use avatar::{Avatar, AvatarListing, NewAvatar, PLACEHOLDER_IMAGE_URL};
pub use session::{SessionAvatar, SessionWithAvatar};
