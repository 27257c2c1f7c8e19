mod draft_reply;
mod drafter;
mod vision_drafter;

pub use draft_reply::DraftReply;
pub use drafter::ComplaintDrafter;
pub use vision_drafter::VisionDrafter;
