pub mod ref_count;
pub mod share_with;

pub use ref_count::RefCount;
pub use share_with::ShareWith;
