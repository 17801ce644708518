pub mod file;
pub mod partner;

pub use file::FileService;
pub use partner::PartnerService;
