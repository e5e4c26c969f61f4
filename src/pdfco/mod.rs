pub mod client;
pub mod error;
pub mod operation;
pub mod types;

pub use client::PdfCoClient;
pub use error::PdfCoError;
pub use operation::{Operation, OperationParams};
pub use types::{RemoteStatus, UploadedFile};
