pub mod error;
pub mod package;
pub mod pipeline;
pub mod request;

pub use error::Error;
pub use pipeline::{convert, convert_merged, merge, ConversionOutput, MergeOutput};
pub use request::{ConversionOptions, ConversionRequest, Layout, Workspace};
