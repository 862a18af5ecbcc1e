pub mod error;
pub mod table;
pub mod workbook;

pub use error::Error;
pub use table::Table;
pub use workbook::Workbook;
