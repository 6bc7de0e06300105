// Loader module: reading sales records into memory.

pub mod csv_loader;
pub mod traits;

pub use csv_loader::CsvLoader;
pub use traits::RecordSource;
