pub mod record;

pub use record::*;

pub use record::IngestError;
