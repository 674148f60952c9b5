mod aggregate;
mod discovery;
mod format;
mod image;
mod selection;
mod status;

pub use aggregate::Aggregator;
pub use discovery::discover;
pub use discovery::natural_cmp;
pub use discovery::pretty_key;
pub use discovery::PrinterDescriptor;
pub use discovery::FIELD_SUFFIXES;
pub use format::format_duration;
pub use format::format_hms;
pub use format::format_num;
pub use format::or_zero;
pub use format::MISSING;
pub use image::PrinterImage;
pub use selection::reduce;
pub use selection::Selection;
pub use selection::Transition;
pub use status::FieldValue;
pub use status::StatusSnapshot;
