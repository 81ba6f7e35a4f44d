pub mod catalog;

pub use catalog::{Capture, CaptureCatalog, CaptureInfo};
