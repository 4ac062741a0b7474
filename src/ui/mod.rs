//! Terminal user interface.

pub mod error;
pub mod recorder;

pub use error::ErrorScreen;
pub use recorder::{parse_color, RecorderScreen, RecorderView, UiAction};
