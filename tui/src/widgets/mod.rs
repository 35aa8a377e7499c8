//! Widgets
//!
//! - [`LogView`]: the scrollable work log
//! - [`BootView`]: the full-screen boot console

mod boot_view;
mod log_view;

pub use boot_view::BootView;
pub use log_view::{LogView, LogViewState};
