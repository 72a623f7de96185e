// Components module - reusable UI building blocks
//
// - Logs panel: tail of the system log buffer
// - Toast: short-lived notification overlay

pub mod logs_panel;
pub mod toast;

pub use toast::{Toast, ToastKind};
