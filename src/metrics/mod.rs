pub mod success_window;

pub use success_window::SuccessWindow;
