// Rendering-session backends: headless Chromium and plain HTTP + static DOM.

pub mod traits;
pub mod chromium;
pub mod http;

pub use chromium::ChromiumFactory;
pub use http::HttpFactory;
pub use traits::{RenderingSession, SessionFactory, WaitCondition};
