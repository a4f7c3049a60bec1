//! Built-in text services.

pub mod sys;
pub mod webrtc;

pub use sys::PingService;
pub use webrtc::WebRtcService;
