//! Element queries shared by modal reveal, snippet resolution, the
//! fallback cascade and the pattern detector.

pub mod chrome;
pub mod locator;
pub mod probe;
pub mod static_dom;

pub use chrome::ChromeDom;
pub use locator::{CLICKABLE_SELECTOR, Locator, normalize_text};
pub use probe::DomProbe;
pub use static_dom::StaticDom;
