// Platform web surfaces
#[cfg(all(feature = "cocoa", target_os = "macos"))]
pub mod cocoa;
