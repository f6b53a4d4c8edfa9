mod web_surface;

pub use web_surface::CocoaWebSurface;
