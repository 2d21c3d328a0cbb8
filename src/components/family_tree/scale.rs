//! Maps the visible CSS size of the canvas to its backing store.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceScale {
	pub css_width: f64,
	pub css_height: f64,
	pub pixel_ratio: f64,
}

impl Default for SurfaceScale {
	fn default() -> Self {
		Self::new(800.0, 600.0, 1.0)
	}
}

impl SurfaceScale {
	pub fn new(css_width: f64, css_height: f64, pixel_ratio: f64) -> Self {
		let sane = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
		Self {
			css_width: sane(css_width, 1.0).max(1.0),
			css_height: sane(css_height, 1.0).max(1.0),
			pixel_ratio: sane(pixel_ratio, 1.0),
		}
	}

	/// Device pixels backing the canvas.
	pub fn backing_size(&self) -> (u32, u32) {
		(
			(self.css_width * self.pixel_ratio).round().max(1.0) as u32,
			(self.css_height * self.pixel_ratio).round().max(1.0) as u32,
		)
	}

	/// Per-axis factor from CSS pixels to backing pixels, accounting for rounding.
	pub fn device_scale(&self) -> (f64, f64) {
		let (w, h) = self.backing_size();
		(w as f64 / self.css_width, h as f64 / self.css_height)
	}
}
