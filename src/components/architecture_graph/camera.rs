use super::types::{Point, Rect};

pub const MIN_SCALE: f64 = 0.3;
pub const MAX_SCALE: f64 = 3.0;
pub const DEFAULT_SCALE: f64 = 0.75;
const WHEEL_SENSITIVITY: f64 = 0.001;
const TOP_INSET: f64 = 50.0;

/// Pan + uniform scale view transform: `screen = world * scale + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
	pub offset_x: f64,
	pub offset_y: f64,
	pub scale: f64,
}

impl Default for Camera {
	fn default() -> Self {
		Self {
			offset_x: 0.0,
			offset_y: 0.0,
			scale: DEFAULT_SCALE,
		}
	}
}

impl Camera {
	/// World x = 0 centered horizontally, first band just below the top edge.
	pub fn centered(viewport_width: f64) -> Self {
		Self {
			offset_x: viewport_width / 2.0,
			offset_y: TOP_INSET,
			scale: DEFAULT_SCALE,
		}
	}

	pub fn to_screen(&self, world: Point) -> Point {
		Point::new(
			world.x * self.scale + self.offset_x,
			world.y * self.scale + self.offset_y,
		)
	}

	pub fn to_world(&self, screen: Point) -> Point {
		Point::new(
			(screen.x - self.offset_x) / self.scale,
			(screen.y - self.offset_y) / self.scale,
		)
	}

	pub fn pan(&mut self, dx: f64, dy: f64) {
		self.offset_x += dx;
		self.offset_y += dy;
	}

	/// Sets a new scale while keeping the world point under `anchor` fixed on screen.
	pub fn zoom_at(&mut self, anchor: Point, scale: f64) {
		let world = self.to_world(anchor);
		self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
		self.offset_x = anchor.x - world.x * self.scale;
		self.offset_y = anchor.y - world.y * self.scale;
	}

	/// Wheel zoom: scrolling up (negative delta) zooms in.
	pub fn wheel(&mut self, anchor: Point, delta_y: f64) {
		self.zoom_at(anchor, self.scale - delta_y * WHEEL_SENSITIVITY);
	}

	/// World-space rectangle currently covered by a viewport of the given size.
	pub fn visible_world(&self, width: f64, height: f64) -> Rect {
		let origin = self.to_world(Point::new(0.0, 0.0));
		Rect::new(origin.x, origin.y, width / self.scale, height / self.scale)
	}
}
