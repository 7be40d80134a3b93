//! Projection of the whole layout into the fixed overview box.

use super::camera::Camera;
use super::layout::Layout;
use super::types::{Point, Rect};

pub const MINIMAP_WIDTH: f64 = 200.0;
pub const MINIMAP_HEIGHT: f64 = 140.0;
const MINIMAP_MARGIN: f64 = 24.0;
/// Extra world space kept around the layout extent: left/right, top, bottom.
const PAD_X: f64 = 400.0;
const PAD_TOP: f64 = 200.0;
const PAD_BOTTOM: f64 = 300.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Minimap {
	/// Screen-space box in the bottom-right corner.
	pub frame: Rect,
	world: Rect,
	scale: f64,
	origin: Point,
}

impl Minimap {
	/// `None` when no node currently has a position.
	pub fn new(layout: &Layout, canvas_width: f64, canvas_height: f64) -> Option<Self> {
		let extent = layout.extent()?;
		let world = Rect::new(
			extent.x - PAD_X,
			extent.y - PAD_TOP,
			extent.w + 2.0 * PAD_X,
			extent.h + PAD_TOP + PAD_BOTTOM,
		);
		let frame = Rect::new(
			canvas_width - MINIMAP_WIDTH - MINIMAP_MARGIN,
			canvas_height - MINIMAP_HEIGHT - MINIMAP_MARGIN,
			MINIMAP_WIDTH,
			MINIMAP_HEIGHT,
		);
		let scale = (MINIMAP_WIDTH / world.w).min(MINIMAP_HEIGHT / world.h);
		let origin = Point::new(
			frame.x + (MINIMAP_WIDTH - world.w * scale) / 2.0,
			frame.y + (MINIMAP_HEIGHT - world.h * scale) / 2.0,
		);
		Some(Self {
			frame,
			world,
			scale,
			origin,
		})
	}

	pub fn project(&self, world: Point) -> Point {
		Point::new(
			self.origin.x + (world.x - self.world.x) * self.scale,
			self.origin.y + (world.y - self.world.y) * self.scale,
		)
	}

	/// The camera's visible region in minimap coordinates. Not clipped.
	pub fn viewport(&self, camera: &Camera, canvas_width: f64, canvas_height: f64) -> Rect {
		let visible = camera.visible_world(canvas_width, canvas_height);
		let corner = self.project(Point::new(visible.x, visible.y));
		Rect::new(
			corner.x,
			corner.y,
			visible.w * self.scale,
			visible.h * self.scale,
		)
	}
}
