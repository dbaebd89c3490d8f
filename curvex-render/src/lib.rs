pub mod draw;
pub mod scene;

pub use draw::{FrameStats, SkiaRenderer, render_text_pixmap};
pub use scene::{Scene, SceneState};
