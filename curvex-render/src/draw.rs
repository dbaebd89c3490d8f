use crate::scene::{ArrowCue, DashedCurve, PreviewCurve, RotatingCurve, SceneState};
use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use anyhow::{Result, anyhow};
use curvex_core::geometry::{Point3, START_ANGLE_DEG, tangent, trefoil_points};
use curvex_core::{RotationDirection, TrialSpec};
use curvex_timing::Timer;
use log::warn;
use std::collections::HashMap;
use std::time::Duration;
use tiny_skia::{
    Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    PremultipliedColorU8, Rect, Stroke, StrokeDash, Transform,
};

const BACKGROUND: [u8; 4] = [128, 128, 128, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];
const ARROW: [u8; 4] = [220, 40, 40, 255];
/// Camera tilt about the x axis so that `z` shows up on screen.
const TILT_DEG: f32 = 30.0;
const DASH_ON_PX: f32 = 14.0;
const DASH_OFF_PX: f32 = 10.0;
const TEXT_PX: f32 = 28.0;

pub struct FrameStats {
    pub clear: Duration,
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
}

/// Lays out and rasterises (possibly multi-line) text into a transparent pixmap.
pub fn render_text_pixmap<F: Font>(text: &str, font_size: f32, font: &F, color: Color) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);
    let line_height = sf.height() + sf.line_gap();

    let mut glyphs = Vec::<Glyph>::new();
    for (row, line) in text.lines().enumerate() {
        let baseline = sf.ascent() + row as f32 * line_height;
        let mut pen_x = 0.0f32;
        let mut prev = None;
        for ch in line.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = prev {
                pen_x += sf.kern(prev, id);
            }
            glyphs.push(Glyph {
                id,
                scale,
                position: point(pen_x, baseline),
            });
            pen_x += sf.h_advance(id);
            prev = Some(id);
        }
    }

    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    if outlines.is_empty() {
        return None;
    }

    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    let cu = color.to_color_u8();
    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            let a = (cov * cu.alpha() as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a * 255.0) as u8;
            let inv = 1.0 - a;
            let bg = dst[i];
            // premultiplied source-over
            let mix = |s: u8, d: u8| ((s as f32 * a) as u8).saturating_add((d as f32 * inv) as u8);
            if let Some(px) = PremultipliedColorU8::from_rgba(
                mix(cu.red(), bg.red()),
                mix(cu.green(), bg.green()),
                mix(cu.blue(), bg.blue()),
                sa.saturating_add((bg.alpha() as f32 * inv) as u8),
            ) {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

/// Software renderer for the stimulus scene.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    canvas: Pixmap,
    font: Option<FontVec>,
    text_cache: HashMap<String, Pixmap>,
    demo_curves: Vec<Vec<Point3>>,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, font: Option<FontVec>) -> Result<Self> {
        let canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("cannot allocate a {}x{} canvas", width, height))?;
        if font.is_none() {
            warn!("no font loaded; instruction text will only appear in the log");
        }
        Ok(Self {
            width,
            height,
            canvas,
            font,
            text_cache: HashMap::new(),
            demo_curves: demo_curves(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("cannot allocate a {}x{} canvas", width, height))?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    /// Pixels per curve unit.
    fn scale(&self) -> f32 {
        self.width.min(self.height) as f32 / 9.0
    }

    fn project(&self, p: Point3, center: (f32, f32)) -> (f32, f32) {
        let (s, c) = TILT_DEG.to_radians().sin_cos();
        let k = self.scale();
        (center.0 + p[0] * k, center.1 - (p[1] * c + p[2] * s) * k)
    }

    fn stroke_curve(&mut self, points: &[Point3], center: (f32, f32), width_px: f32, color: [u8; 4], dash: Option<StrokeDash>) {
        let mut pb = PathBuilder::new();
        let mut projected = points.iter().map(|p| self.project(*p, center));
        let Some((x0, y0)) = projected.next() else {
            return;
        };
        pb.move_to(x0, y0);
        for (x, y) in projected {
            pb.line_to(x, y);
        }
        let Some(path) = pb.finish() else {
            return;
        };

        let mut paint = Paint::default();
        paint.anti_alias = true;
        paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
        let stroke = Stroke {
            width: width_px.max(1.0),
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            dash,
            ..Stroke::default()
        };
        self.canvas
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    fn draw_reference(&mut self, curve: &RotatingCurve, center: (f32, f32)) {
        let width = curve.spec.width * self.scale();
        self.stroke_curve(&curve.placed_points(), center, width, BLACK, None);
    }

    fn draw_dashed(&mut self, dashed: &DashedCurve, center: (f32, f32)) {
        let width = dashed.curve.spec.width * self.scale();
        // A positive offset pulls the pattern back along the path.
        let dash = StrokeDash::new(vec![DASH_ON_PX, DASH_OFF_PX], -dashed.dash_offset);
        self.stroke_curve(&dashed.curve.placed_points(), center, width, BLACK, dash);
    }

    fn draw_arrow(&mut self, arrow: ArrowCue, dashed: &RotatingCurve, center: (f32, f32)) {
        let points = dashed.placed_points();
        let Some(&anchor) = points.get(arrow.anchor) else {
            return;
        };
        let t = tangent(&points, arrow.anchor);
        let sign = if arrow.forward { 1.0 } else { -1.0 };
        let tip3 = [anchor[0] + sign * t[0] * 0.4, anchor[1] + sign * t[1] * 0.4, anchor[2] + sign * t[2] * 0.4];

        let (ax, ay) = self.project(anchor, center);
        let (tx, ty) = self.project(tip3, center);
        let (dx, dy) = (tx - ax, ty - ay);
        let len = (dx * dx + dy * dy).sqrt();
        if len <= f32::EPSILON {
            return;
        }
        let (ux, uy) = (dx / len, dy / len);
        let half = len * 0.35;

        let mut pb = PathBuilder::new();
        pb.move_to(tx, ty);
        pb.line_to(ax - uy * half, ay + ux * half);
        pb.line_to(ax + uy * half, ay - ux * half);
        pb.close();
        let Some(path) = pb.finish() else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color_rgba8(ARROW[0], ARROW[1], ARROW[2], ARROW[3]);
        self.canvas
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    fn draw_preview(&mut self, preview: &PreviewCurve, center: (f32, f32)) {
        let width = 0.03 * self.scale();
        self.stroke_curve(&preview.points(), center, width, WHITE, None);
    }

    fn draw_demo(&mut self) {
        let (w, h) = (self.width as f32, self.height as f32);
        let curves = std::mem::take(&mut self.demo_curves);
        for (i, points) in curves.iter().enumerate() {
            let (center, color) = if i < 3 {
                ((w * (0.25 + 0.25 * i as f32), h * 0.72), WHITE)
            } else {
                ((w * 0.5, h * 0.4), BLACK)
            };
            self.stroke_curve(points, center, 2.0, color, None);
        }
        self.demo_curves = curves;
    }

    fn draw_text(&mut self, text: &str) {
        let Some(font) = self.font.as_ref() else {
            return;
        };
        if !self.text_cache.contains_key(text) {
            let Some(pm) = render_text_pixmap(text, TEXT_PX, font, Color::WHITE) else {
                return;
            };
            self.text_cache.insert(text.to_string(), pm);
        }
        let Some(pm) = self.text_cache.get(text) else {
            return;
        };

        let x = (self.width as f32 - pm.width() as f32) * 0.5;
        let y = self.height as f32 * 0.08;
        let mut backdrop = Paint::default();
        backdrop.set_color_rgba8(0, 0, 0, 160);
        if let Some(r) = Rect::from_xywh(x - 16.0, y - 12.0, pm.width() as f32 + 32.0, pm.height() as f32 + 24.0) {
            self.canvas.fill_rect(r, &backdrop, Transform::identity(), None);
        }
        self.canvas.draw_pixmap(
            x as i32,
            y as i32,
            pm.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    fn draw_scene(&mut self, scene: &SceneState) {
        let (w, h) = (self.width as f32, self.height as f32);
        let middle = (w * 0.5, h * 0.55);

        if scene.demo_visible {
            self.draw_demo();
        }
        if scene.reference.visible {
            self.draw_reference(&scene.reference, (w * 0.72, h * 0.55));
        }
        if scene.preview.visible {
            self.draw_preview(&scene.preview, (w * 0.28, h * 0.55));
        }
        if scene.dashed.curve.visible {
            self.draw_dashed(&scene.dashed, middle);
        }
        if scene.arrow.visible {
            self.draw_arrow(scene.arrow, &scene.dashed.curve, middle);
        }
        if let Some(text) = scene.text.as_deref() {
            self.draw_text(text);
        }
    }

    /// Draws `scene` and copies the result into an RGBA8 frame of the same size.
    pub fn render_frame<T: Timer<Timestamp = u64>>(
        &mut self,
        scene: &SceneState,
        frame: &mut [u8],
        timer: &mut T,
    ) -> Result<FrameStats> {
        if frame.len() != self.canvas.data().len() {
            return Err(anyhow!(
                "frame holds {} bytes, canvas {}x{} needs {}",
                frame.len(),
                self.width,
                self.height,
                self.canvas.data().len()
            ));
        }

        let clear = {
            let t = timer.now();
            self.canvas.fill(Color::from_rgba8(
                BACKGROUND[0],
                BACKGROUND[1],
                BACKGROUND[2],
                BACKGROUND[3],
            ));
            timer.elapsed(t)
        };
        let draw = {
            let t = timer.now();
            self.draw_scene(scene);
            timer.elapsed(t)
        };
        // The canvas is opaque, so premultiplied and straight RGBA agree.
        let copy = {
            let t = timer.now();
            frame.copy_from_slice(self.canvas.data());
            timer.elapsed(t)
        };

        let total = clear + draw + copy;
        timer.record_frame(total);
        Ok(FrameStats {
            clear,
            draw,
            copy,
            total,
        })
    }
}

/// Three white comparison curves and the black trefoil shown during the introduction.
fn demo_curves() -> Vec<Vec<Point3>> {
    let base = TrialSpec {
        segments: 180,
        rotation_direction: RotationDirection::CW,
        ..TrialSpec::default()
    };
    let mut curves: Vec<Vec<Point3>> = [0.6f32, 1.0, 1.4]
        .iter()
        .map(|r2| {
            trefoil_points(&TrialSpec {
                r1: 0.6,
                r2: *r2 * 0.6,
                ..base.clone()
            })
        })
        .collect();
    let mut trefoil = trefoil_points(&base);
    // turn so the first lobe points up
    for p in &mut trefoil {
        *p = curvex_core::geometry::rotate_z(*p, 90.0 - START_ANGLE_DEG);
    }
    curves.push(trefoil);
    curves
}
