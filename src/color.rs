use eframe::egui::{Color32, Stroke};
use palette::{Hsl, IntoColor, Lighten, Srgb};

// ---------------------------------------------------------------------------
// Map layer styles
// ---------------------------------------------------------------------------

/// Fill and outline of a polygon layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStyle {
    pub fill: Color32,
    pub outline: Color32,
    pub outline_width: f32,
}

impl LayerStyle {
    /// All counties: translucent blue, white outline.
    pub fn base() -> Self {
        LayerStyle {
            fill: Color32::from_rgba_unmultiplied(0, 0, 255, 100),
            outline: Color32::WHITE,
            outline_width: 1.0,
        }
    }

    /// Selected county: translucent red, black outline.
    pub fn selected() -> Self {
        LayerStyle {
            fill: Color32::from_rgba_unmultiplied(255, 0, 0, 100),
            outline: Color32::BLACK,
            outline_width: 2.5,
        }
    }

    pub fn stroke(&self) -> Stroke {
        Stroke::new(self.outline_width, self.outline)
    }

    /// Same style with a lighter fill, for the polygon under the pointer.
    pub fn hovered(&self) -> LayerStyle {
        LayerStyle {
            fill: lighten(self.fill, 0.35),
            ..*self
        }
    }
}

/// Lighten a colour in HSL space, keeping its alpha.
pub fn lighten(color: Color32, amount: f32) -> Color32 {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    let rgb = Srgb::new(r, g, b).into_format::<f32>();
    let hsl: Hsl = rgb.into_color();
    let out: Srgb = hsl.lighten(amount).into_color();
    let out = out.into_format::<u8>();
    Color32::from_rgba_unmultiplied(out.red, out.green, out.blue, a)
}

/// Tooltip background (steel blue).
pub const TOOLTIP_BG: Color32 = Color32::from_rgb(70, 130, 180);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lighten_raises_lightness_and_keeps_alpha() {
        let base = LayerStyle::base().fill;
        let light = LayerStyle::base().hovered().fill;
        let [r0, g0, _, a0] = base.to_srgba_unmultiplied();
        let [r1, g1, _, a1] = light.to_srgba_unmultiplied();
        assert_eq!(a0, a1);
        assert!(r1 > r0 && g1 > g0);
        assert_eq!(LayerStyle::base().hovered().outline, LayerStyle::base().outline);
    }
}
