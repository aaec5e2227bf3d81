//! Visual configuration for field rendering.
//!
//! Controls how particles look — color scheme, glow, background fade —
//! separate from the behavioral settings that control how they move.
//!
//! # Usage
//!
//! ```ignore
//! Simulation::new()
//!     .with_visuals(|v| {
//!         v.color_scheme(ColorScheme::Purple);
//!         v.high_quality_effects(false);
//!     })
//!     .run()?;
//! ```

use crate::particle::Particle;

/// Pre-defined color schemes.
///
/// A scheme fixes the hue band particles are born into and the background
/// the fade pass paints over previous frames. The default band runs blue to
/// teal (hue 180–240).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    /// Deep blue background, blue-to-teal particles (default).
    #[default]
    Ocean,

    /// Dark violet background, purple-to-magenta particles.
    Purple,

    /// Dark cyan background, green-to-teal particles.
    Teal,

    /// Warm brown background, gold-to-orange particles.
    Amber,
}

impl ColorScheme {
    /// Base hue and span in degrees; a particle's hue is
    /// `base + data_value/100 × span`.
    pub fn hue_band(&self) -> (f32, f32) {
        match self {
            ColorScheme::Ocean => (180.0, 60.0),
            ColorScheme::Purple => (260.0, 50.0),
            ColorScheme::Teal => (150.0, 40.0),
            ColorScheme::Amber => (30.0, 25.0),
        }
    }

    /// Background color painted by the fade pass (linear RGB, 0.0-1.0).
    pub fn background(&self) -> [f32; 3] {
        match self {
            ColorScheme::Ocean => rgb8(15, 23, 42),
            ColorScheme::Purple => rgb8(36, 0, 70),
            ColorScheme::Teal => rgb8(0, 35, 43),
            ColorScheme::Amber => rgb8(43, 28, 16),
        }
    }

    /// The scheme after this one, for cycling with a keyboard control.
    pub fn next(self) -> ColorScheme {
        match self {
            ColorScheme::Ocean => ColorScheme::Purple,
            ColorScheme::Purple => ColorScheme::Teal,
            ColorScheme::Teal => ColorScheme::Amber,
            ColorScheme::Amber => ColorScheme::Ocean,
        }
    }
}

fn rgb8(r: u8, g: u8, b: u8) -> [f32; 3] {
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
}

/// Convert HSL to RGB.
///
/// * `h` - hue in degrees (wraps)
/// * `s` - saturation percentage, 0-100
/// * `l` - lightness percentage, 0-100
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let h = h.rem_euclid(360.0);
    let s = (s / 100.0).clamp(0.0, 1.0);
    let l = (l / 100.0).clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match (h / 60.0) as u32 % 6 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [r + m, g + m, b + m]
}

/// Resolved style for one connection line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    /// Premixed RGBA; alpha already carries the distance falloff.
    pub color: [f32; 4],
    /// Stroke width in pixels (0.3-0.6, data-value weighted).
    pub width: f32,
}

/// Style for the line between two in-range particles.
///
/// Opacity fades linearly with distance; width grows with the pair's
/// combined data values. Hue is the mean of both particles' hues at a
/// fixed saturation/lightness so lines read as a neutral blend.
pub fn line_style(a: &Particle, b: &Particle, distance: f32, threshold: f32) -> LineStyle {
    let opacity = 0.15 * (1.0 - distance / threshold);
    let hue = (a.hue + b.hue) / 2.0;
    let [r, g, bl] = hsl_to_rgb(hue, 70.0, 60.0);
    LineStyle {
        color: [r, g, bl, opacity.max(0.0)],
        width: 0.3 + ((a.data_value + b.data_value) / 200.0) * 0.3,
    }
}

/// Rendering options for a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualConfig {
    /// Color scheme for particles and background.
    pub color_scheme: ColorScheme,
    /// Whether glow halos are drawn at all.
    pub high_quality_effects: bool,
    /// Data value above which a particle gets a glow halo.
    pub glow_threshold: f32,
    /// Fade-pass alpha; higher values shorten the motion-blur tail.
    pub fade_alpha: f32,
    /// Fade-pass alpha used in performance mode.
    pub fade_alpha_performance: f32,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            color_scheme: ColorScheme::Ocean,
            high_quality_effects: true,
            glow_threshold: 75.0,
            fade_alpha: 0.08,
            fade_alpha_performance: 0.15,
        }
    }
}

impl VisualConfig {
    /// Create a visual config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the color scheme.
    pub fn color_scheme(&mut self, scheme: ColorScheme) -> &mut Self {
        self.color_scheme = scheme;
        self
    }

    /// Toggle glow halos.
    pub fn high_quality_effects(&mut self, enabled: bool) -> &mut Self {
        self.high_quality_effects = enabled;
        self
    }

    /// Set the data value above which particles glow.
    pub fn glow_threshold(&mut self, threshold: f32) -> &mut Self {
        self.glow_threshold = threshold;
        self
    }

    /// Set the fade-pass alpha (0.0-1.0). Lower values leave longer trails.
    pub fn fade_alpha(&mut self, alpha: f32) -> &mut Self {
        self.fade_alpha = alpha.clamp(0.0, 1.0);
        self
    }

    /// Fade alpha for the active performance mode.
    pub fn effective_fade_alpha(&self, performance_mode: bool) -> f32 {
        if performance_mode {
            self.fade_alpha_performance
        } else {
            self.fade_alpha
        }
    }

    /// Whether the given particle gets a glow halo this frame.
    pub fn glows(&self, particle: &Particle, performance_mode: bool) -> bool {
        !performance_mode
            && self.high_quality_effects
            && (particle.data_value > self.glow_threshold || particle.is_exploding())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::SpawnContext;

    fn particle(data_value: f32) -> Particle {
        let mut ctx = SpawnContext::new(0, 1, 800.0, 600.0, 1);
        let mut p = Particle::spawn(&mut ctx, ColorScheme::Ocean);
        p.data_value = data_value;
        p
    }

    #[test]
    fn test_hsl_primary_colors() {
        let red = hsl_to_rgb(0.0, 100.0, 50.0);
        assert!((red[0] - 1.0).abs() < 0.001 && red[1] < 0.001 && red[2] < 0.001);

        let green = hsl_to_rgb(120.0, 100.0, 50.0);
        assert!(green[0] < 0.001 && (green[1] - 1.0).abs() < 0.001);

        let blue = hsl_to_rgb(240.0, 100.0, 50.0);
        assert!(blue[2] > 0.999 && blue[0] < 0.001);
    }

    #[test]
    fn test_hsl_lightness_extremes() {
        assert_eq!(hsl_to_rgb(200.0, 80.0, 0.0), [0.0, 0.0, 0.0]);
        let white = hsl_to_rgb(200.0, 80.0, 100.0);
        for channel in white {
            assert!((channel - 1.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_hsl_hue_wraps() {
        assert_eq!(hsl_to_rgb(400.0, 70.0, 60.0), hsl_to_rgb(40.0, 70.0, 60.0));
    }

    #[test]
    fn test_line_style_distance_falloff() {
        let a = particle(50.0);
        let b = particle(50.0);
        let near = line_style(&a, &b, 0.0, 120.0);
        let far = line_style(&a, &b, 120.0, 120.0);
        assert!((near.color[3] - 0.15).abs() < 0.001);
        assert!(far.color[3] < 0.001);
    }

    #[test]
    fn test_line_width_tracks_data_values() {
        let low = line_style(&particle(0.0), &particle(0.0), 10.0, 120.0);
        let high = line_style(&particle(100.0), &particle(100.0), 10.0, 120.0);
        assert!((low.width - 0.3).abs() < 0.001);
        assert!((high.width - 0.6).abs() < 0.001);
    }

    #[test]
    fn test_glow_gating() {
        let visuals = VisualConfig::default();
        let dim = particle(40.0);
        let bright = particle(90.0);

        assert!(!visuals.glows(&dim, false));
        assert!(visuals.glows(&bright, false));
        // Performance mode suppresses glow regardless of data value.
        assert!(!visuals.glows(&bright, true));

        let mut exploding = particle(40.0);
        exploding.explode(1.0, 7.0);
        assert!(visuals.glows(&exploding, false));
    }

    #[test]
    fn test_scheme_cycle_returns() {
        let mut scheme = ColorScheme::Ocean;
        for _ in 0..4 {
            scheme = scheme.next();
        }
        assert_eq!(scheme, ColorScheme::Ocean);
    }
}
