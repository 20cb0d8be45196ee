use crate::display::Frame;
use crate::orchestrator::{CIRCUMFERENCE, RING_RADIUS};

const SIZE: f64 = 240.0;
const STROKE_WIDTH: f64 = 14.0;
const CAPTION_HEIGHT: f64 = 50.0;

#[derive(Clone, Copy)]
pub enum Theme {
    Dark,
    Light,
}

pub struct ThemeColors {
    pub bg: &'static str,
    pub text: &'static str,
    pub track: &'static str,
    pub ring: &'static str,
    pub muted: &'static str,
}

impl Theme {
    pub fn colors(self) -> ThemeColors {
        match self {
            Theme::Dark => ThemeColors {
                bg: "#1a1a2e",
                text: "#ffffff",
                track: "#2a2a4a",
                ring: "#ffa500",
                muted: "#888888",
            },
            Theme::Light => ThemeColors {
                bg: "#ffffff",
                text: "#24292f",
                track: "#e1e4e8",
                ring: "#d73a49",
                muted: "#6a737d",
            },
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Theme::Dark => "dark_mode.svg",
            Theme::Light => "light_mode.svg",
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Circular progress indicator for one frame.
///
/// The ring starts at twelve o'clock; `stroke-dashoffset` hides the elapsed
/// share, so what remains visible is the time left.
pub fn generate_svg(frame: &Frame, theme: Theme) -> String {
    let colors = theme.colors();
    let c = SIZE / 2.0;
    let h = SIZE + CAPTION_HEIGHT;

    format!(
        r#"<?xml version='1.0' encoding='UTF-8'?>
<svg xmlns="http://www.w3.org/2000/svg"
     width="{w}px" height="{h}px" viewBox="0 0 {w} {h}"
     font-family="-apple-system,Segoe UI,Helvetica,Arial,sans-serif">

<rect width="{w}" height="{h}" fill="{bg}" rx="15"/>

<circle cx="{c}" cy="{c}" r="{r}" fill="none"
        stroke="{track}" stroke-width="{sw}"/>
<circle cx="{c}" cy="{c}" r="{r}" fill="none"
        stroke="{ring}" stroke-width="{sw}" stroke-linecap="round"
        stroke-dasharray="{circ:.3}" stroke-dashoffset="{offset:.3}"
        transform="rotate(-90 {c} {c})"/>

<text x="{c}" y="{c}" fill="{text}" font-size="28" font-weight="bold"
      text-anchor="middle">{percent}</text>
<text x="{c}" y="{sub_y}" fill="{muted}" font-size="14"
      text-anchor="middle">remaining</text>

<text x="{c}" y="{caption_y}" fill="{text}" font-size="16"
      text-anchor="middle">{age}</text>

</svg>
"#,
        w = SIZE,
        h = h,
        c = c,
        r = RING_RADIUS,
        sw = STROKE_WIDTH,
        circ = CIRCUMFERENCE,
        offset = frame.stroke_offset,
        bg = colors.bg,
        text = colors.text,
        track = colors.track,
        ring = colors.ring,
        muted = colors.muted,
        percent = escape_xml(&frame.remaining_percent),
        sub_y = c + 24.0,
        caption_y = SIZE + CAPTION_HEIGHT / 2.0,
        age = escape_xml(&frame.age),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(offset: f64) -> Frame {
        Frame {
            age: "34y 0m 0d".into(),
            target_date: "June 15, 2070".into(),
            remaining_percent: "57.5000%".into(),
            remaining_years: "46".into(),
            countdown: Default::default(),
            totals: Default::default(),
            stroke_offset: offset,
        }
    }

    #[test]
    fn ring_uses_the_frame_offset() {
        let svg = generate_svg(&frame(343.23), Theme::Dark);
        assert!(svg.contains(r#"stroke-dasharray="596.903""#));
        assert!(svg.contains(r#"stroke-dashoffset="343.230""#));
        assert!(svg.contains(r##"stroke="#ffa500""##));
        assert!(svg.contains(">57.5000%</text>"));
        assert!(svg.contains(">34y 0m 0d</text>"));
    }

    #[test]
    fn themes_differ() {
        let dark = generate_svg(&frame(0.0), Theme::Dark);
        let light = generate_svg(&frame(0.0), Theme::Light);
        assert_ne!(dark, light);
        assert!(light.contains(r##"fill="#ffffff" rx="15""##));
    }

    #[test]
    fn text_is_escaped() {
        let mut f = frame(0.0);
        f.age = "<b>&".into();
        assert!(generate_svg(&f, Theme::Light).contains("&lt;b&gt;&amp;"));
    }
}
