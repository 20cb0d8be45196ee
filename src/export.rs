//! Widget script for the Scriptable iOS app, with the current settings baked in.
//!
//! The script carries its own (simplified) remaining-time calculation so it
//! can run on the phone without this program.

use chrono::NaiveDate;

use crate::stats::TargetAge;

/// Birth date embedded when none is configured yet.
pub const PLACEHOLDER_BIRTH: &str = "1990-01-01";

const BIRTH_MARKER: &str = "@BIRTH@";
const TARGET_AGE_MARKER: &str = "@TARGET_AGE@";

const TEMPLATE: &str = r##"// Life Timer - Scriptable widget
// Paste into the Scriptable app and add it as a widget.

const BIRTH = "@BIRTH@";
const TARGET_AGE = @TARGET_AGE@;

function calcRemaining(birth, targetAge) {
  const now = new Date();
  const target = new Date(birth);
  target.setFullYear(target.getFullYear() + targetAge);
  const totalMs = target - new Date(birth);
  const remainMs = Math.max(0, target - now);
  const ratio = Math.max(0, 1 - (now - new Date(birth)) / totalMs);
  const days = Math.floor(remainMs / 86400000);
  const months = Math.floor(remainMs / (30.44 * 86400000));
  const years = Math.floor(remainMs / (365.25 * 86400000));
  return { ratio, days, months, years };
}

const r = calcRemaining(BIRTH, TARGET_AGE);

// Scriptable has no arc paths, so the ring is drawn as short radial strokes.
function drawDonut(remaining, size) {
  const dc = new DrawContext();
  dc.size = new Size(size, size);
  dc.opaque = false;
  dc.respectScreenScale = true;

  const cx = size / 2;
  const cy = size / 2;
  const R = size * 0.38;
  const lw = size * 0.12;
  const STEPS = 120;
  const elapsed = 1 - remaining;

  for (let i = 0; i < STEPS; i++) {
    const t = i / STEPS;
    const ang0 = -Math.PI / 2 + t * 2 * Math.PI;
    const ang1 = -Math.PI / 2 + (i + 1) / STEPS * 2 * Math.PI;
    const mid = (ang0 + ang1) / 2;

    let col;
    if (t < elapsed) {
      const p = elapsed > 0 ? t / elapsed : 0;
      const gg = Math.round(107 + (165 - 107) * p);
      const bb = Math.round(107 * (1 - p));
      const hex = (n) => n.toString(16).padStart(2, "0");
      col = new Color("#" + hex(255) + hex(gg) + hex(bb));
    } else {
      col = new Color("#2a2a4a");
    }

    const path = new Path();
    path.move(new Point(cx + (R - lw / 2) * Math.cos(mid), cy + (R - lw / 2) * Math.sin(mid)));
    path.addLine(new Point(cx + (R + lw / 2) * Math.cos(mid), cy + (R + lw / 2) * Math.sin(mid)));
    dc.addPath(path);
    dc.setStrokeColor(col);
    dc.setLineWidth(size * 2 * Math.PI / STEPS + 1);
    dc.strokePath();
  }

  dc.setFont(Font.boldSystemFont(size * 0.17));
  dc.setTextColor(new Color("#ffffff"));
  dc.setTextAlignedCenter();
  dc.drawTextInRect((remaining * 100).toFixed(1) + "%", new Rect(0, cy - size * 0.14, size, size * 0.22));

  dc.setFont(Font.systemFont(size * 0.11));
  dc.setTextColor(new Color("#888888"));
  dc.drawTextInRect("left", new Rect(0, cy + size * 0.06, size, size * 0.18));

  return dc.getImage();
}

const w = new ListWidget();
const grad = new LinearGradient();
grad.colors = [new Color("#1a1a2e"), new Color("#0f0f1a")];
grad.locations = [0, 1];
grad.startPoint = new Point(0, 0);
grad.endPoint = new Point(1, 1);
w.backgroundGradient = grad;
w.setPadding(8, 8, 8, 8);

const imgStack = w.addStack();
imgStack.layoutHorizontally();
imgStack.addSpacer();
const wImg = imgStack.addImage(drawDonut(r.ratio, 160));
wImg.imageSize = new Size(90, 90);
imgStack.addSpacer();

w.addSpacer(4);

const yearStack = w.addStack();
yearStack.layoutHorizontally();
yearStack.addSpacer();
const yearTxt = yearStack.addText(r.years + " years");
yearTxt.textColor = new Color("#ffa500");
yearTxt.font = Font.boldSystemFont(14);
yearStack.addSpacer();

const dayStack = w.addStack();
dayStack.layoutHorizontally();
dayStack.addSpacer();
const dayTxt = dayStack.addText(r.days.toLocaleString() + " days");
dayTxt.textColor = new Color("#cccccc");
dayTxt.font = Font.systemFont(11);
dayStack.addSpacer();

Script.setWidget(w);
Script.complete();
"##;

/// Renders the widget script for the given settings.
pub fn scriptable_widget(birth: Option<NaiveDate>, target_age: TargetAge) -> String {
    let birth = birth
        .map(|b| b.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| PLACEHOLDER_BIRTH.to_string());

    TEMPLATE
        .replace(BIRTH_MARKER, &birth)
        .replace(TARGET_AGE_MARKER, &target_age.to_string())
}
