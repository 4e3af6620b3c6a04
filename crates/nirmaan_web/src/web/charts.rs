use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

const PAD: f64 = 28.0;

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, String> {
    canvas
        .get_context("2d")
        .map_err(|_| "get_context failed")?
        .ok_or("no 2d context")?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| "cast failed".to_string())
}

/// Progress line over the labelled checkpoints, y fixed to 0..=100 %.
pub(super) fn draw_progress_chart(
    canvas: &HtmlCanvasElement,
    series: &[f64],
    labels: &[&str],
    line_color: &str,
    bg_color: &str,
    grid_color: &str,
) -> Result<(), String> {
    let ctx = context_2d(canvas)?;

    let w = canvas.width() as f64;
    let h = canvas.height() as f64;
    let plot_w = (w - 2.0 * PAD).max(1.0);
    let plot_h = (h - 2.0 * PAD).max(1.0);

    ctx.set_fill_style_str(bg_color);
    ctx.fill_rect(0.0, 0.0, w, h);

    ctx.set_stroke_style_str(grid_color);
    ctx.set_fill_style_str(grid_color);
    ctx.set_line_width(0.5);
    ctx.set_font("10px sans-serif");
    for i in 0..=4 {
        let y = PAD + plot_h * (i as f64) / 4.0;
        ctx.begin_path();
        ctx.move_to(PAD, y);
        ctx.line_to(PAD + plot_w, y);
        ctx.stroke();
        let _ = ctx.fill_text(&format!("{}", 100 - i * 25), 2.0, y + 3.0);
    }

    if series.is_empty() {
        return Ok(());
    }

    let step_x = if series.len() > 1 {
        plot_w / (series.len() - 1) as f64
    } else {
        0.0
    };
    let point = |i: usize, v: f64| {
        let norm = (v / 100.0).clamp(0.0, 1.0);
        (PAD + i as f64 * step_x, PAD + plot_h - norm * plot_h)
    };

    for (i, label) in labels.iter().take(series.len()).enumerate() {
        let (x, _) = point(i, 0.0);
        let _ = ctx.fill_text(label, x - 8.0, h - 8.0);
    }

    ctx.set_stroke_style_str(line_color);
    ctx.set_line_width(2.0);
    ctx.begin_path();
    for (i, &v) in series.iter().enumerate() {
        let (x, y) = point(i, v);
        if i == 0 {
            ctx.move_to(x, y);
        } else {
            ctx.line_to(x, y);
        }
    }
    ctx.stroke();

    ctx.set_fill_style_str(line_color);
    for (i, &v) in series.iter().enumerate() {
        let (x, y) = point(i, v);
        ctx.begin_path();
        let _ = ctx.arc(x, y, 3.0, 0.0, std::f64::consts::TAU);
        ctx.fill();
    }
    Ok(())
}
