use crate::{
    canvas::Canvas,
    color_map::ColorMap,
    concurrency::par_iter_mut1,
    error::{SolverError, SolverResult},
    field::{channel0_range, CHANNELS},
    floating_type_mod::{FT, PI, TAU},
    simulation::FluidSimulation,
    vec3f, VisualizationParams, VisualizedAttribute,
};

pub fn color_map_inferno(min: FT, max: FT) -> ColorMap {
    ColorMap::new(vec![
        (
            min + (max - min) * 0.0,
            vec3f(0.0014619955811715805, 0.0004659913919114934, 0.013866005775115809),
        ),
        (
            min + (max - min) * 0.06666666666666667,
            vec3f(0.04691458399133113, 0.030323540520811973, 0.15016326468244964),
        ),
        (
            min + (max - min) * 0.13333333333333333,
            vec3f(0.14237847430795506, 0.04624117675574093, 0.30855378680836465),
        ),
        (
            min + (max - min) * 0.2,
            vec3f(0.2582339375612672, 0.038569281262784215, 0.4064850812186898),
        ),
        (
            min + (max - min) * 0.26666666666666666,
            vec3f(0.366528457743285, 0.07157684449494817, 0.4319940445656597),
        ),
        (
            min + (max - min) * 0.3333333333333333,
            vec3f(0.47232856222023284, 0.11054509253877559, 0.428334014815688),
        ),
        (
            min + (max - min) * 0.4,
            vec3f(0.5783040710826255, 0.1480366969821801, 0.4044110859921461),
        ),
        (
            min + (max - min) * 0.4666666666666667,
            vec3f(0.6826555952415246, 0.1894982847225483, 0.3607573457624624),
        ),
        (
            min + (max - min) * 0.5333333333333333,
            vec3f(0.780517595641067, 0.24332476411029125, 0.29952273568573573),
        ),
        (
            min + (max - min) * 0.6,
            vec3f(0.865006157141607, 0.316819514079576, 0.2260550749407627),
        ),
        (
            min + (max - min) * 0.6666666666666666,
            vec3f(0.9296439014941755, 0.41147612778815296, 0.14536750158970949),
        ),
        (
            min + (max - min) * 0.7333333333333333,
            vec3f(0.970919318954511, 0.5228513513717987, 0.05836666742473027),
        ),
        (
            min + (max - min) * 0.8,
            vec3f(0.987622172670732, 0.6453178289458518, 0.039886017500422775),
        ),
        (
            min + (max - min) * 0.8666666666666667,
            vec3f(0.9788062634501479, 0.7745421938654863, 0.1760361942373471),
        ),
        (
            min + (max - min) * 0.9333333333333333,
            vec3f(0.950018012245954, 0.9034074125145412, 0.3802723264284489),
        ),
        (
            min + (max - min) * 1.0,
            vec3f(0.9883620799212208, 0.9983616470620554, 0.6449240982803861),
        ),
    ])
}

/// Six-sector HSV to RGB conversion, each input in [0, 1]. Channels are
/// floored to 0..=255, values above 1 saturate.
pub fn hsv_to_rgb(h: FT, s: FT, v: FT) -> [u8; 3] {
    let i = (h * 6.).floor();
    let f = h * 6. - i;
    let p = v * (1. - s);
    let q = v * (1. - f * s);
    let t = v * (1. - (1. - f) * s);

    let (r, g, b) = match (i as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    [(r * 255.) as u8, (g * 255.) as u8, (b * 255.) as u8]
}

fn check_canvas(field: &[FT], canvas: &Canvas) -> SolverResult<()> {
    let expected = canvas.width() * canvas.height() * CHANNELS;
    if field.len() != expected {
        return Err(SolverError::BufferSizeMismatch {
            buffer: "field",
            expected,
            actual: field.len(),
        });
    }
    Ok(())
}

fn write_rgb(pixel: &mut [u8; 4], rgb: [u8; 3]) {
    pixel[..3].copy_from_slice(&rgb);
}

/// Grayscale of the per-cell magnitude, `1.0` maps to white.
pub fn density_field_to_color(field: &[FT], canvas: &mut Canvas) -> SolverResult<()> {
    check_canvas(field, canvas)?;
    par_iter_mut1(canvas.pixels_mut(), |i, pixel| {
        let (a, b) = (field[i * CHANNELS], field[i * CHANNELS + 1]);
        let gray = ((a * a + b * b).sqrt() * 255.).round().clamp(0., 255.) as u8;
        write_rgb(pixel, [gray, gray, gray]);
    });
    Ok(())
}

/// Direction as hue, magnitude as value.
pub fn velocity_field_to_color(field: &[FT], canvas: &mut Canvas) -> SolverResult<()> {
    check_canvas(field, canvas)?;
    par_iter_mut1(canvas.pixels_mut(), |i, pixel| {
        let (u, v) = (field[i * CHANNELS], field[i * CHANNELS + 1]);
        let angle = v.atan2(u);
        let length = (u * u + v * v).sqrt();
        write_rgb(pixel, hsv_to_rgb((angle + PI) / TAU, 1., length));
    });
    Ok(())
}

/// Channel 0 through the inferno map, stretched over the field's range.
pub fn pressure_field_to_color(field: &[FT], canvas: &mut Canvas) -> SolverResult<()> {
    check_canvas(field, canvas)?;
    let (min, max) = channel0_range(field);
    let color_map = color_map_inferno(min, max);
    par_iter_mut1(canvas.pixels_mut(), |i, pixel| {
        let rgb = color_map.get_u8(field[i * CHANNELS]);
        write_rgb(pixel, [rgb.x, rgb.y, rgb.z]);
    });
    Ok(())
}

/// Renders one frame of `fluid_simulation` into `canvas`, which must have one
/// pixel per grid cell.
pub fn render_simulation(
    fluid_simulation: &FluidSimulation,
    visualization_params: VisualizationParams,
    canvas: &mut Canvas,
) -> SolverResult<()> {
    canvas.clear(visualization_params.background);

    match visualization_params.visualized_attribute {
        VisualizedAttribute::Density => density_field_to_color(fluid_simulation.density()?.as_slice(), canvas)?,
        VisualizedAttribute::Velocity => velocity_field_to_color(fluid_simulation.velocity()?.as_slice(), canvas)?,
        VisualizedAttribute::Pressure => pressure_field_to_color(fluid_simulation.pressure(), canvas)?,
    }

    if visualization_params.draw_emitters {
        for emitter in fluid_simulation
            .emitters()
            .iter()
            .filter(|e| e.is_active(fluid_simulation.time))
        {
            // no outline beyond the canvas diagonal is ever visible
            let max_radius = (canvas.width() + canvas.height()) as FT;
            canvas.draw_circle(
                emitter.pos.x.round() as i64,
                emitter.pos.y.round() as i64,
                emitter.radius.min(max_radius).ceil() as i64,
                [255, 255, 255],
                1.,
            );
        }
    }

    Ok(())
}
